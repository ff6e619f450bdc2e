//! 作文分析结果
//!
//! 一次成功的分析调用产生一个 `EssayAnalysis`，之后只读

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rubric::RubricDimension;

/// 从反馈文本中提取的错误类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCategory {
    /// 类别标签（用作去重键）
    pub label: String,
    /// 错误描述
    pub description: String,
}

impl ErrorCategory {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }

    /// 去重键：去掉首尾空白并转小写
    pub fn dedup_key(&self) -> String {
        self.label.trim().to_lowercase()
    }
}

/// 单个维度的得分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: RubricDimension,
    /// 归一化后的分数，总是 40 的倍数且不超过 200
    pub score: u32,
    pub feedback: String,
    /// 反馈中出现的 `标签: 描述` 对
    #[serde(default)]
    pub errors: Vec<ErrorCategory>,
}

/// 作文分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayAnalysis {
    pub scores: BTreeMap<RubricDimension, DimensionScore>,
    pub total: u32,
    pub general_comment: String,
    pub weak_dimensions: Vec<RubricDimension>,
    pub follow_up_prompt: String,
    pub essay_text: String,
}

impl EssayAnalysis {
    /// 获取某个维度的得分（解析缺失时返回 None）
    pub fn score_of(&self, dimension: RubricDimension) -> Option<&DimensionScore> {
        self.scores.get(&dimension)
    }

    /// 缺失的维度
    pub fn missing_dimensions(&self) -> Vec<RubricDimension> {
        RubricDimension::ALL
            .into_iter()
            .filter(|dimension| !self.scores.contains_key(dimension))
            .collect()
    }

    /// 得分最高的维度，同分按评分表顺序取靠前者
    pub fn strongest(&self) -> Option<RubricDimension> {
        self.scores
            .values()
            .fold(None::<&DimensionScore>, |best, current| match best {
                Some(best) if best.score >= current.score => Some(best),
                _ => Some(current),
            })
            .map(|score| score.dimension)
    }

    /// 得分最低的维度，同分按评分表顺序取靠前者
    pub fn weakest(&self) -> Option<RubricDimension> {
        self.scores
            .values()
            .fold(None::<&DimensionScore>, |worst, current| match worst {
                Some(worst) if worst.score <= current.score => Some(worst),
                _ => Some(current),
            })
            .map(|score| score.dimension)
    }

    /// 需要进入补救流程的维度
    ///
    /// 优先使用分析中列出的薄弱维度；没有列出时，
    /// 取所有低于满分的已解析维度，按分数升序
    pub fn remediation_plan(&self) -> Vec<RubricDimension> {
        if !self.weak_dimensions.is_empty() {
            return self.weak_dimensions.clone();
        }

        let mut below_max: Vec<&DimensionScore> = self
            .scores
            .values()
            .filter(|score| score.score < super::rubric::DIMENSION_MAX_SCORE)
            .collect();
        below_max.sort_by_key(|score| score.score);
        below_max.into_iter().map(|score| score.dimension).collect()
    }
}
