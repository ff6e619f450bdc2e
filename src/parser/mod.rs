//! 解析层
//!
//! 把 LLM 的自然语言回复转换成结构化数据。
//! 任何一段解析失败都只产生缺省值，不会中止整体解析
//!
//! - `rubric` - 评分回复（模板 v1）
//! - `remediation` - 补救流程中的分类、练习、评价回复

pub mod remediation;
pub mod rubric;

pub use remediation::{
    dedup_categories, extract_categories, parse_evaluation, parse_exercise, ParsedExercise,
};
pub use rubric::{extract_error_pairs, normalize_score, TemplateV1Parser};

use crate::models::{EssayAnalysis, RubricDimension};

/// 解析覆盖率：模板中哪些部分被成功识别
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseCoverage {
    pub dimensions_found: usize,
    pub total_found: bool,
    pub general_comment_found: bool,
    pub weak_dimensions_found: bool,
    pub follow_up_found: bool,
}

impl ParseCoverage {
    /// 已识别部分占全部部分的比例（0.0 - 1.0）
    pub fn ratio(&self) -> f32 {
        let sections = RubricDimension::ALL.len() + 4;
        let found = self.dimensions_found
            + [
                self.total_found,
                self.general_comment_found,
                self.weak_dimensions_found,
                self.follow_up_found,
            ]
            .iter()
            .filter(|found| **found)
            .count();
        found as f32 / sections as f32
    }

    pub fn is_complete(&self) -> bool {
        self.dimensions_found == RubricDimension::ALL.len()
    }
}

/// 一次解析的结果：尽力而为的分析 + 覆盖率
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub analysis: EssayAnalysis,
    pub coverage: ParseCoverage,
}

/// 评分回复解析器
///
/// 每个模板版本一个实现，模板变化时只需新增实现
pub trait RubricParser: Send + Sync {
    /// 模板版本标识
    fn version(&self) -> &'static str;

    fn parse(&self, reply: &str, essay_text: &str) -> ParsedAnalysis;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_ratio() {
        assert_eq!(ParseCoverage::default().ratio(), 0.0);

        let full = ParseCoverage {
            dimensions_found: 5,
            total_found: true,
            general_comment_found: true,
            weak_dimensions_found: true,
            follow_up_found: true,
        };
        assert_eq!(full.ratio(), 1.0);
        assert!(full.is_complete());
    }
}
