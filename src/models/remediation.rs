//! 补救流程状态
//!
//! `RemediationState` 只由 `workflow::RemediationFlow` 通过本模块的
//! `pub(crate)` 转移方法修改

use serde::{Deserialize, Serialize};

use super::analysis::ErrorCategory;
use super::rubric::RubricDimension;

/// 熟练度等级，严格递增，`Advanced` 为终点
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    /// 下一个等级，已是最高级时返回 None
    pub fn next(self) -> Option<Self> {
        match self {
            ProficiencyLevel::Basic => Some(ProficiencyLevel::Intermediate),
            ProficiencyLevel::Intermediate => Some(ProficiencyLevel::Advanced),
            ProficiencyLevel::Advanced => None,
        }
    }

    /// 提示词和界面中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            ProficiencyLevel::Basic => "Básico",
            ProficiencyLevel::Intermediate => "Intermediário",
            ProficiencyLevel::Advanced => "Avançado",
        }
    }
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Presentation,
    ErrorIdentification,
    PerCategoryCorrection,
    FinalAnalysis,
}

/// 一道分级练习及其标准答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub level: ProficiencyLevel,
    /// 练习前展示的理论讲解
    #[serde(default)]
    pub theory: String,
    pub prompt: String,
    pub answer: String,
}

/// 评价结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// 回复中没有可识别的 `Correto: Sim/Não`
    CouldNotEvaluate,
}

/// 对学生答案的评价
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub feedback: String,
}

/// 一次作答记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub category: String,
    pub level: ProficiencyLevel,
    pub verdict: Verdict,
}

/// 单个能力维度的补救状态
///
/// 字段只读；修改只能经过下方的转移方法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationState {
    stage: Stage,
    competency: RubricDimension,
    categories: Vec<ErrorCategory>,
    category_index: usize,
    level: ProficiencyLevel,
    /// 已生成、等待学生作答的练习
    #[serde(default)]
    pending: Option<Exercise>,
    /// 当前 (类别, 等级) 下的作答次数
    #[serde(default)]
    attempts_at_level: u32,
    #[serde(default)]
    history: Vec<AttemptRecord>,
    /// 因练习无法解析而跳过的类别
    #[serde(default)]
    skipped: Vec<String>,
}

impl RemediationState {
    pub fn new(competency: RubricDimension) -> Self {
        Self {
            stage: Stage::Presentation,
            competency,
            categories: Vec::new(),
            category_index: 0,
            level: ProficiencyLevel::Basic,
            pending: None,
            attempts_at_level: 0,
            history: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn competency(&self) -> RubricDimension {
        self.competency
    }

    pub fn categories(&self) -> &[ErrorCategory] {
        &self.categories
    }

    pub fn category_index(&self) -> usize {
        self.category_index
    }

    pub fn level(&self) -> ProficiencyLevel {
        self.level
    }

    pub fn pending(&self) -> Option<&Exercise> {
        self.pending.as_ref()
    }

    pub fn attempts_at_level(&self) -> u32 {
        self.attempts_at_level
    }

    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// 当前正在练习的类别
    pub fn current_category(&self) -> Option<&ErrorCategory> {
        match self.stage {
            Stage::PerCategoryCorrection => self.categories.get(self.category_index),
            _ => None,
        }
    }

    /// 所有类别是否已处理完
    pub fn categories_exhausted(&self) -> bool {
        self.category_index >= self.categories.len()
    }

    /// (已完成类别数, 类别总数)
    pub fn progress(&self) -> (usize, usize) {
        (self.category_index.min(self.categories.len()), self.categories.len())
    }

    /// 达到的最高等级：某等级答对即视为达到下一等级
    pub fn final_level(&self) -> ProficiencyLevel {
        self.history
            .iter()
            .filter(|record| record.verdict == Verdict::Correct)
            .map(|record| record.level.next().unwrap_or(ProficiencyLevel::Advanced))
            .max()
            .unwrap_or(ProficiencyLevel::Basic)
    }

    pub(crate) fn advance_stage_to_identification(&mut self) {
        self.stage = Stage::ErrorIdentification;
    }

    /// 进入逐类别纠正；没有类别时直接进入最终分析
    pub(crate) fn enter_correction(&mut self, categories: Vec<ErrorCategory>) {
        self.categories = categories;
        self.category_index = 0;
        self.reset_level();
        self.stage = if self.categories_exhausted() {
            Stage::FinalAnalysis
        } else {
            Stage::PerCategoryCorrection
        };
    }

    pub(crate) fn set_pending(&mut self, exercise: Exercise) {
        self.pending = Some(exercise);
    }

    /// 当前类别完成（或被跳过），进入下一个类别
    pub(crate) fn advance_category(&mut self) {
        self.category_index += 1;
        self.reset_level();
        if self.categories_exhausted() {
            self.stage = Stage::FinalAnalysis;
        }
    }

    /// 跳过当前类别
    pub(crate) fn skip_category(&mut self) {
        if let Some(category) = self.categories.get(self.category_index) {
            self.skipped.push(category.label.clone());
        }
        self.advance_category();
    }

    /// 记录一次作答，并根据结论推进
    pub(crate) fn record_attempt(&mut self, verdict: Verdict) {
        let category = self
            .current_category()
            .map(|category| category.label.clone())
            .unwrap_or_default();
        self.history.push(AttemptRecord {
            category,
            level: self.level,
            verdict,
        });
        self.attempts_at_level += 1;

        if verdict != Verdict::Correct {
            return;
        }

        match self.level.next() {
            Some(next) => {
                self.level = next;
                self.pending = None;
                self.attempts_at_level = 0;
            }
            None => self.advance_category(),
        }
    }

    fn reset_level(&mut self) {
        self.level = ProficiencyLevel::Basic;
        self.pending = None;
        self.attempts_at_level = 0;
    }
}
