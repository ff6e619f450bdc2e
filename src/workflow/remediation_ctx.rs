//! 补救流程上下文
//!
//! 封装"我正在练习哪个能力的哪个类别、哪个等级"这一信息，仅用于日志

use std::fmt::Display;

use crate::models::{ProficiencyLevel, RemediationState, RubricDimension, Stage};

/// 补救流程上下文
#[derive(Debug, Clone)]
pub struct RemediationCtx {
    /// 能力维度
    pub competency: RubricDimension,

    /// 当前阶段
    pub stage: Stage,

    /// 当前类别标签（仅逐类别纠正阶段存在）
    pub category: Option<String>,

    /// (已完成类别数, 类别总数)
    pub progress: (usize, usize),

    pub level: ProficiencyLevel,
}

impl RemediationCtx {
    /// 从状态中截取一份上下文快照
    pub fn from_state(state: &RemediationState) -> Self {
        Self {
            competency: state.competency(),
            stage: state.stage(),
            category: state.current_category().map(|c| c.label.clone()),
            progress: state.progress(),
            level: state.level(),
        }
    }
}

impl Display for RemediationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.category {
            Some(category) => write!(
                f,
                "[Competência {} | {:?} | {} {}/{} | {}]",
                self.competency.number(),
                self.stage,
                category,
                self.progress.0 + 1,
                self.progress.1,
                self.level
            ),
            None => write!(
                f,
                "[Competência {} | {:?}]",
                self.competency.number(),
                self.stage
            ),
        }
    }
}
