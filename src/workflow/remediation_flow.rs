//! 补救流程 - 流程层
//!
//! 核心职责：定义"一个能力维度"的完整补救流程
//!
//! 流程顺序：
//! 1. Presentation → 能力介绍
//! 2. ErrorIdentification → 错误扫描 → 分组 → 去重
//! 3. PerCategoryCorrection → 理论 → 分级练习 → 学生作答 → 评价 → 升级/换类别
//! 4. FinalAnalysis → 薄弱点地图 + 统计 + 学习建议
//!
//! 每一步的全部调用成功之后才执行状态转移，
//! 重试耗尽时状态保持不变

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::WorkflowError;
use crate::models::{
    ErrorCategory, Evaluation, Exercise, ProficiencyLevel, RemediationState, RubricDimension,
    Stage, Verdict,
};
use crate::parser::{extract_categories, parse_evaluation, parse_exercise};
use crate::services::{prompts, InvokeError, KnowledgeBase, NoKnowledge, ResilientInvoker};
use crate::utils::logging::truncate_text;
use crate::workflow::remediation_ctx::RemediationCtx;

/// 一次推进的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    /// 能力介绍
    Overview {
        competency: RubricDimension,
        text: String,
    },
    /// 识别出的错误类别（已去重）
    ErrorsIdentified { categories: Vec<ErrorCategory> },
    /// 没有识别出任何类别，直接进入最终分析
    NoErrors,
    /// 等待学生作答的练习
    Exercise {
        competency: RubricDimension,
        category: ErrorCategory,
        level: ProficiencyLevel,
        theory: String,
        exercise: String,
    },
    /// 练习无法解析，跳过该类别
    CategorySkipped { category: String },
    /// 最终报告，流程终点
    Final {
        competency: RubricDimension,
        level: ProficiencyLevel,
        report: String,
    },
}

/// 补救流程
///
/// - 只通过 `RemediationState` 的转移方法修改状态
/// - 不持有任何会话状态，多个会话可共享同一个实例
pub struct RemediationFlow {
    invoker: ResilientInvoker,
    knowledge: Arc<dyn KnowledgeBase>,
}

impl RemediationFlow {
    pub fn new(invoker: ResilientInvoker) -> Self {
        Self {
            invoker,
            knowledge: Arc::new(NoKnowledge),
        }
    }

    /// 使用知识库为提示词补充上下文
    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// 执行当前阶段的下一步
    ///
    /// # 参数
    /// - `state`: 会话持有的补救状态
    /// - `essay_text`: 作文原文（错误扫描使用）
    ///
    /// # 返回
    /// 本步骤产生的内容；重试耗尽时返回 `WorkflowError::StepFailed`，状态不变
    pub async fn advance(
        &self,
        state: &mut RemediationState,
        essay_text: &str,
    ) -> Result<StepReport, WorkflowError> {
        debug!("{} 推进流程", RemediationCtx::from_state(state));

        match state.stage() {
            Stage::Presentation => self.present(state).await,
            Stage::ErrorIdentification => self.identify_errors(state, essay_text).await,
            Stage::PerCategoryCorrection => self.next_exercise(state).await,
            Stage::FinalAnalysis => self.final_analysis(state).await,
        }
    }

    /// 评价学生对当前练习的作答
    ///
    /// 答对时升级或进入下一个类别；答错或无法评价时保持 (类别, 等级) 不变，
    /// 同一道练习可以无限次重试
    pub async fn submit_answer(
        &self,
        state: &mut RemediationState,
        answer: &str,
    ) -> Result<Evaluation, WorkflowError> {
        if state.stage() != Stage::PerCategoryCorrection {
            return Err(WorkflowError::WrongStage {
                expected: Stage::PerCategoryCorrection,
                actual: state.stage(),
            });
        }
        let (Some(exercise), Some(category)) = (state.pending(), state.current_category())
        else {
            return Err(WorkflowError::NoPendingExercise);
        };

        let ctx = RemediationCtx::from_state(state);
        info!("{} 📝 评价学生答案...", ctx);

        let prompt = prompts::evaluation_prompt(
            category,
            state.competency(),
            &exercise.prompt,
            &exercise.answer,
            answer,
        );
        let reply = self
            .invoker
            .invoke(&prompt)
            .await
            .map_err(|e| step_failed("avaliação", e))?;

        let evaluation = parse_evaluation(&reply);

        state.record_attempt(evaluation.verdict);

        match evaluation.verdict {
            Verdict::Correct => info!(
                "{} ✓ 答案正确 → {}",
                ctx,
                RemediationCtx::from_state(state)
            ),
            Verdict::Incorrect => info!(
                "{} ✗ 答案错误 (第 {} 次尝试)",
                ctx, state.attempts_at_level()
            ),
            Verdict::CouldNotEvaluate => warn!(
                "{} ⚠️ 无法从回复中识别评价结论: {}",
                ctx,
                truncate_text(&reply, 80)
            ),
        }

        Ok(evaluation)
    }

    async fn present(&self, state: &mut RemediationState) -> Result<StepReport, WorkflowError> {
        let competency = state.competency();
        info!("📖 介绍能力: {}", competency);

        let prompt = self
            .grounded(prompts::overview_prompt(competency), competency.name())
            .await;
        let text = self
            .invoker
            .invoke(&prompt)
            .await
            .map_err(|e| step_failed("apresentação", e))?;

        state.advance_stage_to_identification();
        info!("{} → 错误识别", RemediationCtx::from_state(state));

        Ok(StepReport::Overview { competency, text })
    }

    async fn identify_errors(
        &self,
        state: &mut RemediationState,
        essay_text: &str,
    ) -> Result<StepReport, WorkflowError> {
        let competency = state.competency();
        info!("🔍 扫描作文中与 {} 相关的错误...", competency);

        let errors = self
            .invoker
            .invoke(&prompts::error_scan_prompt(competency, essay_text))
            .await
            .map_err(|e| step_failed("identificação de erros", e))?;
        debug!("错误扫描结果: {}", truncate_text(&errors, 120));

        let grouped = self
            .invoker
            .invoke(&prompts::grouping_prompt(competency, &errors))
            .await
            .map_err(|e| step_failed("agrupamento de erros", e))?;

        let categories = extract_categories(&grouped);

        state.enter_correction(categories.clone());

        if categories.is_empty() {
            info!(
                "{} 未识别到错误类别，直接进入最终分析",
                RemediationCtx::from_state(state)
            );
            return Ok(StepReport::NoErrors);
        }

        let labels: Vec<&str> = categories.iter().map(|c| c.label.as_str()).collect();
        info!(
            "{} ✓ 识别到 {} 个错误类别: {}",
            RemediationCtx::from_state(state),
            categories.len(),
            labels.join(", ")
        );

        Ok(StepReport::ErrorsIdentified { categories })
    }

    async fn next_exercise(
        &self,
        state: &mut RemediationState,
    ) -> Result<StepReport, WorkflowError> {
        let ctx = RemediationCtx::from_state(state);
        let Some(category) = state.current_category().cloned() else {
            // 转移方法保证不会出现；按类别耗尽处理
            state.advance_category();
            return self.final_analysis(state).await;
        };

        // 已有未完成的练习：重新展示，不重新生成
        if let Some(pending) = state.pending() {
            debug!("{} 重新展示未完成的练习", ctx);
            return Ok(exercise_report(state.competency(), category, pending));
        }

        info!("{} 📚 生成理论讲解...", ctx);
        let theory_prompt = self
            .grounded(
                prompts::theory_prompt(&category, state.competency()),
                &category.label,
            )
            .await;
        let theory = self
            .invoker
            .invoke(&theory_prompt)
            .await
            .map_err(|e| step_failed("teoria", e))?;

        info!("{} ✏️ 生成练习...", ctx);
        let reply = self
            .invoker
            .invoke(&prompts::exercise_prompt(
                &category,
                state.competency(),
                state.level(),
            ))
            .await
            .map_err(|e| step_failed("exercício", e))?;

        let parsed = parse_exercise(&reply);
        if !parsed.is_usable() {
            warn!(
                "{} ⚠️ 练习缺少题干或标准答案，跳过类别 '{}': {}",
                ctx,
                category.label,
                truncate_text(&reply, 80)
            );
            state.skip_category();
            info!("跳过后 → {}", RemediationCtx::from_state(state));
            return Ok(StepReport::CategorySkipped {
                category: category.label,
            });
        }

        let exercise = Exercise {
            level: state.level(),
            theory,
            prompt: parsed.exercise,
            answer: parsed.answer.unwrap_or_default(),
        };
        let report = exercise_report(state.competency(), category, &exercise);

        state.set_pending(exercise);
        info!("{} ✓ 练习已就绪，等待作答", ctx);

        Ok(report)
    }

    async fn final_analysis(
        &self,
        state: &mut RemediationState,
    ) -> Result<StepReport, WorkflowError> {
        let competency = state.competency();
        let level = state.final_level();
        info!("📊 生成 {} 的最终分析 (最终等级: {})", competency, level);

        let statistics = attempt_statistics(state);
        let prompt = self
            .grounded(
                prompts::final_analysis_prompt(competency, level, &statistics),
                competency.name(),
            )
            .await;
        let report = self
            .invoker
            .invoke(&prompt)
            .await
            .map_err(|e| step_failed("análise final", e))?;

        info!("{} ✓ 最终分析完成", RemediationCtx::from_state(state));

        Ok(StepReport::Final {
            competency,
            level,
            report,
        })
    }

    async fn grounded(&self, prompt: String, query: &str) -> String {
        let snippets = self.knowledge.context_for(query).await;
        if !snippets.is_empty() {
            debug!("为 '{}' 补充 {} 条知识片段", query, snippets.len());
        }
        prompts::ground(prompt, &snippets)
    }
}

fn exercise_report(
    competency: RubricDimension,
    category: ErrorCategory,
    exercise: &Exercise,
) -> StepReport {
    StepReport::Exercise {
        competency,
        category,
        level: exercise.level,
        theory: exercise.theory.clone(),
        exercise: exercise.prompt.clone(),
    }
}

fn step_failed(step: &'static str, error: InvokeError) -> WorkflowError {
    let attempts = error.attempts();
    let InvokeError::Exhausted { last_error, .. } = error;
    WorkflowError::StepFailed {
        step,
        attempts,
        last_error,
    }
}

/// 根据作答历史生成统计摘要（最终分析提示词使用）
pub fn attempt_statistics(state: &RemediationState) -> String {
    let mut lines = vec![format!(
        "Categorias de erro trabalhadas: {}",
        state.categories().len()
    )];

    for category in state.categories() {
        let records: Vec<_> = state
            .history()
            .iter()
            .filter(|record| record.category == category.label)
            .collect();
        let correct = records
            .iter()
            .filter(|record| record.verdict == Verdict::Correct)
            .count();
        let highest = records
            .iter()
            .filter(|record| record.verdict == Verdict::Correct)
            .map(|record| record.level)
            .max();

        lines.push(format!(
            "- {}: {} tentativa(s), {} correta(s), nível mais alto concluído: {}",
            category.label,
            records.len(),
            correct,
            highest.map_or("nenhum", |level| level.name())
        ));
    }

    if !state.skipped().is_empty() {
        lines.push(format!(
            "Categorias puladas (exercício indisponível): {}",
            state.skipped().join(", ")
        ));
    }

    lines.join("\n")
}
