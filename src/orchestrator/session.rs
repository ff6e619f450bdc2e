//! 辅导会话 - 编排层
//!
//! ## 职责
//!
//! 展示层与核心之间唯一的接口：
//! 接收四种用户事件，返回四种响应，不与渲染细节耦合
//!
//! ## 会话状态
//!
//! 会话状态（分析结果 + 待补救能力队列 + 当前补救状态）
//! 全部放在 `SessionState` 中，可以整体序列化为 JSON 保存和恢复

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::clients::TextGenerator;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{EssayAnalysis, Evaluation, RemediationState, RubricDimension};
use crate::orchestrator::essay_analyzer::EssayAnalyzer;
use crate::services::{KnowledgeBase, ReportArchive, ResilientInvoker};
use crate::utils::logging::{log_analysis_summary, log_competency_complete};
use crate::workflow::{RemediationFlow, StepReport};

/// 用户事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// 提交作文
    SubmitEssay { essay: String, theme: String },
    /// 提交练习答案
    SubmitAnswer(String),
    /// 请求下一步
    NextStep,
    /// 放弃当前会话
    Abandon,
}

/// 提示类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// 作文分析无法完成（调用重试耗尽）
    AnalysisFailed,
    /// 补救步骤无法完成，可以重试同一步骤
    StepFailed,
    /// 所有能力都已完成
    Finished,
    /// 会话已放弃
    Abandoned,
    /// 操作在当前状态下不可用
    Unavailable,
}

/// 返回给展示层的响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// 评分报告
    AnalysisReport(EssayAnalysis),
    /// 补救流程内容（介绍、类别、理论+练习、跳过、最终报告）
    Remediation(StepReport),
    /// 答案评价
    Evaluation(Evaluation),
    /// 提示信息
    Notice { kind: NoticeKind, message: String },
}

impl Response {
    fn notice(kind: NoticeKind, message: impl Into<String>) -> Self {
        Response::Notice {
            kind,
            message: message.into(),
        }
    }
}

/// 可序列化的会话状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub analysis: Option<EssayAnalysis>,
    /// 尚未开始的能力（按补救顺序）
    #[serde(default)]
    pub pending_competencies: Vec<RubricDimension>,
    #[serde(default)]
    pub completed_competencies: Vec<RubricDimension>,
    pub remediation: Option<RemediationState>,
}

/// 辅导会话
///
/// 每个学生一个会话；分析器和流程可在多个会话间共享
pub struct TutorSession {
    analyzer: Arc<EssayAnalyzer>,
    flow: Arc<RemediationFlow>,
    archive: ReportArchive,
    state: SessionState,
}

impl TutorSession {
    pub fn new(
        analyzer: Arc<EssayAnalyzer>,
        flow: Arc<RemediationFlow>,
        archive: ReportArchive,
    ) -> Self {
        Self {
            analyzer,
            flow,
            archive,
            state: SessionState::default(),
        }
    }

    /// 根据配置组装完整会话
    ///
    /// # 参数
    /// - `config`: 配置（重试策略、报告文件）
    /// - `generator`: 文本生成能力
    /// - `knowledge`: 知识检索能力
    pub fn from_config(
        config: &Config,
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<dyn KnowledgeBase>,
    ) -> Self {
        let invoker = ResilientInvoker::new(generator, config.retry_policy());
        let analyzer =
            EssayAnalyzer::new(invoker.clone()).with_knowledge(Arc::clone(&knowledge));
        let flow = RemediationFlow::new(invoker).with_knowledge(knowledge);

        Self::new(
            Arc::new(analyzer),
            Arc::new(flow),
            ReportArchive::with_path(config.report_file.clone()),
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn analysis(&self) -> Option<&EssayAnalysis> {
        self.state.analysis.as_ref()
    }

    pub fn remediation(&self) -> Option<&RemediationState> {
        self.state.remediation.as_ref()
    }

    /// 处理一个用户事件
    pub async fn handle(&mut self, event: UserEvent) -> Response {
        match event {
            UserEvent::SubmitEssay { essay, theme } => self.submit_essay(&essay, &theme).await,
            UserEvent::SubmitAnswer(answer) => self.submit_answer(&answer).await,
            UserEvent::NextStep => self.next_step().await,
            UserEvent::Abandon => {
                info!("🛑 会话已放弃");
                self.state = SessionState::default();
                Response::notice(NoticeKind::Abandoned, "Sessão encerrada.")
            }
        }
    }

    /// 序列化会话状态
    pub fn snapshot(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// 从快照恢复会话状态
    pub fn restore(&mut self, snapshot: &str) -> AppResult<()> {
        self.state = serde_json::from_str(snapshot)?;
        info!(
            "♻️ 会话已恢复: 待补救 {} 项, 已完成 {} 项",
            self.state.pending_competencies.len(),
            self.state.completed_competencies.len()
        );
        Ok(())
    }

    async fn submit_essay(&mut self, essay: &str, theme: &str) -> Response {
        match self.analyzer.analyze_with_coverage(essay, theme).await {
            Ok((analysis, coverage)) => {
                log_analysis_summary(&analysis, &coverage);
                let plan = analysis.remediation_plan();
                info!("📋 补救计划: {:?}", plan);

                self.state = SessionState {
                    analysis: Some(analysis.clone()),
                    pending_competencies: plan,
                    completed_competencies: Vec::new(),
                    remediation: None,
                };
                Response::AnalysisReport(analysis)
            }
            Err(e) => {
                error!("❌ 作文分析失败: {}", e);
                Response::notice(NoticeKind::AnalysisFailed, e.to_string())
            }
        }
    }

    async fn submit_answer(&mut self, answer: &str) -> Response {
        let Some(remediation) = self.state.remediation.as_mut() else {
            return Response::notice(
                NoticeKind::Unavailable,
                "Nenhum exercício em andamento.",
            );
        };

        match self.flow.submit_answer(remediation, answer).await {
            Ok(evaluation) => Response::Evaluation(evaluation),
            Err(e) => {
                warn!("⚠️ 无法评价答案: {}", e);
                Response::notice(NoticeKind::StepFailed, e.to_string())
            }
        }
    }

    async fn next_step(&mut self) -> Response {
        let Some(essay_text) = self.state.analysis.as_ref().map(|a| a.essay_text.clone()) else {
            return Response::notice(NoticeKind::Unavailable, "Envie uma redação primeiro.");
        };

        // 当前没有进行中的能力：从队列头部开始下一个，成功后才出队
        let (mut remediation, starting) = match self.state.remediation.clone() {
            Some(remediation) => (remediation, false),
            None => match self.state.pending_competencies.first() {
                Some(competency) => (RemediationState::new(*competency), true),
                None => {
                    return Response::notice(
                        NoticeKind::Finished,
                        "Todas as competências foram trabalhadas.",
                    )
                }
            },
        };

        let report = match self.flow.advance(&mut remediation, &essay_text).await {
            Ok(report) => report,
            Err(e) => {
                warn!("⚠️ 补救步骤失败，状态保持不变: {}", e);
                return Response::notice(NoticeKind::StepFailed, e.to_string());
            }
        };

        if starting {
            self.state.pending_competencies.remove(0);
        }

        if let StepReport::Final {
            competency,
            level,
            report: text,
        } = &report
        {
            if let Err(e) = self.archive.append(*competency, *level, text) {
                error!("❌ 报告归档失败: {}", e);
            }
            self.state.completed_competencies.push(*competency);
            self.state.remediation = None;
            log_competency_complete(
                self.state.completed_competencies.len(),
                self.state.completed_competencies.len() + self.state.pending_competencies.len(),
                self.archive.path(),
            );
        } else {
            self.state.remediation = Some(remediation);
        }

        Response::Remediation(report)
    }
}
