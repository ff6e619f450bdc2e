//! # Essay Tutor
//!
//! ENEM 作文评分与自适应补救练习引擎
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只暴露"生成文本"这一项能力
//! - `TextGenerator` - 不透明的 `generate(prompt)`
//! - `LlmClient` - 兼容 OpenAI API 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ResilientInvoker` - 有限次数重试 + 退避
//! - `KnowledgeBase` - 为提示词补充知识库片段
//! - `prompts` - 所有提示词模板
//! - `ReportArchive` - 归档补救报告
//!
//! ### ③ 解析层（Parser）
//! - `parser/` - 把自然语言回复变成结构化数据，失败时只产生缺省值
//! - `TemplateV1Parser` - 评分回复解析（附带覆盖率）
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个能力维度"的补救流程
//! - `RemediationFlow` - 介绍 → 错误识别 → 逐类别纠正 → 最终分析
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/essay_analyzer` - 作文 → 评分报告
//! - `orchestrator/session` - 一个学生的完整会话
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{LlmClient, TextGenerator};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{EssayAnalysis, ProficiencyLevel, RemediationState, RubricDimension, Stage};
pub use orchestrator::{AnalysisFailure, EssayAnalyzer, Response, TutorSession, UserEvent};
pub use services::{InvokeError, ResilientInvoker, RetryPolicy};
pub use workflow::{RemediationFlow, StepReport};
