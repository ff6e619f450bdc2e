//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层把作文分析和逐能力补救串成一个完整会话，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `essay_analyzer` - 作文分析器
//! - 构建评分提示词（主题 + 原文 + 知识库片段）
//! - 通过弹性调用器请求评分
//! - 交给 `RubricParser` 解析，返回尽力而为的 `EssayAnalysis`
//!
//! ### `session` - 辅导会话
//! - 接收四种用户事件，返回四种响应
//! - 按补救计划逐个能力运行 `RemediationFlow`
//! - 归档每个能力的最终报告
//! - 会话状态快照 / 恢复
//!
//! ## 层次关系
//!
//! ```text
//! session (处理一个学生)
//!     ↓
//! essay_analyzer / workflow::RemediationFlow (处理一篇作文 / 一个能力)
//!     ↓
//! services (能力层：invoker / prompts / knowledge / archive)
//!     ↓
//! clients (基础设施：TextGenerator)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：analyzer 管评分，session 管会话
//! 2. **状态显式**：所有会话状态都在 `SessionState` 中，没有全局可变状态
//! 3. **向下依赖**：编排层 → workflow → services → clients

pub mod essay_analyzer;
pub mod session;

// 重新导出主要类型
pub use essay_analyzer::{AnalysisFailure, EssayAnalyzer};
pub use session::{NoticeKind, Response, SessionState, TutorSession, UserEvent};
