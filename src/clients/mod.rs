//! 基础设施层：文本生成能力
//!
//! 核心逻辑只依赖 `TextGenerator`，不关心模型如何部署

pub mod llm_client;

pub use llm_client::LlmClient;

use async_trait::async_trait;

/// 文本生成能力
///
/// 对核心来说这是一个不透明的函数：输入提示词，输出一段自然语言。
/// 返回 `Err` 表示一次可重试的临时失败
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
