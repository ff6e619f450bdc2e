//! LLM API 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, 微调模型等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use super::TextGenerator;
use crate::config::Config;
use crate::error::LlmError;

/// 默认系统消息：作文辅导老师
const SYSTEM_MESSAGE: &str = "Atue como um tutor especializado em língua portuguesa e redação para o ENEM, \
utilizando linguagem dialógica e amigável. Responda sempre em português e siga estritamente \
o formato solicitado.";

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    ///
    /// # 返回
    /// 返回 LLM 的响应内容；内容为空时返回空字符串而不是错误，
    /// 由解析层决定如何处理
    pub async fn chat(&self, user_message: &str) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let request = self.build_request(user_message)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            }
        })?;

        debug!("LLM API 调用成功");

        let choice = response.choices.first().ok_or_else(|| LlmError::EmptyResponse {
            model: self.model_name.clone(),
        })?;

        Ok(choice
            .message
            .content
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn build_request(
        &self,
        user_message: &str,
    ) -> Result<async_openai::types::chat::CreateChatCompletionRequest, LlmError> {
        let build_failed = |e: async_openai::error::OpenAIError| LlmError::RequestBuildFailed {
            source: Box::new(e),
        };

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(build_failed)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_failed)?;
        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(build_failed)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.chat(prompt).await?)
    }
}
