//! 弹性调用层 - 业务能力层
//!
//! 在 `TextGenerator` 外包一层有限次数的重试和退避。
//! 空字符串是合法结果，不会触发重试

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::clients::TextGenerator;

/// 退避策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// 每次失败后固定等待
    Constant(Duration),
    /// 从 `initial` 开始每次翻倍，不超过 `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// 第 `failed_attempts` 次失败之后的等待时间（从 1 开始）
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        match *self {
            Backoff::Constant(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = failed_attempts.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << exponent).min(max)
            }
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Constant(Duration::from_secs(2)),
        }
    }
}

/// 重试耗尽：一次回复都没有拿到
///
/// 与"拿到回复但无法解析"严格区分，后者不是错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("已重试 {attempts} 次仍失败: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl InvokeError {
    pub fn attempts(&self) -> u32 {
        match self {
            InvokeError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// 弹性调用器
#[derive(Clone)]
pub struct ResilientInvoker {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ResilientInvoker {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    /// 使用默认尝试次数调用
    pub async fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        self.invoke_with_attempts(prompt, self.policy.max_attempts)
            .await
    }

    /// 最多尝试 `max_attempts` 次（至少 1 次）
    ///
    /// 每次失败记录一条 warn，耗尽时记录一条 error
    pub async fn invoke_with_attempts(
        &self,
        prompt: &str,
        max_attempts: u32,
    ) -> Result<String, InvokeError> {
        let max_attempts = max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            debug!("LLM 调用 (尝试 {}/{})", attempt, max_attempts);

            match self.generator.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "⚠️ 第 {}/{} 次调用失败: {}",
                        attempt, max_attempts, last_error
                    );
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.backoff.delay_after(attempt);
                if !delay.is_zero() {
                    debug!("等待 {:?} 后重试...", delay);
                    sleep(delay).await;
                }
            }
        }

        error!("❌ 达到最大尝试次数 {}，放弃本次调用", max_attempts);
        Err(InvokeError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}
