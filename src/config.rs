use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::services::invoker::{Backoff, RetryPolicy};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    // --- 重试策略 ---
    /// 每次调用的最大尝试次数
    pub max_attempts: u32,
    /// 重试等待时间（秒）
    pub retry_delay_secs: u64,
    /// `constant` 或 `exponential`
    pub backoff: String,
    /// 指数退避的上限（秒）
    pub retry_max_delay_secs: u64,
    // --- 其他 ---
    /// 知识库 TOML 文件或文件夹
    pub knowledge_file: Option<String>,
    /// 每次为提示词补充的知识片段数量上限
    pub knowledge_top_k: usize,
    /// 补救报告归档文件
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            max_attempts: 3,
            retry_delay_secs: 2,
            backoff: "constant".to_string(),
            retry_max_delay_secs: 60,
            knowledge_file: None,
            knowledge_top_k: 3,
            report_file: "trilha_relatorios.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::with_env_overrides(Self::default())
    }

    /// 从 TOML 文件加载配置，再用环境变量覆盖
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::File(FileError::NotFound {
                path: path.display().to_string(),
            }));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let base: Config = toml::from_str(&content)?;
        Ok(Self::with_env_overrides(base))
    }

    /// 优先读取 `TUTOR_CONFIG` 指定的文件，不存在时只用环境变量
    pub fn load() -> AppResult<Self> {
        match std::env::var("TUTOR_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path)),
            Err(_) => Ok(Self::from_env()),
        }
    }

    fn with_env_overrides(default: Self) -> Self {
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.temperature),
            max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_tokens),
            max_attempts: std::env::var("LLM_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            retry_delay_secs: std::env::var("LLM_RETRY_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_secs),
            backoff: std::env::var("LLM_BACKOFF").unwrap_or(default.backoff),
            retry_max_delay_secs: std::env::var("LLM_RETRY_MAX_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_max_delay_secs),
            knowledge_file: std::env::var("KNOWLEDGE_FILE").ok().or(default.knowledge_file),
            knowledge_top_k: std::env::var("KNOWLEDGE_TOP_K").ok().and_then(|v| v.parse().ok()).unwrap_or(default.knowledge_top_k),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查运行所必需的配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::EnvVarParseFailed {
                var_name: "LLM_MAX_ATTEMPTS".to_string(),
                value: self.max_attempts.to_string(),
                expected_type: "正整数".to_string(),
            });
        }
        if !matches!(self.backoff.as_str(), "constant" | "exponential") {
            return Err(ConfigError::EnvVarParseFailed {
                var_name: "LLM_BACKOFF".to_string(),
                value: self.backoff.clone(),
                expected_type: "constant | exponential".to_string(),
            });
        }
        Ok(())
    }

    /// 根据配置生成调用重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.retry_delay_secs);
        let backoff = match self.backoff.as_str() {
            "exponential" => Backoff::Exponential {
                initial: delay,
                max: Duration::from_secs(self.retry_max_delay_secs),
            },
            _ => Backoff::Constant(delay),
        };
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff,
        }
    }
}
