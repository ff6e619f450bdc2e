use std::fmt;

use crate::models::Stage;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// LLM 服务错误
    Llm(LlmError),
    /// 文件操作错误
    File(FileError),
    /// 补救流程错误
    Workflow(WorkflowError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Workflow(e) => write!(f, "流程错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Llm(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Workflow(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// 构建请求失败
    RequestBuildFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空（没有 choices）
    EmptyResponse { model: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::RequestBuildFailed { source } => {
                write!(f, "构建 LLM 请求失败: {}", source)
            }
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyResponse { model } => {
                write!(f, "LLM返回结果为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::RequestBuildFailed { source } | LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            LlmError::EmptyResponse { .. } => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 序列化/反序列化失败
    JsonFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            FileError::JsonFailed { source } => write!(f, "JSON处理失败: {}", source),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. }
            | FileError::JsonFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// 补救流程错误
///
/// 任何一种都不会修改 `RemediationState`，重试同一步骤是安全的
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// 调用重试耗尽，本步骤无法完成
    StepFailed {
        step: &'static str,
        attempts: u32,
        last_error: String,
    },
    /// 当前没有等待作答的练习
    NoPendingExercise,
    /// 当前阶段不接受该操作
    WrongStage { expected: Stage, actual: Stage },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::StepFailed {
                step,
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "步骤 {} 无法完成 (已尝试 {} 次): {}",
                    step, attempts, last_error
                )
            }
            WorkflowError::NoPendingExercise => write!(f, "当前没有等待作答的练习"),
            WorkflowError::WrongStage { expected, actual } => {
                write!(f, "当前阶段为 {:?}，该操作需要 {:?}", actual, expected)
            }
        }
    }
}

impl std::error::Error for WorkflowError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    EnvVarNotFound { var_name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "环境变量 {} 不存在", var_name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError::Workflow(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
