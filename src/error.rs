//! 翻译同步引擎错误类型
//!
//! 定义引擎各组件共享的错误类型和处理工具。
//! 所有运行期故障都是可恢复的：调用方拿到错误后可以选择重试、
//! 回退或忽略，引擎内部状态保持一致。

use thiserror::Error;

/// 引擎统一错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 翻译服务请求失败（网络、超时、状态码等）
    #[error("翻译服务请求失败: {0}")]
    ProviderError(String),

    /// 翻译服务返回了空结果
    ///
    /// 按照约定，空结果表示本批次翻译失败，记忆表不做任何修改。
    #[error("翻译服务返回空结果")]
    EmptyProviderResult,

    /// 序列化或反序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 文档树访问错误（单节点级，跳过即可）
    #[error("文档树访问错误: {0}")]
    DomError(String),

    /// IO 错误
    #[error("IO错误: {0}")]
    IoError(String),
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低：单项跳过，不影响整体流程
    Low,
    /// 中：本批次失败，后续批次不受影响
    Medium,
    /// 高：功能不可用，需要调用方介入
    High,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "低",
            ErrorSeverity::Medium => "中",
            ErrorSeverity::High => "高",
        }
    }
}

impl SyncError {
    /// 错误是否可恢复
    ///
    /// 可恢复的错误不会破坏引擎状态，调用方可以直接重新触发操作。
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::ConfigError(_))
    }

    /// 错误严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::EmptyProviderResult => ErrorSeverity::Medium,
            SyncError::ProviderError(_) => ErrorSeverity::Medium,
            SyncError::SerializationError(_) => ErrorSeverity::Medium,
            SyncError::DomError(_) => ErrorSeverity::Low,
            SyncError::IoError(_) => ErrorSeverity::Medium,
            SyncError::ConfigError(_) => ErrorSeverity::High,
        }
    }

    /// 错误分类标签，用于日志和统计
    pub fn category(&self) -> &'static str {
        match self {
            SyncError::ConfigError(_) => "config",
            SyncError::ProviderError(_) | SyncError::EmptyProviderResult => "provider",
            SyncError::SerializationError(_) => "serialization",
            SyncError::DomError(_) => "dom",
            SyncError::IoError(_) => "io",
        }
    }
}

// ============================================================================
// 标准库和第三方错误的转换
// ============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigError(format!("TOML解析失败: {}", err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::ProviderError(err.to_string())
    }
}

/// 引擎统一结果类型
pub type SyncResult<T> = Result<T, SyncError>;

// ============================================================================
// 错误处理辅助工具
// ============================================================================

pub mod helpers {
    use super::*;

    /// 按严重程度输出错误日志
    pub fn log_error(error: &SyncError, context: &str) {
        match error.severity() {
            ErrorSeverity::Low => {
                tracing::debug!("[{}] 跳过: {}", context, error);
            }
            ErrorSeverity::Medium => {
                tracing::warn!("[{}] 可恢复错误: {}", context, error);
            }
            ErrorSeverity::High => {
                tracing::error!("[{}] 错误: {}", context, error);
            }
        }
    }

    /// 创建配置错误
    pub fn config_error<S: Into<String>>(message: S) -> SyncError {
        SyncError::ConfigError(message.into())
    }

    /// 创建翻译服务错误
    pub fn provider_error<S: Into<String>>(message: S) -> SyncError {
        SyncError::ProviderError(message.into())
    }

    /// 创建文档树访问错误
    pub fn dom_error<S: Into<String>>(message: S) -> SyncError {
        SyncError::DomError(message.into())
    }
}
