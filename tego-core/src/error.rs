//! 错误定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TegoError {
    /// 必需参数为空（前置条件违反）
    #[error("Required argument is null: {0}")]
    NullArgument(&'static str),

    /// 协作者句柄未初始化
    #[error("Collaborator unavailable: {0}")]
    Unavailable(&'static str),

    /// 控制协议返回了启动表中不存在的 tag
    #[error("Unrecognized bootstrap tag: \"{0}\"")]
    UnrecognizedBootstrapTag(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协作者（进程管理器 / 控制通道）报告的失败，保留原始消息
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

/// 跨 ABI 的稳定错误码
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TegoErrorCode {
    NullArgument = 1,
    Unavailable = 2,
    ProtocolViolation = 3,
    InvalidArgument = 4,
    InvalidUtf8 = 6,
    Json = 7,
    Collaborator = 8,
    Panic = 99,
}

impl TegoError {
    pub fn code(&self) -> TegoErrorCode {
        match self {
            Self::NullArgument(_) => TegoErrorCode::NullArgument,
            Self::Unavailable(_) => TegoErrorCode::Unavailable,
            Self::UnrecognizedBootstrapTag(_) => TegoErrorCode::ProtocolViolation,
            Self::InvalidArgument(_) => TegoErrorCode::InvalidArgument,
            Self::InvalidUtf8(_) => TegoErrorCode::InvalidUtf8,
            Self::Json(_) => TegoErrorCode::Json,
            Self::Collaborator(_) => TegoErrorCode::Collaborator,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TegoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_message_preserved() {
        let err = TegoError::from(anyhow::anyhow!("control socket closed"));
        assert_eq!(err.to_string(), "control socket closed");
        assert_eq!(err.code(), TegoErrorCode::Collaborator);
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            TegoError::NullArgument("context").code(),
            TegoErrorCode::NullArgument
        );
        assert_eq!(
            TegoError::UnrecognizedBootstrapTag("bogus".into()).code(),
            TegoErrorCode::ProtocolViolation
        );
        assert_eq!(
            TegoError::Unavailable("tor control").to_string(),
            "Collaborator unavailable: tor control"
        );
    }
}
