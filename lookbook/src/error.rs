//! Error definitions for the engine.

use thiserror::Error;

/// 服务端密钥失效时返回的正文哨兵（REST 错误正文为自由文本）。
const ENTITY_NOT_FOUND_SENTINEL: &str = "Requested entity was not found";
const INVALID_KEY_SENTINEL: &str = "API key not valid";

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Key surface error: {message}")]
    KeySurface { message: String },

    #[error("No inline image in response: {message}")]
    MissingImage { message: String },
}

impl Error {
    /// 判断错误是否意味着 API 密钥被拒绝或已失效。
    ///
    /// 优先使用结构化的 HTTP 状态码（401/403）；REST 错误正文没有稳定的
    /// 错误码字段，因此保留正文哨兵子串匹配作为兜底。
    #[must_use]
    pub fn is_key_rejection(&self) -> bool {
        match self {
            Self::ApiError { status, message } => {
                matches!(*status, 401 | 403)
                    || message.contains(ENTITY_NOT_FOUND_SENTINEL)
                    || message.contains(INVALID_KEY_SENTINEL)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
