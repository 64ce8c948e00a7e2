use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The configured secret is not valid base64 where the exchange requires it.
    /// Fatal: the caller has to reconfigure credentials.
    #[error("Invalid secret encoding for {exchange}: {reason}")]
    InvalidSecretEncoding { exchange: String, reason: String },

    /// The exchange answered and rejected the request.
    #[error("{exchange} API error: HTTP {status} - {body}")]
    ApiError {
        exchange: String,
        status: u16,
        body: String,
    },

    /// DNS, TLS, connection reset or timeout. Safe to retry with backoff.
    #[error("{exchange} transport error: {message}")]
    TransportError { exchange: String, message: String },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ExchangeError {
    pub fn api(exchange: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::ApiError {
            exchange: exchange.into(),
            status,
            body: body.into(),
        }
    }

    pub fn transport(exchange: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportError {
            exchange: exchange.into(),
            message: message.into(),
        }
    }

    pub fn invalid_secret(exchange: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSecretEncoding {
            exchange: exchange.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may retry the same request after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportError { .. } | Self::ConnectionTimeout(_)
        )
    }

    /// HTTP status for errors the exchange itself produced.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
