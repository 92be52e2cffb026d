use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Generic Errors
    #[error("Operation aborted")]
    Aborted,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {message}")]
    ConnectionFailedTo { host: String, port: u16, message: String },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name {domain} not resolved: {message}")]
    NameNotResolvedFor { domain: String, message: String },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Name resolution failed")]
    NameResolutionFailed,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Empty response")]
    EmptyResponse,

    // dualnet-specific errors
    #[error("No fetch implementation available")]
    FetchUnavailable,
    #[error("Invalid network configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Runtime does not support {0}")]
    RuntimeUnsupported(&'static str),
    #[error("HTTP body error")]
    HttpBodyError,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Builds a [`NetError::NameNotResolvedFor`] from any displayable cause.
    pub fn dns_failed(domain: &str, cause: impl std::fmt::Display) -> Self {
        NetError::NameNotResolvedFor { domain: domain.to_string(), message: cause.to_string() }
    }

    /// Builds a [`NetError::ConnectionFailedTo`] from any displayable cause.
    pub fn connection_failed_to(host: &str, port: u16, cause: impl std::fmt::Display) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            message: cause.to_string(),
        }
    }

    /// Returns true for errors produced while resolving a hostname.
    pub fn is_dns_error(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::NameResolutionFailed
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Aborted => -3,
            NetError::ConnectionClosed => -100,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed => -104,
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,
            NetError::NameResolutionFailed => -137,
            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::EmptyResponse => -324,
            // Crate-specific codes live below -10000 to stay clear of Chromium ranges
            NetError::FetchUnavailable => -10001,
            NetError::InvalidConfiguration(_) => -10002,
            NetError::RuntimeUnsupported(_) => -10003,
            NetError::HttpBodyError => -10004,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -3 => NetError::Aborted,
            -100 => NetError::ConnectionClosed,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -137 => NetError::NameResolutionFailed,
            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -324 => NetError::EmptyResponse,
            -10001 => NetError::FetchUnavailable,
            // Payloads do not survive the code; the variant does.
            -10002 => NetError::InvalidConfiguration(String::new()),
            -10003 => NetError::RuntimeUnsupported("unknown capability"),
            -10004 => NetError::HttpBodyError,
            _ => NetError::Unknown(code),
        }
    }
}
