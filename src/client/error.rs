//! Remote call errors and their classification
//!
//! Every failure at the call boundary is mapped onto an [`ErrorKind`]. Only the
//! two transient kinds are retried; everything else reaches the caller.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Retry classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service rejected the call because of its own rate limit
    RateLimited,

    /// The connection was reset by the peer
    ConnectionReset,

    /// Anything else; never retried by the call wrapper
    Other,
}

impl ErrorKind {
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Errors returned by remote calls and downloads
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limited by the remote service on {target}")]
    RateLimited { target: String },

    #[error("Connection reset by peer while calling {target}")]
    ConnectionReset { target: String },

    #[error("{method} returned error '{code}'")]
    Api { method: String, code: String },

    #[error("HTTP {status} from {target}")]
    Http { target: String, status: u16 },

    #[error("Transport error calling {target}: {message}")]
    Transport { target: String, message: String },

    #[error("Invalid response from {target}: {message}")]
    Decode { target: String, message: String },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ConnectionReset { .. } => ErrorKind::ConnectionReset,
            Self::Http { status: 429, .. } => ErrorKind::RateLimited,
            _ => ErrorKind::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    /// Error code reported by the service, if this is an API-level failure
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Classifies a transport failure from the HTTP client
    pub fn from_reqwest(target: &str, err: reqwest::Error) -> Self {
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return Self::RateLimited {
                target: target.to_string(),
            };
        }

        if is_connection_reset(&err) {
            return Self::ConnectionReset {
                target: target.to_string(),
            };
        }

        if err.is_decode() {
            return Self::Decode {
                target: target.to_string(),
                message: err.to_string(),
            };
        }

        Self::Transport {
            target: target.to_string(),
            message: err.to_string(),
        }
    }
}

/// Walks the source chain looking for an IO connection reset
pub fn is_connection_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        current = e.source();
    }
    false
}
