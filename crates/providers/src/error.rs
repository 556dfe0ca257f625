use std::time::Duration;

use {relaybot_config::ProviderTag, thiserror::Error};

/// Why a completion did not produce a reply.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{provider} is not integrated")]
    NotIntegrated { provider: ProviderTag },

    #[error("request timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl InvokeError {
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Map a transport error, keeping timeouts distinct.
    #[must_use]
    pub fn transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout }
        } else {
            Self::Reqwest(err.without_url())
        }
    }
}

pub type Result<T> = std::result::Result<T, InvokeError>;
