use thiserror::Error;

/// Failures produced while talking to the forum API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The envelope came back without `success: true`.
    #[error("{action} was rejected by the API")]
    Rejected { action: &'static str },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Network-level or malformed-response failures. These are logged and
    /// never shown to the viewer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_) | Self::InvalidUrl(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
