use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("model credentials are not configured")]
    NotConfigured,
    #[error("call timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion contained no text")]
    EmptyCompletion,
}

impl InvocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::EmptyCompletion => "empty_completion",
        }
    }
}

impl From<reqwest::Error> for InvocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
