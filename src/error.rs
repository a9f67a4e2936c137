//! Errors produced by a single run of the remote code runner.

use thiserror::Error;

pub const MISSING_CONTEXT_MESSAGE: &str = "Error: Lesson number is missing.";
pub const CONNECTION_MESSAGE: &str = "Error connecting to the server.";

/// Why a run attempt failed. None of these are fatal to the app; the user may retry.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("no lesson/session identifier available")]
    MissingContext,

    #[error("Server error: {status}")]
    Remote { status: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RunError {
    /// Text that replaces the console output when this error ends a run.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingContext => MISSING_CONTEXT_MESSAGE.to_string(),
            Self::Remote { status } => format!("Server error: {}", status),
            Self::Transport(_) | Self::Decode(_) => CONNECTION_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(RunError::MissingContext.user_message(), MISSING_CONTEXT_MESSAGE);
        let remote = RunError::Remote { status: "Internal Server Error".into() };
        assert_eq!(remote.user_message(), "Server error: Internal Server Error");
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(RunError::from(decode).user_message(), CONNECTION_MESSAGE);
    }
}
