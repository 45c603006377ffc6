//! Error handling for the Trade Pilot client

use std::fmt;
use thiserror::Error;
use tradepilot_auth::AuthError;
use tradepilot_postgrest::PostgrestError;

/// Unified error type for the Trade Pilot client
#[derive(Error, Debug)]
pub enum Error {
    /// Sign-up, sign-in or session failures reported by the auth service
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Any non-success answer from the database, with the backend's message
    #[error("{message}")]
    Backend { message: String },

    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// An action that needs a signed-in user or a loaded profile
    #[error("You need to be signed in to do that")]
    NotSignedIn,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A multi-step operation failed part way through
    #[error("{}", describe_saga(.step, .message, .compensated))]
    Saga {
        step: &'static str,
        message: String,
        compensated: bool,
    },
}

impl From<PostgrestError> for Error {
    fn from(err: PostgrestError) -> Self {
        Error::Backend {
            message: err.backend_message(),
        }
    }
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new backend error
    pub fn backend<T: fmt::Display>(msg: T) -> Self {
        Error::Backend {
            message: msg.to_string(),
        }
    }

    /// Text suitable for a notification body.
    pub fn message(&self) -> String {
        match self {
            Error::Auth(err) => err.message(),
            Error::Backend { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

fn describe_saga(step: &str, message: &str, compensated: &bool) -> String {
    if *compensated {
        format!("{} failed: {}", step, message)
    } else {
        format!("{} failed: {} (rollback incomplete)", step, message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
