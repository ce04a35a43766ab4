use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from local files (config, session, log).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Transport-level failure talking to the backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend rejected the bearer token.
    #[error("Session expired")]
    Unauthorized,

    /// A response or stored value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// Rejected user input (e.g. an invalid folder name).
    #[error("{0}")]
    Validation(String),

    /// Operation not allowed for the current user.
    #[error("{0}")]
    Permission(String),
}

impl AppError {
    /// Text to show in a notice. Backend messages are used verbatim;
    /// transport and decode failures fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            AppError::Validation(msg) | AppError::Permission(msg) => msg.clone(),
            AppError::Unauthorized => "Session expired, sign in again".to_string(),
            _ => fallback.to_string(),
        }
    }
}
