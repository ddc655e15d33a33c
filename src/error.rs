/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short, user-facing description used when printing to the terminal
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg.clone(),
            AppError::ExternalApi(msg) => {
                format!("Error analyzing movies. Please try again. ({})", msg)
            }
            AppError::HttpClient(_) => {
                format!("Error analyzing movies. Please try again. ({})", self)
            }
            _ => self.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
