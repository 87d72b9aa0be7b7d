use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("catalog API rejected the credential: {0}")]
    Authorization(String),

    #[error("catalog API request failed: {0}")]
    ExternalApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache operation failed: {0}")]
    Cache(String),

    #[error("record transformation failed: {0}")]
    Transformation(String),

    #[error("bulk persistence failed: {0}")]
    Persistence(String),

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ImportError {
    /// Authorization rejections abort immediately; everything else the
    /// fetcher sees is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ImportError::Authorization(_))
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
