use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch of '{resource}' failed: {message}")]
    Fetch { resource: String, message: String },

    #[error("Stage '{stage}' depends on '{dependency}', which has not run")]
    UnresolvedDependency { stage: String, dependency: String },

    #[error("Stage '{0}' is declared more than once")]
    DuplicateStage(String),

    #[error("Malformed sink input for '{name}': {message}")]
    MalformedSinkInput { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;
