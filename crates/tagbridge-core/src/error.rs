use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    #[error("Duplicate middleware id: {0}")]
    DuplicateMiddleware(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
