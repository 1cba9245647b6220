use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Persistence error ({path}): {message}")]
    Persist { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
