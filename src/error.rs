use thiserror::Error;

#[derive(Error, Debug)]
pub enum FractalEvoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// Failure of a single candidate evaluation. Never fatal to a run: the
/// engine scores the candidate 0.0 and moves on.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Harness error: {0}")]
    Harness(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FractalEvoError>;
