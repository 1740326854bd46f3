use orfi_config::ConfigError;
use orfi_core::CoreError;
use thiserror::Error;

/// Error type shared by everything outside the engine crates.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid amount `{0}`")]
    InvalidAmount(String),
}
