use thiserror::Error;

/// Errors raised at the edges of the store (configuration and lifecycle).
///
/// Data operations (`get`, `set`, `clear`) never fail.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Context store has been destroyed")]
    Destroyed,

    #[error("No tokio runtime available to run the sweeper")]
    NoRuntime,
}
