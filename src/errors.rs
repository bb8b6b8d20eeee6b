use thiserror::Error;

/// Errors surfaced by the exchange core
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Invalid auction configuration: {0}")]
    InvalidAuctionConfiguration(String),

    #[error("Not enough data: {0}")]
    NotEnoughData(String),

    #[error("Invalid signal '{name}': expected a boolean, got {value}")]
    InvalidSignal { name: String, value: String },

    #[error("Invalid bid: {0}")]
    InvalidBid(String),

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
