//! Exchange configuration
//!
//! Everything the simulator would otherwise hard-code lives here. All fields
//! have defaults matching the reference scenario, so `{}` is a valid config file.

use crate::errors::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Label stamped on daily reports
    #[serde(default = "default_exchange_name")]
    pub exchange_name: String,

    /// Bids solicited per auction
    #[serde(default = "default_bidders_per_auction")]
    pub bidders_per_auction: usize,

    /// Auctions per simulation run
    #[serde(default = "default_auctions_per_run")]
    pub auctions_per_run: usize,

    #[serde(default)]
    pub request: RequestTemplate,

    /// Price range of the default random bidder
    #[serde(default)]
    pub bid_price_range: PriceRange,

    #[serde(default)]
    pub strategy: StrategyParams,
}

fn default_exchange_name() -> String {
    "AdVantageX".to_string()
}

fn default_bidders_per_auction() -> usize {
    3
}

fn default_auctions_per_run() -> usize {
    100
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            exchange_name: default_exchange_name(),
            bidders_per_auction: default_bidders_per_auction(),
            auctions_per_run: default_auctions_per_run(),
            request: RequestTemplate::default(),
            bid_price_range: PriceRange::default(),
            strategy: StrategyParams::default(),
        }
    }
}

impl ExchangeConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bidders_per_auction < 1 {
            return Err(ExchangeError::InvalidConfig("bidders_per_auction must be at least 1".to_string()));
        }
        self.request.validate()?;
        self.bid_price_range.validate()?;
        self.strategy.validate()
    }
}

/// Shape of the synthetic bid requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTemplate {
    pub width: u32,
    pub height: u32,
    pub position: u32,
    pub floor_price: f64,
    pub site_id: String,
    pub site_domain: String,
    pub device_ua: String,
    pub device_ip: String,
    pub user_id: String,
    /// Probability a request carries `returning_user = true`
    pub returning_user_rate: f64,
    /// Probability a request carries `high_value_segment = true`
    pub high_value_segment_rate: f64,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self {
            width: 300,
            height: 250,
            position: 1,
            floor_price: 0.01,
            site_id: "site-123".to_string(),
            site_domain: "example.com".to_string(),
            device_ua: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            device_ip: "192.168.1.1".to_string(),
            user_id: "user-abc".to_string(),
            returning_user_rate: 0.0,
            high_value_segment_rate: 0.0,
        }
    }
}

impl RequestTemplate {
    fn validate(&self) -> Result<()> {
        if !self.floor_price.is_finite() || self.floor_price < 0.0 {
            return Err(ExchangeError::InvalidConfig(format!("floor_price must be >= 0, got {}", self.floor_price)));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ExchangeError::InvalidConfig(format!("impression size {}x{} is empty", self.width, self.height)));
        }
        for (name, rate) in [("returning_user_rate", self.returning_user_rate), ("high_value_segment_rate", self.high_value_segment_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ExchangeError::InvalidConfig(format!("{} must be within [0, 1], got {}", name, rate)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 0.1, max: 2.0 }
    }
}

impl PriceRange {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 || self.min > self.max {
            return Err(ExchangeError::InvalidConfig(format!("bid price range [{}, {}] is invalid", self.min, self.max)));
        }
        Ok(())
    }
}

/// Multipliers used by the bidding strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Pacing never bids more than this times the floor
    pub pacing_over_floor: f64,
    pub returning_user_multiplier: f64,
    pub high_value_segment_multiplier: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            pacing_over_floor: 1.1,
            returning_user_multiplier: 1.2,
            high_value_segment_multiplier: 1.5,
        }
    }
}

impl StrategyParams {
    fn validate(&self) -> Result<()> {
        if !self.pacing_over_floor.is_finite() || self.pacing_over_floor <= 0.0 {
            return Err(ExchangeError::InvalidConfig(format!("pacing_over_floor must be > 0, got {}", self.pacing_over_floor)));
        }
        for (name, value) in [
            ("returning_user_multiplier", self.returning_user_multiplier),
            ("high_value_segment_multiplier", self.high_value_segment_multiplier),
        ] {
            // Adjustment stays monotone in the number of set signals
            if !value.is_finite() || value < 1.0 {
                return Err(ExchangeError::InvalidConfig(format!("{} must be >= 1.0, got {}", name, value)));
            }
        }
        Ok(())
    }
}
