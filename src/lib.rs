//! AdVantageX: a real-time-bidding auction exchange simulator.
//!
//! Requests are generated, offered to a pool of bidders, settled by a first-price
//! auction and the winning bids are aggregated into summaries and daily reports.

pub mod utils;
pub mod errors;
pub mod logger;
pub mod config;
pub mod requests;
pub mod strategy;
pub mod bidders;
pub mod auction;
pub mod simulationrun;
pub mod reports;

pub use auction::{run_auction, AuctionResult, Winner};
pub use bidders::{Bid, BidResponse, BidderPool, BidderRandom, BidderStrategic, BidderTrait};
pub use config::ExchangeConfig;
pub use errors::{ExchangeError, Result};
pub use reports::{daily_report, summarize, AuctionSummary, DailyReport};
pub use requests::{BidRequest, RequestGenerator};
pub use simulationrun::{run_simulation, Exchange, SimulationRun};
pub use strategy::{adjust_bid, compute_pacing_bid, BiddingStrategy, BudgetState, Signals};
