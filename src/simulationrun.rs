//! This file contains the Exchange (request generator + bidder pool + auction settings)
//! and SimulationRun, which drives a batch of auctions and collects the winning bids.
//!
//! Auctions run one after another with a single random source, so a given seed always
//! reproduces the same run.

use crate::auction::{run_auction, AuctionResult};
use crate::bidders::{Bid, BidderPool};
use crate::config::ExchangeConfig;
use crate::errors::Result;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::reports::{summarize, AuctionSummary};
use crate::requests::RequestGenerator;
use crate::utils::{get_seed, TOTAL_SIMULATION_RUNS};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::Ordering;

/// Everything needed to run auctions: where requests come from, who bids, how many bid
pub struct Exchange {
    pub exchange_name: String,
    pub request_generator: RequestGenerator,
    pub bidder_pool: BidderPool,
    pub bidders_per_auction: usize,
}

impl Exchange {
    /// Exchange with `bidders_per_auction` random bidders, as configured
    /// The config is validated first, so one built in code fails the same way a bad file does
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            exchange_name: config.exchange_name.clone(),
            request_generator: RequestGenerator::new(config.request.clone()),
            bidder_pool: BidderPool::uniform(config.bidders_per_auction, config.bid_price_range)?,
            bidders_per_auction: config.bidders_per_auction,
        })
    }

    /// Exchange with a custom pool; every bidder in it is solicited
    pub fn with_pool(config: &ExchangeConfig, bidder_pool: BidderPool) -> Result<Self> {
        config.validate()?;
        let bidders_per_auction = bidder_pool.len();
        Ok(Self {
            exchange_name: config.exchange_name.clone(),
            request_generator: RequestGenerator::new(config.request.clone()),
            bidder_pool,
            bidders_per_auction,
        })
    }

    pub fn printout(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Simulation, "Initialized exchange {}", self.exchange_name);
        logln!(logger, LogEvent::Simulation, "Initialized {} bidders ({} solicited per auction)", self.bidder_pool.len(), self.bidders_per_auction);
        let template = self.request_generator.template();
        logln!(logger, LogEvent::Simulation, "Impression {}x{}, floor {:.2}", template.width, template.height, template.floor_price);
    }
}

/// Results of one batch of auctions, in the order they ran
pub struct SimulationRun {
    pub results: Vec<AuctionResult>,
    /// Winning bids only; auctions without demand are skipped
    pub winning_bids: Vec<Bid>,
    pub summary: AuctionSummary,
}

impl SimulationRun {
    /// Run `num_auctions` auctions on the exchange
    pub fn new(exchange: &Exchange, num_auctions: usize, rng: &mut StdRng, logger: &mut Logger) -> Result<Self> {
        let mut results = Vec::with_capacity(num_auctions);
        let mut winning_bids = Vec::with_capacity(num_auctions);

        for _ in 0..num_auctions {
            let request = exchange.request_generator.generate_request(rng);
            let result = run_auction(&request, &exchange.bidder_pool, exchange.bidders_per_auction, rng, logger)?;
            if let Some(bid) = result.winning_bid() {
                winning_bids.push(bid.clone());
            }
            results.push(result);
        }

        let no_demand = results.len() - winning_bids.len();
        logln!(logger, LogEvent::Simulation, "Ran {} auctions: {} sold, {} without demand", results.len(), winning_bids.len(), no_demand);
        TOTAL_SIMULATION_RUNS.fetch_add(1, Ordering::Relaxed);

        let summary = summarize(&winning_bids);
        Ok(Self { results, winning_bids, summary })
    }
}

/// Run `num_auctions` reference auctions (default config, seed from RAND_SEED)
pub fn run_simulation(num_auctions: usize) -> Result<SimulationRun> {
    let config = ExchangeConfig::default();
    let exchange = Exchange::from_config(&config)?;
    let mut rng = StdRng::seed_from_u64(get_seed(1991));
    let mut logger = Logger::new();
    SimulationRun::new(&exchange, num_auctions, &mut rng, &mut logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidders::{BidderStrategic, BidderRandom};
    use crate::config::PriceRange;
    use crate::errors::ExchangeError;
    use crate::strategy::{BiddingStrategy, BudgetState};

    #[test]
    fn test_zero_auctions() {
        let run = run_simulation(0).unwrap();
        assert!(run.results.is_empty());
        assert!(run.winning_bids.is_empty());
        assert_eq!(run.summary, AuctionSummary::empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ExchangeConfig::default();
        config.bid_price_range = PriceRange { min: 3.0, max: 2.0 };
        assert!(matches!(Exchange::from_config(&config), Err(ExchangeError::InvalidConfig(_))));

        let mut config = ExchangeConfig::default();
        config.bidders_per_auction = 0;
        assert!(matches!(Exchange::from_config(&config), Err(ExchangeError::InvalidConfig(_))));

        let mut config = ExchangeConfig::default();
        config.request.floor_price = -0.5;
        assert!(matches!(Exchange::with_pool(&config, BidderPool::new()), Err(ExchangeError::InvalidConfig(_))));
    }

    #[test]
    fn test_reference_run() {
        let config = ExchangeConfig::default();
        let exchange = Exchange::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&exchange, config.auctions_per_run, &mut rng, &mut logger).unwrap();

        assert_eq!(run.results.len(), 100);
        assert_eq!(run.winning_bids.len(), 100);
        assert_eq!(run.summary.total_auctions, 100);
        for (result, bid) in run.results.iter().zip(&run.winning_bids) {
            assert_eq!(result.winning_bid(), Some(bid));
        }
        let highest = run.summary.highest_bid.unwrap();
        let lowest = run.summary.lowest_bid.unwrap();
        let average = run.summary.average_bid.unwrap();
        assert!(lowest >= 0.1 && highest <= 2.0);
        assert!(lowest <= average && average <= highest);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = ExchangeConfig::default();
        let exchange = Exchange::from_config(&config).unwrap();
        let mut logger = Logger::new();
        let a = SimulationRun::new(&exchange, 25, &mut StdRng::seed_from_u64(7), &mut logger).unwrap();
        let b = SimulationRun::new(&exchange, 25, &mut StdRng::seed_from_u64(7), &mut logger).unwrap();
        assert_eq!(a.winning_bids, b.winning_bids);
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_no_demand_auctions_are_skipped() {
        let config = ExchangeConfig::default();
        let mut pool = BidderPool::new();
        // Zero impressions left: never bids
        pool.add(Box::new(BidderStrategic::new("Done".to_string(), BiddingStrategy::default(), BudgetState::new(10.0, 0))));
        let exchange = Exchange::with_pool(&config, pool).unwrap();
        let mut logger = Logger::new();
        let run = SimulationRun::new(&exchange, 10, &mut StdRng::seed_from_u64(3), &mut logger).unwrap();
        assert_eq!(run.results.len(), 10);
        assert!(run.winning_bids.is_empty());
        assert!(!run.summary.has_data());
    }

    #[test]
    fn test_mixed_pool() {
        let config = ExchangeConfig::default();
        let mut pool = BidderPool::new();
        pool.add(Box::new(BidderRandom::new("Random".to_string(), config.bid_price_range).unwrap()));
        pool.add(Box::new(BidderStrategic::new("Paced".to_string(), BiddingStrategy::default(), BudgetState::new(100.0, 1000))));
        let exchange = Exchange::with_pool(&config, pool).unwrap();
        assert_eq!(exchange.bidders_per_auction, 2);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&exchange, 20, &mut StdRng::seed_from_u64(8), &mut logger).unwrap();
        // The paced bidder offers 0.01, the random bidder always at least 0.1
        assert!(run.winning_bids.iter().all(|bid| bid.price >= 0.1));
    }
}
