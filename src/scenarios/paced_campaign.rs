//! A paced campaign competing against two random bidders on a 0.50 floor.
//!
//! The campaign starts with a budget of 40 for 100 impressions. After every auction the
//! scenario (the campaign owner) books the win against the budget and hands the bidder
//! the new budget snapshot.
//!
//! - Variant A: requests carry no user signals, the campaign bids its pacing price
//!
//! - Variant B: half of the users are returning and 30% are in the high value segment,
//!   the campaign raises its bid accordingly

use advantagex::bidders::{BidderPool, BidderRandom, BidderStrategic};
use advantagex::config::{ExchangeConfig, PriceRange};
use advantagex::logger::{LogEvent, Logger};
use advantagex::logln;
use advantagex::reports::{summarize, AuctionSummary};
use advantagex::run_auction;
use advantagex::simulationrun::Exchange;
use advantagex::strategy::{BiddingStrategy, BudgetState};
use advantagex::utils::get_seed;
use rand::{rngs::StdRng, SeedableRng};
use crate::scenarios::{check, finish};

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "paced_campaign",
    run,
});

const AUCTIONS: usize = 200;
const CAMPAIGN_BUDGET: f64 = 40.0;
const CAMPAIGN_IMPRESSIONS: u64 = 100;
const CAMPAIGN_BIDDER_ID: usize = 0;

struct VariantOutcome {
    summary: AuctionSummary,
    budget: BudgetState,
}

fn prepare_config(config: &ExchangeConfig, with_signals: bool) -> ExchangeConfig {
    let mut config = config.clone();
    config.request.floor_price = 0.5;
    config.bid_price_range = PriceRange { min: 0.1, max: 1.0 };
    if with_signals {
        config.request.returning_user_rate = 0.5;
        config.request.high_value_segment_rate = 0.3;
    } else {
        config.request.returning_user_rate = 0.0;
        config.request.high_value_segment_rate = 0.0;
    }
    config
}

fn run_variant(variant_name: &str, config: &ExchangeConfig, logger: &mut Logger) -> Result<VariantOutcome, Box<dyn std::error::Error>> {
    logln!(logger, LogEvent::Scenario, "\n{}", variant_name);

    let strategy = BiddingStrategy::new(config.strategy);
    let mut budget = BudgetState::new(CAMPAIGN_BUDGET, CAMPAIGN_IMPRESSIONS);

    let mut pool = BidderPool::new();
    pool.add(Box::new(BidderStrategic::new("Paced campaign".to_string(), strategy, budget)));
    pool.add(Box::new(BidderRandom::new("Random 1".to_string(), config.bid_price_range)?));
    pool.add(Box::new(BidderRandom::new("Random 2".to_string(), config.bid_price_range)?));
    let mut exchange = Exchange::with_pool(config, pool)?;
    exchange.printout(logger);

    let mut rng = StdRng::seed_from_u64(get_seed(2992));
    let mut campaign_wins = Vec::new();
    for _ in 0..AUCTIONS {
        let request = exchange.request_generator.generate_request(&mut rng);
        let result = run_auction(&request, &exchange.bidder_pool, exchange.bidders_per_auction, &mut rng, logger)?;
        if result.winning_bidder() != Some(CAMPAIGN_BIDDER_ID) {
            continue;
        }
        if let Some(bid) = result.winning_bid() {
            budget.record_win(bid.price)?;
            campaign_wins.push(bid.clone());
            let updated = BidderStrategic::new("Paced campaign".to_string(), strategy, budget);
            exchange.bidder_pool.replace(CAMPAIGN_BIDDER_ID, Box::new(updated));
        }
    }

    let summary = summarize(&campaign_wins);
    summary.printout(logger);
    logln!(logger, LogEvent::Scenario, "Campaign won {} impressions, remaining budget {:.2} for {} impressions",
        summary.total_auctions, budget.remaining_budget, budget.remaining_impressions);
    Ok(VariantOutcome { summary, budget })
}

pub fn run(scenario_name: &str, config: &ExchangeConfig, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let config_a = prepare_config(config, false);
    let outcome_a = run_variant("Variant A: pacing only", &config_a, logger)?;

    let config_b = prepare_config(config, true);
    let outcome_b = run_variant("Variant B: pacing with user signal adjustment", &config_b, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    let mut errors: Vec<String> = Vec::new();

    for (name, config, outcome) in [("A", &config_a, &outcome_a), ("B", &config_b, &outcome_b)] {
        let spent = outcome.summary.total_value;
        check(logger, &mut errors,
            spent <= CAMPAIGN_BUDGET + 1e-9,
            format!("Variant {} spend stays within budget: {:.2} <= {:.2}", name, spent, CAMPAIGN_BUDGET));
        check(logger, &mut errors,
            outcome.summary.total_auctions as u64 + outcome.budget.remaining_impressions == CAMPAIGN_IMPRESSIONS,
            format!("Variant {} wins and remaining impressions add up to the target: {} + {} == {}",
                name, outcome.summary.total_auctions, outcome.budget.remaining_impressions, CAMPAIGN_IMPRESSIONS));

        let strategy = &config.strategy;
        let max_price = config.request.floor_price * strategy.pacing_over_floor
            * strategy.returning_user_multiplier * strategy.high_value_segment_multiplier;
        let highest = outcome.summary.highest_bid.unwrap_or(0.0);
        check(logger, &mut errors,
            highest <= max_price + 0.005,
            format!("Variant {} never pays above the fully adjusted floor cap: {:.2} <= {:.2}", name, highest, max_price));
    }

    check(logger, &mut errors,
        outcome_b.summary.total_auctions > outcome_a.summary.total_auctions,
        format!("Variant B (signals) wins more impressions than Variant A (pacing only): {} > {}",
            outcome_b.summary.total_auctions, outcome_a.summary.total_auctions));

    let average_a = outcome_a.summary.average_bid.unwrap_or(0.0);
    let average_b = outcome_b.summary.average_bid.unwrap_or(0.0);
    check(logger, &mut errors,
        average_b > average_a,
        format!("Variant B pays a higher average price than Variant A: {:.2} > {:.2}", average_b, average_a));

    finish(scenario_name, errors)
}
