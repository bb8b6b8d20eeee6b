//! The reference exchange day.
//!
//! - 100 auctions among 3 random bidders, summarized
//!
//! - A pacing bid for a campaign with budget 100 and 1000 impressions to go
//!
//! - A bid adjusted for a returning user
//!
//! - A daily report over 1000 auctions

use advantagex::config::ExchangeConfig;
use advantagex::logger::{LogEvent, Logger};
use advantagex::logln;
use advantagex::reports::daily_report_today;
use advantagex::simulationrun::{Exchange, SimulationRun};
use advantagex::strategy::{BiddingStrategy, Signals, SIGNAL_HIGH_VALUE_SEGMENT, SIGNAL_RETURNING_USER};
use advantagex::utils::{get_seed, round2};
use rand::{rngs::StdRng, SeedableRng};
use crate::scenarios::{check, finish};

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "reference",
    run,
});

const DAILY_AUCTIONS: usize = 1000;

pub fn run(scenario_name: &str, config: &ExchangeConfig, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let exchange = Exchange::from_config(config)?;
    exchange.printout(logger);
    let mut rng = StdRng::seed_from_u64(get_seed(1991));

    // Simulation summary
    let simulation_run = SimulationRun::new(&exchange, config.auctions_per_run, &mut rng, logger)?;
    simulation_run.summary.printout(logger);
    logln!(logger, LogEvent::Report, "{}", serde_json::to_string_pretty(&simulation_run.summary)?);

    // Pacing and adjustment on a fresh request
    let strategy = BiddingStrategy::new(config.strategy);
    let test_request = exchange.request_generator.generate_request(&mut rng);
    let test_bid = strategy.compute_pacing_bid(&test_request, 100.0, 1000)?;
    logln!(logger, LogEvent::Report, "\nTest bid: ${}", test_bid);

    let mut user_data = Signals::new();
    user_data.insert(SIGNAL_RETURNING_USER.to_string(), true.into());
    user_data.insert(SIGNAL_HIGH_VALUE_SEGMENT.to_string(), false.into());
    let adjusted_bid = strategy.adjust_bid(1.0, &user_data)?;
    logln!(logger, LogEvent::Report, "Adjusted bid: ${}", adjusted_bid);

    // Daily report
    let daily_run = SimulationRun::new(&exchange, DAILY_AUCTIONS, &mut rng, logger)?;
    let report = daily_report_today(&daily_run.winning_bids, &exchange.exchange_name);
    report.printout(logger);
    logln!(logger, LogEvent::Report, "{}", serde_json::to_string_pretty(&report)?);

    logln!(logger, LogEvent::Scenario, "");
    let mut errors: Vec<String> = Vec::new();
    let summary = &simulation_run.summary;

    check(logger, &mut errors,
        summary.total_auctions == config.auctions_per_run,
        format!("Every auction produced a winner: {} of {}", summary.total_auctions, config.auctions_per_run));

    if let (Some(lowest), Some(average), Some(highest)) = (summary.lowest_bid, summary.average_bid, summary.highest_bid) {
        check(logger, &mut errors,
            lowest <= average && average <= highest,
            format!("Average bid lies between lowest and highest: {:.2} <= {:.2} <= {:.2}", lowest, average, highest));
        check(logger, &mut errors,
            lowest >= config.bid_price_range.min && highest <= config.bid_price_range.max,
            format!("Winning bids stay within the bidder price range [{:.2}, {:.2}]: [{:.2}, {:.2}]",
                config.bid_price_range.min, config.bid_price_range.max, lowest, highest));
    }

    let floor_cap = test_request.floor_price() * config.strategy.pacing_over_floor;
    check(logger, &mut errors,
        test_bid <= floor_cap && test_bid <= 100.0 / 1000.0,
        format!("Pacing bid respects both caps: {:.2} <= min({:.4}, {:.4})", test_bid, floor_cap, 100.0 / 1000.0));

    let expected_adjusted = round2(config.strategy.returning_user_multiplier);
    check(logger, &mut errors,
        adjusted_bid == expected_adjusted,
        format!("Returning user adjustment: {:.2} == {:.2}", adjusted_bid, expected_adjusted));

    check(logger, &mut errors,
        report.total_impressions == DAILY_AUCTIONS,
        format!("Daily report counts every impression: {} == {}", report.total_impressions, DAILY_AUCTIONS));

    if let Some(cpm) = report.average_cpm {
        let implied_cpm = report.total_spend / report.total_impressions as f64 * 1000.0;
        check(logger, &mut errors,
            (cpm - implied_cpm).abs() < 0.01,
            format!("Average CPM matches spend per thousand impressions: {:.2} ~ {:.2}", cpm, implied_cpm));
    }

    finish(scenario_name, errors)
}
