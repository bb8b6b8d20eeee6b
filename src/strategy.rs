//! Bidding strategy: budget pacing and contextual bid adjustment.
//!
//! Both are pure functions of their inputs. The caller owns the BudgetState and decides
//! how it changes between calls; nothing here remembers previous bids or spend.

use crate::config::StrategyParams;
use crate::errors::{ExchangeError, Result};
use crate::requests::BidRequest;
use crate::utils::{round2, round2_not_above};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SIGNAL_RETURNING_USER: &str = "returning_user";
pub const SIGNAL_HIGH_VALUE_SEGMENT: &str = "high_value_segment";

/// Named contextual flags, e.g. {"returning_user": true}
pub type Signals = BTreeMap<String, Value>;

/// Remaining budget and impression target of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub remaining_budget: f64,
    pub remaining_impressions: u64,
}

impl BudgetState {
    pub fn new(remaining_budget: f64, remaining_impressions: u64) -> Self {
        Self { remaining_budget, remaining_impressions }
    }

    /// Book a won impression at `price`
    ///
    /// A price above the remaining budget, or a win with no impressions left, is
    /// InvalidBudget and leaves the state untouched.
    pub fn record_win(&mut self, price: f64) -> Result<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(ExchangeError::InvalidBid(format!("won price must be a non-negative number, got {}", price)));
        }
        if price > self.remaining_budget + 1e-9 {
            return Err(ExchangeError::InvalidBudget(format!(
                "won price {:.2} exceeds remaining budget {:.2}", price, self.remaining_budget)));
        }
        if self.remaining_impressions == 0 {
            return Err(ExchangeError::InvalidBudget("win booked with no impressions left".to_string()));
        }
        self.remaining_budget = round2((self.remaining_budget - price).max(0.0));
        self.remaining_impressions -= 1;
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_impressions == 0 || self.remaining_budget <= 0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BiddingStrategy {
    pub params: StrategyParams,
}

impl BiddingStrategy {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// Even pacing capped at `pacing_over_floor` times the floor
    ///
    /// Returns exactly 0.0 ("do not participate") when no impressions remain.
    /// The result is rounded to cents but never above either cap.
    pub fn compute_pacing_bid(&self, request: &BidRequest, budget: f64, target_impressions: u64) -> Result<f64> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(ExchangeError::InvalidBudget(format!("budget must be a non-negative number, got {}", budget)));
        }
        if target_impressions == 0 {
            return Ok(0.0);
        }
        let max_affordable_bid = budget / target_impressions as f64;
        let floor_cap = request.floor_price() * self.params.pacing_over_floor;
        Ok(round2_not_above(max_affordable_bid.min(floor_cap)))
    }

    /// Multiply the base bid by the factor of every set signal
    /// Returning user is applied first, then high value segment
    pub fn adjust_bid(&self, base_bid: f64, signals: &Signals) -> Result<f64> {
        if !base_bid.is_finite() || base_bid < 0.0 {
            return Err(ExchangeError::InvalidBid(format!("base bid must be a non-negative number, got {}", base_bid)));
        }
        let mut bid = base_bid;
        if signal_is_set(signals, SIGNAL_RETURNING_USER)? {
            bid *= self.params.returning_user_multiplier;
        }
        if signal_is_set(signals, SIGNAL_HIGH_VALUE_SEGMENT)? {
            bid *= self.params.high_value_segment_multiplier;
        }
        // Unknown flags are ignored, but still have to be well formed
        for (name, value) in signals {
            signal_value(name, value)?;
        }
        Ok(round2(bid))
    }

    /// Pacing bid for the current budget, then adjusted by the signals
    /// The adjusted bid is capped at the remaining budget
    pub fn pacing_then_adjust(&self, request: &BidRequest, budget: &BudgetState, signals: &Signals) -> Result<f64> {
        let base_bid = self.compute_pacing_bid(request, budget.remaining_budget, budget.remaining_impressions)?;
        let adjusted = self.adjust_bid(base_bid, signals)?;
        Ok(round2_not_above(adjusted.min(budget.remaining_budget)))
    }
}

fn signal_value(name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Null => Ok(false),
        other => Err(ExchangeError::InvalidSignal {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

fn signal_is_set(signals: &Signals, name: &str) -> Result<bool> {
    match signals.get(name) {
        Some(value) => signal_value(name, value),
        None => Ok(false),
    }
}

/// `BiddingStrategy::compute_pacing_bid` with the default multipliers
pub fn compute_pacing_bid(request: &BidRequest, budget: f64, target_impressions: u64) -> Result<f64> {
    BiddingStrategy::default().compute_pacing_bid(request, budget, target_impressions)
}

/// `BiddingStrategy::adjust_bid` with the default multipliers
pub fn adjust_bid(base_bid: f64, signals: &Signals) -> Result<f64> {
    BiddingStrategy::default().adjust_bid(base_bid, signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestTemplate;
    use serde_json::json;

    fn request_with_floor(floor_price: f64) -> BidRequest {
        let template = RequestTemplate {
            floor_price,
            ..RequestTemplate::default()
        };
        BidRequest::new("bid-1000".to_string(), &template)
    }

    fn signals(pairs: &[(&str, Value)]) -> Signals {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_pacing_reference_bid() {
        // budget 100 over 1000 impressions = 0.1, floor cap 0.011 -> 0.01
        let bid = compute_pacing_bid(&request_with_floor(0.01), 100.0, 1000).unwrap();
        assert_eq!(bid, 0.01);
    }

    #[test]
    fn test_pacing_zero_target_is_zero() {
        for budget in [0.0, 1.0, 100.0, 1e9] {
            assert_eq!(compute_pacing_bid(&request_with_floor(0.5), budget, 0).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_pacing_budget_cap_binds() {
        let bid = compute_pacing_bid(&request_with_floor(1.0), 10.0, 1000).unwrap();
        assert_eq!(bid, 0.01);
        let bid = compute_pacing_bid(&request_with_floor(1.0), 1000.0, 1000).unwrap();
        assert_eq!(bid, 1.0);
    }

    #[test]
    fn test_pacing_floor_cap_binds() {
        let bid = compute_pacing_bid(&request_with_floor(0.5), 1000.0, 1).unwrap();
        assert_eq!(bid, 0.55);
    }

    #[test]
    fn test_pacing_never_exceeds_either_cap() {
        for floor in [0.01, 0.013, 0.25, 0.5, 1.37, 3.0] {
            for budget in [0.0, 0.05, 1.0, 7.77, 100.0, 12345.6] {
                for target in [1u64, 3, 7, 10, 999, 1000] {
                    let bid = compute_pacing_bid(&request_with_floor(floor), budget, target).unwrap();
                    assert!(bid <= 1.1 * floor, "bid {} above floor cap for floor {}", bid, floor);
                    assert!(bid <= budget / target as f64, "bid {} above pacing cap {}/{}", bid, budget, target);
                    assert!(bid >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_pacing_rejects_negative_budget() {
        assert!(matches!(compute_pacing_bid(&request_with_floor(0.01), -1.0, 10), Err(ExchangeError::InvalidBudget(_))));
        assert!(matches!(compute_pacing_bid(&request_with_floor(0.01), f64::NAN, 10), Err(ExchangeError::InvalidBudget(_))));
    }

    #[test]
    fn test_adjust_bid_examples() {
        let both = signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(true))]);
        assert_eq!(adjust_bid(1.0, &both).unwrap(), 1.8);
        assert_eq!(adjust_bid(1.0, &Signals::new()).unwrap(), 1.0);

        let returning = signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(false))]);
        assert_eq!(adjust_bid(1.0, &returning).unwrap(), 1.2);
    }

    #[test]
    fn test_adjust_bid_ignores_unknown_and_null() {
        let extra = signals(&[("loyal_customer", json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, Value::Null)]);
        assert_eq!(adjust_bid(2.0, &extra).unwrap(), 2.0);
    }

    #[test]
    fn test_adjust_bid_rejects_non_boolean() {
        let bad = signals(&[(SIGNAL_RETURNING_USER, json!("yes"))]);
        assert!(matches!(adjust_bid(1.0, &bad), Err(ExchangeError::InvalidSignal { .. })));
        let bad_unknown = signals(&[("segment_id", json!(42))]);
        assert!(matches!(adjust_bid(1.0, &bad_unknown), Err(ExchangeError::InvalidSignal { .. })));
    }

    #[test]
    fn test_adjust_bid_monotone_in_true_signals() {
        for base in [0.0, 0.01, 0.37, 1.0, 2.5] {
            let none = adjust_bid(base, &Signals::new()).unwrap();
            let one_a = adjust_bid(base, &signals(&[(SIGNAL_RETURNING_USER, json!(true))])).unwrap();
            let one_b = adjust_bid(base, &signals(&[(SIGNAL_HIGH_VALUE_SEGMENT, json!(true))])).unwrap();
            let two = adjust_bid(base, &signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(true))])).unwrap();
            assert!(none <= one_a && none <= one_b);
            assert!(one_a <= two && one_b <= two);
        }
    }

    #[test]
    fn test_adjust_bid_rejects_invalid_base() {
        for base in [-1.0, -0.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(adjust_bid(base, &Signals::new()), Err(ExchangeError::InvalidBid(_))), "base {} accepted", base);
        }
        assert_eq!(adjust_bid(0.0, &Signals::new()).unwrap(), 0.0);
    }

    #[test]
    fn test_configured_multipliers() {
        let strategy = BiddingStrategy::new(StrategyParams {
            pacing_over_floor: 2.0,
            returning_user_multiplier: 1.1,
            high_value_segment_multiplier: 1.3,
        });
        assert_eq!(strategy.compute_pacing_bid(&request_with_floor(0.5), 1000.0, 1).unwrap(), 1.0);
        assert_eq!(strategy.compute_pacing_bid(&request_with_floor(0.5), 0.6, 1).unwrap(), 0.6);

        let both = signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(true))]);
        assert_eq!(strategy.adjust_bid(1.0, &both).unwrap(), 1.43);
        let returning = signals(&[(SIGNAL_RETURNING_USER, json!(true))]);
        assert_eq!(strategy.adjust_bid(1.0, &returning).unwrap(), 1.1);
    }

    #[test]
    fn test_adjusted_bid_capped_at_remaining_budget() {
        let strategy = BiddingStrategy::default();
        let both = signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(true))]);
        // Paced at 0.30, adjusted to 0.54, only 0.30 left to spend
        let bid = strategy.pacing_then_adjust(&request_with_floor(0.5), &BudgetState::new(0.3, 1), &both).unwrap();
        assert_eq!(bid, 0.3);
        // Enough budget: the adjustment goes through
        let bid = strategy.pacing_then_adjust(&request_with_floor(0.5), &BudgetState::new(0.6, 2), &both).unwrap();
        assert_eq!(bid, 0.54);
    }

    #[test]
    fn test_pacing_then_adjust() {
        let strategy = BiddingStrategy::default();
        let budget = BudgetState::new(1000.0, 1);
        let both = signals(&[(SIGNAL_RETURNING_USER, json!(true)), (SIGNAL_HIGH_VALUE_SEGMENT, json!(true))]);
        // 0.55 * 1.8 = 0.99
        assert_eq!(strategy.pacing_then_adjust(&request_with_floor(0.5), &budget, &both).unwrap(), 0.99);
    }

    #[test]
    fn test_budget_record_win() {
        let mut budget = BudgetState::new(1.0, 2);
        budget.record_win(0.4).unwrap();
        assert_eq!(budget, BudgetState::new(0.6, 1));
        budget.record_win(0.6).unwrap();
        assert_eq!(budget, BudgetState::new(0.0, 0));
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_budget_overspend_is_rejected() {
        let mut budget = BudgetState::new(0.3, 1);
        assert!(matches!(budget.record_win(0.54), Err(ExchangeError::InvalidBudget(_))));
        assert_eq!(budget, BudgetState::new(0.3, 1));

        let mut spent = BudgetState::new(5.0, 0);
        assert!(matches!(spent.record_win(0.1), Err(ExchangeError::InvalidBudget(_))));
        assert!(matches!(budget.record_win(-0.1), Err(ExchangeError::InvalidBid(_))));
    }
}
