//! Aggregated statistics over batches of winning bids
//!
//! Monetary amounts are rounded to cents, CPM is left unrounded.
//! Values that need at least one bid (averages, extremes, CPM) are None for an empty batch.

use crate::bidders::Bid;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::utils::round2;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub total_auctions: usize,
    pub total_value: f64,
    pub average_bid: Option<f64>,
    pub highest_bid: Option<f64>,
    pub lowest_bid: Option<f64>,
}

impl AuctionSummary {
    /// Summary of zero auctions
    pub fn empty() -> Self {
        Self {
            total_auctions: 0,
            total_value: 0.0,
            average_bid: None,
            highest_bid: None,
            lowest_bid: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.total_auctions > 0
    }

    pub fn printout(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Report, "\n=== Auction Summary ===");
        logln!(logger, LogEvent::Report, "Total auctions: {}", self.total_auctions);
        logln!(logger, LogEvent::Report, "Total value: {:.2}", self.total_value);
        logln!(logger, LogEvent::Report, "Bid (average/highest/lowest): {} / {} / {}",
            format_optional(self.average_bid),
            format_optional(self.highest_bid),
            format_optional(self.lowest_bid));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub exchange_name: String,
    /// Serialized as YYYY-MM-DD
    pub date: NaiveDate,
    pub total_impressions: usize,
    pub total_spend: f64,
    /// Cost per thousand impressions, unrounded
    pub average_cpm: Option<f64>,
}

impl DailyReport {
    pub fn printout(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Report, "\n=== Daily Report from {} ({}) ===", self.exchange_name, self.date.format("%Y-%m-%d"));
        logln!(logger, LogEvent::Report, "Total impressions: {}", self.total_impressions);
        logln!(logger, LogEvent::Report, "Total spend: {:.2}", self.total_spend);
        logln!(logger, LogEvent::Report, "Average CPM: {}", format_optional(self.average_cpm));
    }
}

fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "no data".to_string(),
    }
}

/// First bid holding the highest price
pub fn highest_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().fold(None, |best: Option<&Bid>, bid| match best {
        Some(current) if bid.price <= current.price => Some(current),
        _ => Some(bid),
    })
}

/// First bid holding the lowest price
pub fn lowest_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().fold(None, |best: Option<&Bid>, bid| match best {
        Some(current) if bid.price >= current.price => Some(current),
        _ => Some(bid),
    })
}

fn total_price(bids: &[Bid]) -> f64 {
    bids.iter().map(|bid| bid.price).sum()
}

pub fn summarize(bids: &[Bid]) -> AuctionSummary {
    if bids.is_empty() {
        return AuctionSummary::empty();
    }
    let total_value = total_price(bids);
    AuctionSummary {
        total_auctions: bids.len(),
        total_value: round2(total_value),
        average_bid: Some(round2(total_value / bids.len() as f64)),
        highest_bid: highest_bid(bids).map(|bid| bid.price),
        lowest_bid: lowest_bid(bids).map(|bid| bid.price),
    }
}

pub fn daily_report(bids: &[Bid], exchange_name: &str, date: NaiveDate) -> DailyReport {
    let total_spend = total_price(bids);
    let average_cpm = if bids.is_empty() {
        None
    } else {
        Some(total_spend / bids.len() as f64 * 1000.0)
    };
    DailyReport {
        exchange_name: exchange_name.to_string(),
        date,
        total_impressions: bids.len(),
        total_spend: round2(total_spend),
        average_cpm,
    }
}

/// Daily report stamped with today's local date
pub fn daily_report_today(bids: &[Bid], exchange_name: &str) -> DailyReport {
    daily_report(bids, exchange_name, chrono::Local::now().date_naive())
}
