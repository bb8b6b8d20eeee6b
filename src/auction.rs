//! First-price auction over a pool of bidders
//!
//! Bids are solicited in pool order, the highest price wins and pays its own bid.
//! Among equal prices the bid solicited first wins.

use crate::bidders::{Bid, BidderPool};
use crate::errors::{ExchangeError, Result};
use crate::logger::{LogEvent, Logger};
use crate::requests::BidRequest;
use crate::utils::VERBOSE_AUCTION;
use crate::{logln, warnln};
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::atomic::Ordering;

/// Represents the winner of an auction
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Winner {
    /// `bidder_id` is the winner's position in the bidder pool
    Bid { bidder_id: usize, bid: Bid },
    /// Every solicited bidder declined or was excluded
    NO_DEMAND,
}

/// Outcome of one auction, tied back to its request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionResult {
    pub request_id: String,
    pub winner: Winner,
}

impl AuctionResult {
    pub fn winning_bid(&self) -> Option<&Bid> {
        match &self.winner {
            Winner::Bid { bid, .. } => Some(bid),
            Winner::NO_DEMAND => None,
        }
    }

    pub fn winning_bidder(&self) -> Option<usize> {
        match &self.winner {
            Winner::Bid { bidder_id, .. } => Some(*bidder_id),
            Winner::NO_DEMAND => None,
        }
    }
}

/// Index of the highest price, first one on ties
pub fn select_winner(bids: &[Bid]) -> Option<usize> {
    let mut winning_index: Option<usize> = None;
    for (index, bid) in bids.iter().enumerate() {
        match winning_index {
            Some(current) if bid.price <= bids[current].price => {}
            _ => winning_index = Some(index),
        }
    }
    winning_index
}

/// Why a bid is not eligible for this request, if it isn't
fn exclusion_reason(request: &BidRequest, bid: &Bid) -> Option<String> {
    let impression = request.impression();
    if bid.impid != impression.id {
        return Some(format!("impid '{}' does not match impression '{}'", bid.impid, impression.id));
    }
    if (bid.w, bid.h) != (impression.banner.w, impression.banner.h) {
        return Some(format!("size {}x{} does not match {}x{}", bid.w, bid.h, impression.banner.w, impression.banner.h));
    }
    if !bid.price.is_finite() || bid.price < 0.0 {
        return Some(format!("price {} is not a non-negative number", bid.price));
    }
    None
}

/// Run one auction for `request` among the first `count` bidders of the pool
pub fn run_auction(request: &BidRequest, pool: &BidderPool, count: usize, rng: &mut StdRng, logger: &mut Logger) -> Result<AuctionResult> {
    if count < 1 {
        return Err(ExchangeError::InvalidAuctionConfiguration("at least one bidder is required".to_string()));
    }
    if pool.is_empty() {
        return Err(ExchangeError::InvalidAuctionConfiguration("bidder pool is empty".to_string()));
    }
    if count > pool.len() {
        return Err(ExchangeError::InvalidAuctionConfiguration(format!(
            "{} bidders requested but the pool has {}",
            count,
            pool.len()
        )));
    }

    // Solicitation order is the pool order; it decides ties
    let mut bids: Vec<Bid> = Vec::with_capacity(count);
    let mut bidder_ids: Vec<usize> = Vec::with_capacity(count);
    let mut solicited: Vec<Option<f64>> = Vec::with_capacity(count);
    for (bidder_id, bidder) in pool.bidders.iter().take(count).enumerate() {
        let bid = match bidder.generate_response(request, rng) {
            Ok(response) => response.and_then(|response| response.into_first_bid()),
            Err(e) => {
                warnln!(logger, LogEvent::Auction, "Bidder {} did not bid on auction {}: {}", bidder.bidder_name(), request.id, e);
                None
            }
        };
        let bid = match bid {
            Some(bid) => bid,
            None => {
                solicited.push(None);
                continue;
            }
        };
        if let Some(reason) = exclusion_reason(request, &bid) {
            warnln!(logger, LogEvent::Auction, "Bid {} from {} excluded from auction {}: {}", bid.id, bidder.bidder_name(), request.id, reason);
            solicited.push(None);
            continue;
        }
        solicited.push(Some(bid.price));
        bids.push(bid);
        bidder_ids.push(bidder_id);
    }

    let winner = match select_winner(&bids) {
        Some(index) => Winner::Bid {
            bidder_id: bidder_ids[index],
            bid: bids.swap_remove(index),
        },
        None => Winner::NO_DEMAND,
    };

    if VERBOSE_AUCTION.load(Ordering::Relaxed) {
        // request_id,bidder:bid_id,winning_price,floor,then one price per solicited bidder (empty = no bid)
        let mut csv_fields = vec![request.id.clone()];
        match &winner {
            Winner::Bid { bidder_id, bid } => {
                csv_fields.push(format!("{}:{}", bidder_id, bid.id));
                csv_fields.push(format!("{:.2}", bid.price));
            }
            Winner::NO_DEMAND => {
                csv_fields.push("NO_DEMAND".to_string());
                csv_fields.push(String::new());
            }
        }
        csv_fields.push(format!("{:.2}", request.floor_price()));
        for price in &solicited {
            csv_fields.push(price.map(|p| format!("{:.2}", p)).unwrap_or_default());
        }
        logln!(logger, LogEvent::Auction, "{}", csv_fields.join(","));
    }

    Ok(AuctionResult {
        request_id: request.id.clone(),
        winner,
    })
}
