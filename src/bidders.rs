//! Bidders and the pool the auction solicits them from
//!
//! A bidder is anything that, given a request, answers with a bid response or declines.
//! The auction engine only sees BidderTrait, so real strategies can replace the
//! random stub bidders without touching it.

use crate::config::PriceRange;
use crate::errors::Result;
use crate::requests::{random_id, BidRequest};
use crate::strategy::{BiddingStrategy, BudgetState};
use crate::utils::round2;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// A single bid for the request's impression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub impid: String,
    pub price: f64,
    /// Creative markup
    pub adm: String,
    /// Creative id
    pub crid: String,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatBid {
    pub bid: Vec<Bid>,
}

/// What a bidder returns for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidResponse {
    /// Id of the request being answered
    pub id: String,
    pub seatbid: Vec<SeatBid>,
    pub bidid: String,
}

impl BidResponse {
    /// Wrap a price into a response for `request`, filling in the creative and sizes
    pub fn for_request(request: &BidRequest, price: f64, rng: &mut StdRng) -> Self {
        let impression = request.impression();
        let bid = Bid {
            id: random_id("bid", rng),
            impid: impression.id.clone(),
            price,
            adm: "<ad markup>".to_string(),
            crid: "creative-123".to_string(),
            w: impression.banner.w,
            h: impression.banner.h,
        };
        Self {
            id: request.id.clone(),
            seatbid: vec![SeatBid { bid: vec![bid] }],
            bidid: random_id("bidid", rng),
        }
    }

    /// The bid for the single impression (first bid of the first seat)
    pub fn first_bid(&self) -> Option<&Bid> {
        self.seatbid.first().and_then(|seat| seat.bid.first())
    }

    pub fn into_first_bid(self) -> Option<Bid> {
        self.seatbid.into_iter().next().and_then(|seat| seat.bid.into_iter().next())
    }
}

/// Trait for bidders participating in auctions
pub trait BidderTrait {
    fn bidder_name(&self) -> &str;

    /// Answer a bid request; Ok(None) means the bidder declines to bid
    /// An error also counts as no bid, the auction logs its reason
    fn generate_response(&self, request: &BidRequest, rng: &mut StdRng) -> Result<Option<BidResponse>>;
}

/// Stub bidder drawing a uniform price, rounded to cents
pub struct BidderRandom {
    pub bidder_name: String,
    price_dist: Uniform<f64>,
}

impl BidderRandom {
    /// Fails with InvalidConfig on an empty or non-finite range
    pub fn new(bidder_name: String, price_range: PriceRange) -> Result<Self> {
        price_range.validate()?;
        Ok(Self {
            bidder_name,
            price_dist: Uniform::new_inclusive(price_range.min, price_range.max),
        })
    }
}

impl BidderTrait for BidderRandom {
    fn bidder_name(&self) -> &str {
        &self.bidder_name
    }

    fn generate_response(&self, request: &BidRequest, rng: &mut StdRng) -> Result<Option<BidResponse>> {
        let price = round2(self.price_dist.sample(rng));
        Ok(Some(BidResponse::for_request(request, price, rng)))
    }
}

/// Bidder that paces a budget snapshot and adjusts for the request's user signals
///
/// The budget is not updated on wins; whoever owns the campaign books the win and
/// puts a bidder with the new snapshot back into the pool (`BidderPool::replace`).
pub struct BidderStrategic {
    pub bidder_name: String,
    pub strategy: BiddingStrategy,
    pub budget: BudgetState,
}

impl BidderStrategic {
    pub fn new(bidder_name: String, strategy: BiddingStrategy, budget: BudgetState) -> Self {
        Self { bidder_name, strategy, budget }
    }
}

impl BidderTrait for BidderStrategic {
    fn bidder_name(&self) -> &str {
        &self.bidder_name
    }

    fn generate_response(&self, request: &BidRequest, rng: &mut StdRng) -> Result<Option<BidResponse>> {
        if self.budget.is_exhausted() {
            return Ok(None);
        }
        let price = self.strategy.pacing_then_adjust(request, &self.budget, &request.user.ext)?;
        if price <= 0.0 {
            return Ok(None);
        }
        Ok(Some(BidResponse::for_request(request, price, rng)))
    }
}

/// Bidders in their fixed solicitation order
pub struct BidderPool {
    pub bidders: Vec<Box<dyn BidderTrait>>,
}

impl BidderPool {
    pub fn new() -> Self {
        Self {
            bidders: Vec::new(),
        }
    }

    /// `count` homogeneous random bidders named "Bidder 0", "Bidder 1", ...
    pub fn uniform(count: usize, price_range: PriceRange) -> Result<Self> {
        let mut pool = Self::new();
        for index in 0..count {
            pool.add(Box::new(BidderRandom::new(format!("Bidder {}", index), price_range)?));
        }
        Ok(pool)
    }

    /// Append a bidder; returns its position in the solicitation order
    pub fn add(&mut self, bidder: Box<dyn BidderTrait>) -> usize {
        self.bidders.push(bidder);
        self.bidders.len() - 1
    }

    /// Swap the bidder at `index` for a new one, keeping its place in the order
    /// Returns the previous bidder, or None (and drops `bidder`) if `index` is out of range
    pub fn replace(&mut self, index: usize, bidder: Box<dyn BidderTrait>) -> Option<Box<dyn BidderTrait>> {
        let slot = self.bidders.get_mut(index)?;
        Some(std::mem::replace(slot, bidder))
    }

    pub fn len(&self) -> usize {
        self.bidders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bidders.is_empty()
    }
}

impl Default for BidderPool {
    fn default() -> Self {
        Self::new()
    }
}
