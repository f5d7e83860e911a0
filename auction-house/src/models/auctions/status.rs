//! Auction status state machine.
//!
//! Every status change an auction ever goes through is produced here as a
//! [`Transition`]. The store applies transitions but never picks a status
//! on its own, and nothing outside this module can build one.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    bid::{self, Bid},
    Auction, AuctionId, BidId, Currency, Timestamp, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Upcoming,
    Active,
    /// Bidding window is over but resolution hasn't been committed yet.
    /// Only ever derived on read, never stored.
    Closed,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AuctionStatus::Ended | AuctionStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuctionStatus::Upcoming => "upcoming",
            AuctionStatus::Active => "active",
            AuctionStatus::Closed => "closed",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of winner resolution when a reserve-satisfying bid exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub winner_id: UserId,
    pub winning_bid_id: BidId,
    pub winning_bid_amount: Currency,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    auction_id: AuctionId,
    from: AuctionStatus,
    to: AuctionStatus,
    resolution: Option<Resolution>,
}

impl Transition {
    fn new(auction: &Auction, to: AuctionStatus, resolution: Option<Resolution>) -> Self {
        Self {
            auction_id: auction.id,
            from: auction.status,
            to,
            resolution,
        }
    }

    pub fn auction_id(&self) -> AuctionId {
        self.auction_id
    }

    pub fn from(&self) -> AuctionStatus {
        self.from
    }

    pub fn to(&self) -> AuctionStatus {
        self.to
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }
}

pub fn initial_status(starts_at: Timestamp, now: Timestamp) -> AuctionStatus {
    if now >= starts_at {
        AuctionStatus::Active
    } else {
        AuctionStatus::Upcoming
    }
}

/// Status a reader should observe at `now`, without writing anything.
pub fn effective_status(auction: &Auction, now: Timestamp) -> AuctionStatus {
    match auction.status {
        AuctionStatus::Upcoming | AuctionStatus::Active if now >= auction.ends_at => {
            AuctionStatus::Closed
        }
        AuctionStatus::Upcoming if now >= auction.starts_at => AuctionStatus::Active,
        status => status,
    }
}

/// Whether the stored status lags behind the clock.
pub fn needs_transition(auction: &Auction, now: Timestamp) -> bool {
    effective_status(auction, now) != auction.status
}

/// Time-driven transition for `auction` at `now`, given its full bid ledger.
/// Recomputing on an already-current auction yields `None`.
pub fn clock_transition(auction: &Auction, ledger: &[Bid], now: Timestamp) -> Option<Transition> {
    match auction.status {
        AuctionStatus::Upcoming | AuctionStatus::Active if now >= auction.ends_at => {
            Some(resolve(auction, ledger))
        }
        AuctionStatus::Upcoming if now >= auction.starts_at => {
            Some(Transition::new(auction, AuctionStatus::Active, None))
        }
        _ => None,
    }
}

fn resolve(auction: &Auction, ledger: &[Bid]) -> Transition {
    let resolution = if auction.bid_count > 0 && auction.reserve_met() {
        bid::highest_bid(ledger).map(|winning| Resolution {
            winner_id: winning.bidder_id,
            winning_bid_id: winning.id,
            winning_bid_amount: winning.amount,
        })
    } else {
        None
    };

    Transition::new(auction, AuctionStatus::Ended, resolution)
}

/// Cancellation request. `Ok(None)` means the auction is already cancelled;
/// `Err` carries the status that forbids cancelling.
pub fn cancellation(auction: &Auction, now: Timestamp) -> Result<Option<Transition>, AuctionStatus> {
    match effective_status(auction, now) {
        AuctionStatus::Upcoming | AuctionStatus::Active => Ok(Some(Transition::new(
            auction,
            AuctionStatus::Cancelled,
            None,
        ))),
        AuctionStatus::Cancelled => Ok(None),
        status => Err(status),
    }
}
