use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    item::ItemRef,
    status::{self, AuctionStatus},
    AuctionId, Currency, Timestamp, UserId,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuctionError {
    #[error("Starting price can't be negative: {0}")]
    NegativeStartingPrice(Currency),

    #[error("Reserve price {reserve} is below the starting price {starting}")]
    ReserveBelowStartingPrice {
        reserve: Currency,
        starting: Currency,
    },

    #[error("Bid increment must be positive: {0}")]
    NonPositiveIncrement(Currency),

    #[error("Auction must start before it ends")]
    InvalidSchedule,

    #[error("Auction end time is already in the past")]
    EndsInPast,
}

/// Vendor request to open an auction for a catalog item.
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub item: ItemRef,
    pub vendor_id: UserId,
    pub starting_price: Currency,
    pub reserve_price: Option<Currency>,
    pub bid_increment: Currency,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

impl NewAuction {
    pub fn validate(&self, now: Timestamp) -> Result<(), AuctionError> {
        check_terms(
            self.starting_price,
            self.reserve_price,
            self.bid_increment,
            self.starts_at,
            self.ends_at,
        )?;

        if self.ends_at <= now {
            return Err(AuctionError::EndsInPast);
        }

        Ok(())
    }
}

fn check_terms(
    starting_price: Currency,
    reserve_price: Option<Currency>,
    bid_increment: Currency,
    starts_at: Timestamp,
    ends_at: Timestamp,
) -> Result<(), AuctionError> {
    if starting_price < Decimal::ZERO {
        return Err(AuctionError::NegativeStartingPrice(starting_price));
    }

    if let Some(reserve) = reserve_price {
        if reserve < starting_price {
            return Err(AuctionError::ReserveBelowStartingPrice {
                reserve,
                starting: starting_price,
            });
        }
    }

    if bid_increment <= Decimal::ZERO {
        return Err(AuctionError::NonPositiveIncrement(bid_increment));
    }

    if starts_at >= ends_at {
        return Err(AuctionError::InvalidSchedule);
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub item: ItemRef,
    pub vendor_id: UserId,
    pub starting_price: Currency,
    pub reserve_price: Option<Currency>,
    pub bid_increment: Currency,
    pub current_bid: Option<Currency>,
    pub bid_count: u64,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub status: AuctionStatus,
    pub winner_id: Option<UserId>,
    pub winning_bid_amount: Option<Currency>,
    pub(crate) version: u64,
}

impl Auction {
    pub(crate) fn open(request: NewAuction, now: Timestamp) -> Self {
        let status = status::initial_status(request.starts_at, now);

        Self {
            id: Uuid::new_v4(),
            item: request.item,
            vendor_id: request.vendor_id,
            starting_price: request.starting_price,
            reserve_price: request.reserve_price,
            bid_increment: request.bid_increment,
            current_bid: None,
            bid_count: 0,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            status,
            winner_id: None,
            winning_bid_amount: None,
            version: 0,
        }
    }

    /// Row version, bumped by the store on every committed mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Re-checks the terms a stored auction was opened with.
    pub fn check_terms(&self) -> Result<(), AuctionError> {
        check_terms(
            self.starting_price,
            self.reserve_price,
            self.bid_increment,
            self.starts_at,
            self.ends_at,
        )
    }

    /// Smallest amount the next bid must reach. Saturates at
    /// `Decimal::MAX` once the auction has hit [`Auction::maximum_bid`].
    pub fn minimum_bid(&self) -> Currency {
        match self.current_bid {
            Some(current) => current.saturating_add(self.bid_increment),
            None => self.starting_price,
        }
    }

    /// Largest amount a bid may carry: one increment of headroom below
    /// `Decimal::MAX`, so the next floor is always representable.
    pub fn maximum_bid(&self) -> Currency {
        Decimal::MAX.saturating_sub(self.bid_increment)
    }

    /// Bids move in whole increments from the starting price.
    pub fn on_increment_ladder(&self, amount: Currency) -> bool {
        amount >= self.starting_price
            && amount
                .checked_sub(self.starting_price)
                .and_then(|steps| steps.checked_rem(self.bid_increment))
                .is_some_and(|rest| rest.is_zero())
    }

    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.status == AuctionStatus::Active && self.starts_at <= now && now < self.ends_at
    }

    pub fn effective_status(&self, now: Timestamp) -> AuctionStatus {
        status::effective_status(self, now)
    }

    pub fn reserve_met(&self) -> bool {
        match (self.current_bid, self.reserve_price) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(reserve)) => current >= reserve,
        }
    }
}
