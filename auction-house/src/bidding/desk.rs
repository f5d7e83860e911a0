use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    events::{AuctionEvent, EventSink},
    lifecycle::{LifecycleError, LifecycleManager},
    models::auctions::{
        Auction, AuctionId, AuctionStatus, Bid, Currency, Timestamp, UserId,
    },
    store::{AuctionStore, StoreError},
};

/// Why a bid was not accepted. Everything except `Transient` is a final
/// answer the caller can show as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BidError {
    #[error("Auction {0} not found")]
    NotFound(AuctionId),

    #[error("Auction {auction_id} is not open for bidding ({status})")]
    AuctionNotOpen {
        auction_id: AuctionId,
        status: AuctionStatus,
        starts_at: Timestamp,
        ends_at: Timestamp,
    },

    #[error("Vendors can't bid on their own auctions")]
    SelfBidForbidden,

    #[error("Bid too low, the minimum acceptable bid is {minimum}")]
    BidTooLow {
        minimum: Currency,
        current_bid: Option<Currency>,
    },

    #[error("Bid too high, the maximum acceptable bid is {maximum}")]
    BidTooHigh { maximum: Currency },

    #[error("Auction is busy, bid wasn't placed after {attempts} attempts")]
    Transient { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(LifecycleError),
}

/// Bid acceptance: validates a bid against the latest committed state of
/// its auction and commits it with a compare-and-swap on the row version.
/// A lost race re-reads and re-validates, so a caller always gets either a
/// committed bid or an explicit rejection.
#[derive(Debug)]
pub struct BidDesk {
    store: Arc<dyn AuctionStore>,
    lifecycle: Arc<LifecycleManager>,
    events: Arc<dyn EventSink>,
    max_attempts: usize,
}

impl BidDesk {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        lifecycle: Arc<LifecycleManager>,
        events: Arc<dyn EventSink>,
        max_attempts: usize,
    ) -> Self {
        Self {
            store,
            lifecycle,
            events,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Currency,
    ) -> Result<Bid, BidError> {
        for attempt in 1..=self.max_attempts {
            let bid_time = self.lifecycle.now();

            let auction = match self.lifecycle.refresh_at(auction_id, bid_time).await {
                Ok(auction) => auction,
                Err(LifecycleError::NotFound(id)) => return Err(BidError::NotFound(id)),
                Err(LifecycleError::Transient { .. }) => continue,
                Err(LifecycleError::Store(e)) => return Err(e.into()),
                Err(e) => return Err(BidError::Lifecycle(e)),
            };

            if let Err(rejection) = validate(&auction, bidder_id, amount, bid_time) {
                debug!("Bid of {} on {} rejected: {}", amount, auction_id, rejection);
                return Err(rejection);
            }

            let bid = Bid::new(auction_id, bidder_id, amount, bid_time);
            match self.store.commit_bid(auction.version(), bid.clone()).await {
                Ok(updated) => {
                    info!(
                        "[💰] Bid {} on auction {}: {} (bid #{})",
                        bid.id, auction_id, amount, updated.bid_count
                    );

                    self.events.emit(AuctionEvent::BidAccepted {
                        auction_id,
                        bid_id: bid.id,
                        bidder_id,
                        current_bid: updated.current_bid.unwrap_or(amount),
                        bid_count: updated.bid_count,
                        bid_time,
                    });
                    return Ok(bid);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!("Bid on {} lost a race (attempt {}), re-validating", auction_id, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Bid of {} on {} not placed after {} attempts",
            amount, auction_id, self.max_attempts
        );
        Err(BidError::Transient {
            attempts: self.max_attempts,
        })
    }
}

/// Preconditions, checked in order.
fn validate(
    auction: &Auction,
    bidder_id: UserId,
    amount: Currency,
    now: Timestamp,
) -> Result<(), BidError> {
    if !auction.is_open_at(now) {
        return Err(BidError::AuctionNotOpen {
            auction_id: auction.id,
            status: auction.effective_status(now),
            starts_at: auction.starts_at,
            ends_at: auction.ends_at,
        });
    }

    if bidder_id == auction.vendor_id {
        return Err(BidError::SelfBidForbidden);
    }

    let minimum = auction.minimum_bid();
    if amount < minimum || !auction.on_increment_ladder(amount) {
        return Err(BidError::BidTooLow {
            minimum,
            current_bid: auction.current_bid,
        });
    }

    let maximum = auction.maximum_bid();
    if amount > maximum {
        return Err(BidError::BidTooHigh { maximum });
    }

    Ok(())
}
