use std::{collections::BTreeMap, sync::Arc};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    clock::Clock,
    events::{AuctionEvent, EventSink},
    models::auctions::{
        status, Auction, AuctionError, AuctionId, AuctionStatus, NewAuction, Timestamp,
        Transition,
    },
    store::{AuctionStore, StoreError},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("Auction {0} not found")]
    NotFound(AuctionId),

    #[error("Auction {auction_id} is already {status}")]
    AlreadyResolved {
        auction_id: AuctionId,
        status: AuctionStatus,
    },

    #[error("Invalid auction: {0}")]
    Invalid(#[from] AuctionError),

    #[error("Auction {auction_id} kept changing, gave up after {attempts} attempts")]
    Transient {
        auction_id: AuctionId,
        attempts: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one sweep over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub activated: usize,
    pub ended: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn changed(&self) -> bool {
        self.activated > 0 || self.ended > 0
    }
}

/// Applies status transitions and resolves winners.
///
/// Transitions run lazily whenever an auction is read through
/// [`LifecycleManager::refresh`] and in bulk through
/// [`LifecycleManager::sweep`]; both commit the same transition, so the
/// terminal state never depends on which of them got there first.
#[derive(Debug)]
pub struct LifecycleManager {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    max_attempts: usize,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        max_attempts: usize,
    ) -> Self {
        Self {
            store,
            clock,
            events,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub async fn create_auction(&self, request: NewAuction) -> Result<Auction, LifecycleError> {
        let now = self.clock.now();
        request.validate(now)?;

        let auction = Auction::open(request, now);
        self.store.insert(auction.clone()).await?;

        info!(
            "[🔨] Auction {} opened for {} ({}, ends {})",
            auction.id, auction.item, auction.status, auction.ends_at
        );
        Ok(auction)
    }

    pub async fn refresh(&self, auction_id: AuctionId) -> Result<Auction, LifecycleError> {
        self.refresh_at(auction_id, self.clock.now()).await
    }

    /// Reads the auction and commits whatever transition `now` calls for.
    pub async fn refresh_at(
        &self,
        auction_id: AuctionId,
        now: Timestamp,
    ) -> Result<Auction, LifecycleError> {
        for attempt in 1..=self.max_attempts {
            let Some(auction) = self.store.fetch(auction_id).await? else {
                return Err(LifecycleError::NotFound(auction_id));
            };

            if !status::needs_transition(&auction, now) {
                return Ok(auction);
            }

            let Some(record) = self.store.fetch_record(auction_id).await? else {
                return Err(LifecycleError::NotFound(auction_id));
            };

            let Some(transition) = status::clock_transition(&record.auction, &record.bids, now)
            else {
                return Ok(record.auction);
            };

            match self.commit(&record.auction, &transition).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::Conflict { .. }) => {
                    debug!("Transition of {} raced a commit (attempt {})", auction_id, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LifecycleError::Transient {
            auction_id,
            attempts: self.max_attempts,
        })
    }

    pub async fn cancel_auction(&self, auction_id: AuctionId) -> Result<Auction, LifecycleError> {
        for attempt in 1..=self.max_attempts {
            let now = self.clock.now();
            let auction = self.refresh_at(auction_id, now).await?;

            let transition = match status::cancellation(&auction, now) {
                Ok(Some(transition)) => transition,
                Ok(None) => return Ok(auction),
                Err(status) => {
                    return Err(LifecycleError::AlreadyResolved { auction_id, status });
                }
            };

            match self.commit(&auction, &transition).await {
                Ok(updated) => return Ok(updated),
                Err(StoreError::Conflict { .. }) => {
                    debug!("Cancellation of {} raced a commit (attempt {})", auction_id, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LifecycleError::Transient {
            auction_id,
            attempts: self.max_attempts,
        })
    }

    /// Promotes every auction whose boundaries have passed. Failures are
    /// left in place for the next sweep.
    pub async fn sweep(&self) -> Result<SweepReport, LifecycleError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for auction in self.store.list().await? {
            if !status::needs_transition(&auction, now) {
                continue;
            }

            report.examined += 1;
            match self.refresh_at(auction.id, now).await {
                Ok(updated) if updated.status == auction.status => {}
                Ok(updated) => match updated.status {
                    AuctionStatus::Active => report.activated += 1,
                    AuctionStatus::Ended => report.ended += 1,
                    _ => {}
                },
                Err(e) => {
                    warn!("Sweep couldn't transition auction {}: {}", auction.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Number of auctions per status as a reader would see them right now.
    pub async fn status_counts(&self) -> Result<BTreeMap<AuctionStatus, usize>, LifecycleError> {
        let now = self.clock.now();
        let mut counts = BTreeMap::new();

        for auction in self.store.list().await? {
            *counts.entry(auction.effective_status(now)).or_insert(0) += 1;
        }

        Ok(counts)
    }

    async fn commit(&self, auction: &Auction, transition: &Transition) -> Result<Auction, StoreError> {
        let updated = self
            .store
            .commit_transition(auction.version(), transition)
            .await?;

        match transition.to() {
            AuctionStatus::Ended => {
                match transition.resolution() {
                    Some(resolution) => info!(
                        "[🏆] Auction {} won by {} at {}",
                        updated.id, resolution.winner_id, resolution.winning_bid_amount
                    ),
                    None => info!("[🏁] Auction {} ended without a winner", updated.id),
                }

                self.events.emit(AuctionEvent::AuctionClosed {
                    auction_id: updated.id,
                    winner_id: updated.winner_id,
                    winning_bid_amount: updated.winning_bid_amount,
                });
            }
            AuctionStatus::Cancelled => {
                info!("[🚫] Auction {} cancelled", updated.id);
                self.events
                    .emit(AuctionEvent::AuctionCancelled { auction_id: updated.id });
            }
            status => info!("[🔨] Auction {} is now {}", updated.id, status),
        }

        Ok(updated)
    }
}
