use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::auctions::{Auction, AuctionId, Bid, ItemRef, Transition, UserId};

mod file;
mod memory;

pub use file::{InFileStorage, SnapshotError, SnapshotStorage};
pub use memory::{InMemoryAuctionStore, StoreSnapshot};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Auction {0} already exists")]
    Duplicate(AuctionId),

    #[error("Auction {0} not found")]
    NotFound(AuctionId),

    #[error("Auction {auction_id} moved from version {expected} to {actual}")]
    Conflict {
        auction_id: AuctionId,
        expected: u64,
        actual: u64,
    },

    #[error("Auction {auction_id} rejected write: {reason}")]
    InvariantViolation {
        auction_id: AuctionId,
        reason: String,
    },

    #[error("Auction store unavailable: {0}")]
    Unavailable(String),
}

/// An auction together with its bid ledger in commit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub auction: Auction,
    pub bids: Vec<Bid>,
}

/// Persistence for auctions and their bids.
///
/// `currentBid`, `bidCount`, status and winner fields are only ever changed
/// through `commit_bid` and `commit_transition`. Both are compare-and-swap
/// on [`Auction::version`] and fail with [`StoreError::Conflict`] when the
/// row moved since the caller read it.
#[async_trait]
pub trait AuctionStore: Debug + Send + Sync {
    async fn insert(&self, auction: Auction) -> Result<(), StoreError>;

    async fn fetch(&self, auction_id: AuctionId) -> Result<Option<Auction>, StoreError>;

    /// Consistent read of the auction row and its ledger.
    async fn fetch_record(&self, auction_id: AuctionId) -> Result<Option<AuctionRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<Auction>, StoreError>;

    async fn find_by_item(&self, item: &ItemRef) -> Result<Vec<Auction>, StoreError>;

    async fn bids_by_bidder(&self, bidder_id: UserId) -> Result<Vec<Bid>, StoreError>;

    /// Appends `bid` to its auction's ledger and moves `currentBid` and
    /// `bidCount` with it, atomically.
    async fn commit_bid(&self, expected_version: u64, bid: Bid) -> Result<Auction, StoreError>;

    async fn commit_transition(
        &self,
        expected_version: u64,
        transition: &Transition,
    ) -> Result<Auction, StoreError>;
}
