use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::models::auctions::{
    Auction, AuctionId, AuctionStatus, Bid, ItemRef, Transition, UserId,
};

use super::{AuctionRecord, AuctionStore, SnapshotError, SnapshotStorage, StoreError};

type Row = Arc<Mutex<AuctionRecord>>;

/// Exported store state, written to disk by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub records: Vec<AuctionRecord>,
}

/// Row-locked in-memory store.
///
/// The outer lock only guards the id -> row map. Each auction lives behind
/// its own mutex, so writers on one auction never wait on another.
#[derive(Debug, Default)]
pub struct InMemoryAuctionStore {
    rows: RwLock<HashMap<AuctionId, Row>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut rows = HashMap::with_capacity(snapshot.records.len());

        for record in snapshot.records {
            check_ledger(&record)?;

            let auction_id = record.auction.id;
            if rows
                .insert(auction_id, Arc::new(Mutex::new(record)))
                .is_some()
            {
                return Err(StoreError::Duplicate(auction_id));
            }
        }

        Ok(Self {
            rows: RwLock::new(rows),
        })
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let mut records = Vec::new();
        for row in self.rows().await {
            records.push(row.lock().await.clone());
        }

        records.sort_by(|a, b| a.auction.starts_at.cmp(&b.auction.starts_at));
        StoreSnapshot { records }
    }

    /// Writes a snapshot through `storage` on the blocking pool and returns
    /// the number of auctions saved.
    pub async fn persist<S>(&self, storage: &S) -> Result<usize, SnapshotError>
    where
        S: SnapshotStorage + Clone + 'static,
    {
        let snapshot = self.snapshot().await;
        let saved = snapshot.records.len();

        let storage = storage.clone();
        tokio::task::spawn_blocking(move || storage.store(&snapshot)).await??;
        Ok(saved)
    }

    async fn row(&self, auction_id: AuctionId) -> Option<Row> {
        let rows = self.rows.read().await;
        rows.get(&auction_id).map(Arc::clone)
    }

    async fn rows(&self) -> Vec<Row> {
        let rows = self.rows.read().await;
        rows.values().map(Arc::clone).collect()
    }
}

fn check_version(auction: &Auction, expected: u64) -> Result<(), StoreError> {
    if auction.version != expected {
        return Err(StoreError::Conflict {
            auction_id: auction.id,
            expected,
            actual: auction.version,
        });
    }

    Ok(())
}

fn violation(auction_id: AuctionId, reason: impl Into<String>) -> StoreError {
    StoreError::InvariantViolation {
        auction_id,
        reason: reason.into(),
    }
}

/// Ledger invariants: bid count and current bid mirror the bids, amounts
/// strictly increase and at most one bid is flagged winning.
fn check_ledger(record: &AuctionRecord) -> Result<(), StoreError> {
    let auction = &record.auction;

    if let Err(e) = auction.check_terms() {
        return Err(violation(auction.id, e.to_string()));
    }

    if auction.bid_count != record.bids.len() as u64 {
        return Err(violation(auction.id, "bid count diverges from ledger"));
    }

    if auction.current_bid != record.bids.last().map(|bid| bid.amount) {
        return Err(violation(auction.id, "current bid diverges from ledger"));
    }

    let mut previous: Option<Decimal> = None;
    for bid in record.bids.iter() {
        if bid.auction_id != auction.id {
            return Err(violation(auction.id, format!("foreign bid {}", bid.id)));
        }

        if previous.is_some_and(|amount| bid.amount <= amount) {
            return Err(violation(auction.id, "bid amounts are not increasing"));
        }
        previous = Some(bid.amount);
    }

    let winners: Vec<&Bid> = record.bids.iter().filter(|bid| bid.is_winning).collect();
    match winners.as_slice() {
        [] if auction.winner_id.is_none() => Ok(()),
        [winner]
            if auction.status == AuctionStatus::Ended
                && auction.winner_id == Some(winner.bidder_id)
                && auction.winning_bid_amount == Some(winner.amount) =>
        {
            Ok(())
        }
        _ => Err(violation(auction.id, "winner fields diverge from ledger")),
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn insert(&self, auction: Auction) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&auction.id) {
            return Err(StoreError::Duplicate(auction.id));
        }

        let record = AuctionRecord {
            auction,
            bids: vec![],
        };
        check_ledger(&record)?;

        rows.insert(record.auction.id, Arc::new(Mutex::new(record)));
        Ok(())
    }

    async fn fetch(&self, auction_id: AuctionId) -> Result<Option<Auction>, StoreError> {
        let Some(row) = self.row(auction_id).await else {
            return Ok(None);
        };

        let record = row.lock().await;
        Ok(Some(record.auction.clone()))
    }

    async fn fetch_record(&self, auction_id: AuctionId) -> Result<Option<AuctionRecord>, StoreError> {
        let Some(row) = self.row(auction_id).await else {
            return Ok(None);
        };

        let record = row.lock().await;
        Ok(Some(record.clone()))
    }

    async fn list(&self) -> Result<Vec<Auction>, StoreError> {
        let mut auctions = Vec::new();
        for row in self.rows().await {
            auctions.push(row.lock().await.auction.clone());
        }

        Ok(auctions)
    }

    async fn find_by_item(&self, item: &ItemRef) -> Result<Vec<Auction>, StoreError> {
        let mut auctions = Vec::new();
        for row in self.rows().await {
            let record = row.lock().await;
            if &record.auction.item == item {
                auctions.push(record.auction.clone());
            }
        }

        Ok(auctions)
    }

    async fn bids_by_bidder(&self, bidder_id: UserId) -> Result<Vec<Bid>, StoreError> {
        let mut bids = Vec::new();
        for row in self.rows().await {
            let record = row.lock().await;
            bids.extend(
                record
                    .bids
                    .iter()
                    .filter(|bid| bid.bidder_id == bidder_id)
                    .cloned(),
            );
        }

        bids.sort_by(|a, b| b.bid_time.cmp(&a.bid_time));
        Ok(bids)
    }

    async fn commit_bid(&self, expected_version: u64, bid: Bid) -> Result<Auction, StoreError> {
        let Some(row) = self.row(bid.auction_id).await else {
            return Err(StoreError::NotFound(bid.auction_id));
        };

        let mut record = row.lock().await;
        let auction = &record.auction;
        check_version(auction, expected_version)?;

        if auction.status != AuctionStatus::Active {
            return Err(violation(auction.id, "bids only land on active auctions"));
        }

        if bid.bid_time < auction.starts_at || bid.bid_time >= auction.ends_at {
            return Err(violation(auction.id, "bid placed outside the bidding window"));
        }

        if bid.amount > auction.maximum_bid() {
            return Err(violation(auction.id, "bid exceeds the maximum amount"));
        }

        if auction.current_bid.is_some_and(|current| bid.amount <= current) {
            return Err(violation(auction.id, "bid does not raise the current bid"));
        }

        record.auction.current_bid = Some(bid.amount);
        record.auction.bid_count += 1;
        record.auction.version += 1;
        record.bids.push(bid);

        Ok(record.auction.clone())
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        transition: &Transition,
    ) -> Result<Auction, StoreError> {
        let Some(row) = self.row(transition.auction_id()).await else {
            return Err(StoreError::NotFound(transition.auction_id()));
        };

        let mut guard = row.lock().await;
        let AuctionRecord { auction, bids } = &mut *guard;
        check_version(auction, expected_version)?;

        if auction.status != transition.from() {
            return Err(violation(
                auction.id,
                format!(
                    "transition expects {} but auction is {}",
                    transition.from(),
                    auction.status
                ),
            ));
        }

        if let Some(resolution) = transition.resolution() {
            if bids.iter().any(|bid| bid.is_winning) {
                return Err(violation(auction.id, "winner already resolved"));
            }

            let Some(winning) = bids
                .iter_mut()
                .find(|bid| bid.id == resolution.winning_bid_id)
            else {
                return Err(violation(auction.id, "winning bid missing from ledger"));
            };

            winning.is_winning = true;
            auction.winner_id = Some(resolution.winner_id);
            auction.winning_bid_amount = Some(resolution.winning_bid_amount);
        }

        auction.status = transition.to();
        auction.version += 1;

        Ok(auction.clone())
    }
}
