pub mod bidding_test;

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    catalog::InMemoryCatalog,
    clock::ManualClock,
    events::{AuctionEvent, EventSink},
    models::auctions::{
        Auction, AuctionId, Bid, ItemRef, NewAuction, Timestamp, Transition, UserId,
    },
    store::{AuctionRecord, AuctionStore, InMemoryAuctionStore, StoreError},
    AuctionHouse,
};

pub const COMMIT_ATTEMPTS: usize = 8;

pub fn start_time() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
}

pub fn end_time() -> Timestamp {
    start_time() + Duration::hours(1)
}

pub fn money(amount: i64) -> Decimal {
    Decimal::from(amount)
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AuctionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn closed_events(&self) -> Vec<AuctionEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, AuctionEvent::AuctionClosed { .. }))
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AuctionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Wraps the in-memory store. Can fail the next `n` transition commits, or
/// answer every bid commit as if another writer always got there first.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: InMemoryAuctionStore,
    failing_transitions: AtomicUsize,
    contended: AtomicBool,
    bid_commits: AtomicUsize,
}

impl FlakyStore {
    pub fn fail_next_transitions(&self, count: usize) {
        self.failing_transitions.store(count, Ordering::SeqCst);
    }

    pub fn contend_all_bids(&self) {
        self.contended.store(true, Ordering::SeqCst);
    }

    pub fn bid_commits(&self) -> usize {
        self.bid_commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuctionStore for FlakyStore {
    async fn insert(&self, auction: Auction) -> Result<(), StoreError> {
        self.inner.insert(auction).await
    }

    async fn fetch(&self, auction_id: AuctionId) -> Result<Option<Auction>, StoreError> {
        self.inner.fetch(auction_id).await
    }

    async fn fetch_record(&self, auction_id: AuctionId) -> Result<Option<AuctionRecord>, StoreError> {
        self.inner.fetch_record(auction_id).await
    }

    async fn list(&self) -> Result<Vec<Auction>, StoreError> {
        self.inner.list().await
    }

    async fn find_by_item(&self, item: &ItemRef) -> Result<Vec<Auction>, StoreError> {
        self.inner.find_by_item(item).await
    }

    async fn bids_by_bidder(&self, bidder_id: UserId) -> Result<Vec<Bid>, StoreError> {
        self.inner.bids_by_bidder(bidder_id).await
    }

    async fn commit_bid(&self, expected_version: u64, bid: Bid) -> Result<Auction, StoreError> {
        self.bid_commits.fetch_add(1, Ordering::SeqCst);

        if self.contended.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict {
                auction_id: bid.auction_id,
                expected: expected_version,
                actual: expected_version + 1,
            });
        }

        self.inner.commit_bid(expected_version, bid).await
    }

    async fn commit_transition(
        &self,
        expected_version: u64,
        transition: &Transition,
    ) -> Result<Auction, StoreError> {
        let failing = self
            .failing_transitions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        self.inner.commit_transition(expected_version, transition).await
    }
}

pub struct TestHouse {
    pub house: AuctionHouse,
    pub store: Arc<dyn AuctionStore>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<RecordingSink>,
    pub catalog: Arc<InMemoryCatalog>,
    pub vendor_id: UserId,
}

impl TestHouse {
    pub fn request(&self, item: ItemRef, starting: i64, increment: i64, reserve: Option<i64>) -> NewAuction {
        NewAuction {
            item,
            vendor_id: self.vendor_id,
            starting_price: money(starting),
            reserve_price: reserve.map(money),
            bid_increment: money(increment),
            starts_at: start_time(),
            ends_at: end_time(),
        }
    }

    /// Opens an active auction for a fresh book, clock at `start_time`.
    pub async fn open_auction(&self, starting: i64, increment: i64, reserve: Option<i64>) -> Auction {
        let item = ItemRef::book(Uuid::new_v4().to_string());
        self.house
            .lifecycle
            .create_auction(self.request(item, starting, increment, reserve))
            .await
            .expect("auction should open")
    }

    pub async fn auction(&self, auction_id: AuctionId) -> Auction {
        self.store
            .fetch(auction_id)
            .await
            .unwrap()
            .expect("auction should exist")
    }

    pub async fn record(&self, auction_id: AuctionId) -> AuctionRecord {
        self.store
            .fetch_record(auction_id)
            .await
            .unwrap()
            .expect("auction should exist")
    }
}

pub fn setup_with_store(store: Arc<dyn AuctionStore>) -> TestHouse {
    let clock = Arc::new(ManualClock::new(start_time()));
    let events = Arc::new(RecordingSink::default());
    let catalog = Arc::new(InMemoryCatalog::new());

    let house = AuctionHouse::new(
        Arc::clone(&store),
        catalog.clone(),
        clock.clone(),
        events.clone(),
        COMMIT_ATTEMPTS,
    );

    TestHouse {
        house,
        store,
        clock,
        events,
        catalog,
        vendor_id: Uuid::new_v4(),
    }
}

pub fn setup_test() -> TestHouse {
    setup_with_store(Arc::new(InMemoryAuctionStore::new()))
}
