use std::sync::Arc;

use crate::{
    clock::Clock,
    models::auctions::{AuctionStatus, ItemRef},
    store::{AuctionStore, StoreError},
};

/// Answers whether an item is currently up for auction.
///
/// Always reads the store, since auction status moves independently of
/// cart activity.
#[derive(Debug, Clone)]
pub struct AuctionGuard {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
}

impl AuctionGuard {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn has_active_auction(&self, item: &ItemRef) -> Result<bool, StoreError> {
        let now = self.clock.now();

        let auctions = self.store.find_by_item(item).await?;
        Ok(auctions.iter().any(|auction| {
            auction.effective_status(now) == AuctionStatus::Active && auction.ends_at > now
        }))
    }
}
