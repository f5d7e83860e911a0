use std::sync::Arc;

use crate::{
    bidding::BidDesk,
    cart::{AuctionGuard, CartService},
    catalog::{Catalog, ListingService},
    clock::Clock,
    events::EventSink,
    lifecycle::LifecycleManager,
    store::AuctionStore,
};

pub const DEFAULT_COMMIT_ATTEMPTS: usize = 8;

/// Wires the auction core to its collaborators.
#[derive(Debug)]
pub struct AuctionHouse {
    pub lifecycle: Arc<LifecycleManager>,
    pub bids: BidDesk,
    pub listings: ListingService,
    pub guard: AuctionGuard,
    pub carts: CartService,
}

impl AuctionHouse {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        max_commit_attempts: usize,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&events),
            max_commit_attempts,
        ));

        let bids = BidDesk::new(
            Arc::clone(&store),
            Arc::clone(&lifecycle),
            events,
            max_commit_attempts,
        );

        let listings = ListingService::new(Arc::clone(&store), catalog, Arc::clone(&clock));
        let guard = AuctionGuard::new(store, clock);

        Self {
            lifecycle,
            bids,
            listings,
            carts: CartService::new(guard.clone()),
            guard,
        }
    }
}
