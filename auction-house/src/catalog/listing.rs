use std::sync::Arc;

use log::warn;

use crate::{
    clock::Clock,
    models::auctions::{
        bid, Auction, AuctionId, AuctionStatus, Bid, Currency, UserId,
    },
    store::{AuctionStore, StoreError},
};

use super::{Catalog, CatalogItem};

pub const TOP_BIDS: usize = 5;

/// What the storefront renders for an auction page.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionListing {
    pub auction: Auction,
    pub status: AuctionStatus,
    pub item: Option<CatalogItem>,
    pub minimum_bid: Currency,
    pub top_bids: Vec<Bid>,
}

/// Read-only queries behind the storefront and account pages.
#[derive(Debug)]
pub struct ListingService {
    store: Arc<dyn AuctionStore>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
        }
    }

    pub async fn listing(&self, auction_id: AuctionId) -> Result<Option<AuctionListing>, StoreError> {
        let Some(record) = self.store.fetch_record(auction_id).await? else {
            return Ok(None);
        };

        // the page still renders when the catalog is down, just without details
        let item = match self.catalog.get_auctionable_item(&record.auction.item).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Catalog lookup for {} failed: {}", record.auction.item, e);
                None
            }
        };

        let status = record.auction.effective_status(self.clock.now());
        Ok(Some(AuctionListing {
            minimum_bid: record.auction.minimum_bid(),
            top_bids: bid::top_bids(&record.bids, TOP_BIDS),
            auction: record.auction,
            status,
            item,
        }))
    }

    /// Ledger of one auction in commit order.
    pub async fn bids_for(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        match self.store.fetch_record(auction_id).await? {
            Some(record) => Ok(record.bids),
            None => Err(StoreError::NotFound(auction_id)),
        }
    }

    pub async fn recent_bids(&self, auction_id: AuctionId, count: usize) -> Result<Vec<Bid>, StoreError> {
        let bids = self.bids_for(auction_id).await?;
        Ok(bid::top_bids(&bids, count))
    }

    /// A bidder's history across auctions, newest first.
    pub async fn bids_by_bidder(&self, bidder_id: UserId) -> Result<Vec<Bid>, StoreError> {
        self.store.bids_by_bidder(bidder_id).await
    }
}
