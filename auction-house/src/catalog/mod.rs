use std::{collections::HashMap, fmt::Debug};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::auctions::{ItemRef, UserId};

mod listing;

pub use listing::{AuctionListing, ListingService, TOP_BIDS};

/// Display data for an auctioned item. Never consulted by auction logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub vendor_id: UserId,
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Catalog: Debug + Send + Sync {
    async fn get_auctionable_item(&self, item: &ItemRef) -> Result<Option<CatalogItem>, CatalogError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemRef, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, item: ItemRef, details: CatalogItem) {
        self.items.write().await.insert(item, details);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_auctionable_item(&self, item: &ItemRef) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self.items.read().await.get(item).cloned())
    }
}
