use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionableType {
    Book,
    Product,
}

impl fmt::Display for AuctionableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionableType::Book => write!(f, "book"),
            AuctionableType::Product => write!(f, "product"),
        }
    }
}

/// Typed reference to a catalog item. The auction never copies catalog fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: AuctionableType,
    pub id: String,
}

impl ItemRef {
    pub fn new(kind: AuctionableType, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn book(id: impl Into<String>) -> Self {
        Self::new(AuctionableType::Book, id)
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self::new(AuctionableType::Product, id)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
