use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::auctions::{AuctionId, BidId, Currency, Timestamp, UserId};

/// Outbound notification, emitted only after the matching store commit.
///
/// Delivery is at-least-once. Subscribers dedupe on `auction_id` plus the
/// monotonic `bid_count` or the terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum AuctionEvent {
    #[serde(rename = "bid.accepted")]
    BidAccepted {
        auction_id: AuctionId,
        bid_id: BidId,
        bidder_id: UserId,
        current_bid: Currency,
        bid_count: u64,
        bid_time: Timestamp,
    },

    #[serde(rename = "auction.closed")]
    AuctionClosed {
        auction_id: AuctionId,
        winner_id: Option<UserId>,
        winning_bid_amount: Option<Currency>,
    },

    #[serde(rename = "auction.cancelled")]
    AuctionCancelled { auction_id: AuctionId },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> AuctionId {
        match self {
            AuctionEvent::BidAccepted { auction_id, .. }
            | AuctionEvent::AuctionClosed { auction_id, .. }
            | AuctionEvent::AuctionCancelled { auction_id } => *auction_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuctionEvent::BidAccepted { .. } => "bid.accepted",
            AuctionEvent::AuctionClosed { .. } => "auction.closed",
            AuctionEvent::AuctionCancelled { .. } => "auction.cancelled",
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Where the core hands events off. Must not block.
pub trait EventSink: Debug + Send + Sync {
    fn emit(&self, event: AuctionEvent);
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("subscriber unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode event")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait AuctionEventHandler: Debug + Send + Sync {
    async fn on_event(&self, event: &AuctionEvent) -> Result<(), DeliveryError>;
}
