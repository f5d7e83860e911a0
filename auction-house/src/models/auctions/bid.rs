use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuctionId, BidId, Currency, Timestamp, UserId};

/// An accepted bid. Immutable once committed, except for `is_winning`
/// which the store flips exactly once when the auction is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Currency,
    pub bid_time: Timestamp,
    pub is_winning: bool,
}

impl Bid {
    pub(crate) fn new(
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Currency,
        bid_time: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder_id,
            amount,
            bid_time,
            is_winning: false,
        }
    }
}

/// Highest bid of a ledger; amounts are strictly increasing so ties only
/// happen on corrupt input, where the earlier bid wins.
pub fn highest_bid(ledger: &[Bid]) -> Option<&Bid> {
    ledger.iter().max_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| b.bid_time.cmp(&a.bid_time))
    })
}

/// The `count` highest bids, highest first.
pub fn top_bids(ledger: &[Bid], count: usize) -> Vec<Bid> {
    let mut history = ledger.to_vec();
    history.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| b.bid_time.cmp(&a.bid_time))
    });
    history.into_iter().take(count).collect()
}
