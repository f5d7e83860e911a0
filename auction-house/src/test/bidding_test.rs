use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    bidding::BidError,
    events::AuctionEvent,
    models::auctions::{AuctionStatus, ItemRef},
    test::{end_time, money, setup_test, start_time},
};

#[tokio::test]
async fn test_increment_rules() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;
    let bidder = Uuid::new_v4();

    let result = t.house.bids.place_bid(auction.id, bidder, money(105)).await;
    assert_eq!(
        result,
        Err(BidError::BidTooLow {
            minimum: money(100),
            current_bid: None,
        })
    );

    let bid = t.house.bids.place_bid(auction.id, bidder, money(110)).await.unwrap();
    assert_eq!(bid.amount, money(110));

    let stored = t.auction(auction.id).await;
    assert_eq!(stored.current_bid, Some(money(110)));
    assert_eq!(stored.bid_count, 1);

    let result = t.house.bids.place_bid(auction.id, Uuid::new_v4(), money(115)).await;
    assert_eq!(
        result,
        Err(BidError::BidTooLow {
            minimum: money(120),
            current_bid: Some(money(110)),
        })
    );

    let stored = t.auction(auction.id).await;
    assert_eq!(stored.current_bid, Some(money(110)));
    assert_eq!(stored.bid_count, 1);
}

#[tokio::test]
async fn test_first_bid_may_equal_starting_price() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;

    let bid = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(100))
        .await
        .unwrap();
    assert_eq!(bid.amount, money(100));
    assert!(!bid.is_winning);

    let next = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(110))
        .await
        .unwrap();
    assert_eq!(next.amount, money(110));
}

#[tokio::test]
async fn test_amounts_follow_increment_ladder() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;

    t.house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(110))
        .await
        .unwrap();

    let result = t.house.bids.place_bid(auction.id, Uuid::new_v4(), money(125)).await;
    assert_eq!(
        result,
        Err(BidError::BidTooLow {
            minimum: money(120),
            current_bid: Some(money(110)),
        })
    );

    let bid = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(150))
        .await
        .unwrap();
    assert_eq!(bid.amount, money(150));
    assert_eq!(t.auction(auction.id).await.minimum_bid(), money(160));
}

#[tokio::test]
async fn test_unknown_auction_is_not_found() {
    let t = setup_test();
    let missing = Uuid::new_v4();

    let result = t.house.bids.place_bid(missing, Uuid::new_v4(), money(100)).await;
    assert_eq!(result, Err(BidError::NotFound(missing)));
}

#[tokio::test]
async fn test_vendor_cannot_bid_on_own_auction() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;

    // checked before the amount
    let result = t.house.bids.place_bid(auction.id, t.vendor_id, money(1)).await;
    assert_eq!(result, Err(BidError::SelfBidForbidden));
    assert_eq!(t.auction(auction.id).await.bid_count, 0);
}

#[tokio::test]
async fn test_bid_before_start_is_rejected() {
    let t = setup_test();
    let mut request = t.request(ItemRef::product("atlas-1570"), 100, 10, None);
    request.starts_at = start_time() + Duration::minutes(30);
    let auction = t.house.lifecycle.create_auction(request).await.unwrap();
    assert_eq!(auction.status, AuctionStatus::Upcoming);

    let result = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(100))
        .await;

    assert!(matches!(
        result,
        Err(BidError::AuctionNotOpen {
            status: AuctionStatus::Upcoming,
            ..
        })
    ));
}

#[tokio::test]
async fn test_upcoming_auction_opens_on_first_bid_without_sweep() {
    let t = setup_test();
    let mut request = t.request(ItemRef::product("atlas-1570"), 100, 10, None);
    request.starts_at = start_time() + Duration::minutes(30);
    let auction = t.house.lifecycle.create_auction(request).await.unwrap();

    t.clock.advance(Duration::minutes(30));
    let bid = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(100))
        .await
        .unwrap();

    let stored = t.auction(auction.id).await;
    assert_eq!(stored.status, AuctionStatus::Active);
    assert_eq!(stored.current_bid, Some(bid.amount));
}

#[tokio::test]
async fn test_bid_after_end_rejected_without_sweep() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;
    let bidder = Uuid::new_v4();
    t.house.bids.place_bid(auction.id, bidder, money(100)).await.unwrap();

    t.clock.set(end_time() + Duration::milliseconds(1));
    let stored = t.auction(auction.id).await;
    assert_eq!(stored.status, AuctionStatus::Active);

    let result = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(500))
        .await;
    assert!(matches!(result, Err(BidError::AuctionNotOpen { .. })));

    // the rejected attempt resolved the auction on the way
    let stored = t.auction(auction.id).await;
    assert_eq!(stored.status, AuctionStatus::Ended);
    assert_eq!(stored.bid_count, 1);
    assert_eq!(stored.current_bid, Some(money(100)));
    assert_eq!(stored.winner_id, Some(bidder));
}

#[tokio::test]
async fn test_bid_at_exact_end_is_late() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;

    t.clock.set(end_time());
    let result = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(100))
        .await;

    assert!(matches!(result, Err(BidError::AuctionNotOpen { .. })));
    assert_eq!(t.auction(auction.id).await.bid_count, 0);
}

#[tokio::test]
async fn test_bid_on_cancelled_auction_is_rejected() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;
    t.house.lifecycle.cancel_auction(auction.id).await.unwrap();

    let result = t
        .house
        .bids
        .place_bid(auction.id, Uuid::new_v4(), money(100))
        .await;

    assert!(matches!(
        result,
        Err(BidError::AuctionNotOpen {
            status: AuctionStatus::Cancelled,
            ..
        })
    ));
}

#[tokio::test]
async fn test_accepted_bid_emits_event() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;
    let bidder = Uuid::new_v4();

    let first = t.house.bids.place_bid(auction.id, bidder, money(100)).await.unwrap();
    let second = t.house.bids.place_bid(auction.id, Uuid::new_v4(), money(130)).await.unwrap();
    let _ = t.house.bids.place_bid(auction.id, bidder, money(135)).await;

    let events = t.events.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        AuctionEvent::BidAccepted {
            auction_id: auction.id,
            bid_id: first.id,
            bidder_id: bidder,
            current_bid: money(100),
            bid_count: 1,
            bid_time: start_time(),
        }
    );
    assert!(matches!(
        events[1],
        AuctionEvent::BidAccepted { bid_id, bid_count: 2, .. } if bid_id == second.id
    ));
}

#[tokio::test]
async fn test_bidder_history_is_kept_per_auction() {
    let t = setup_test();
    let auction = t.open_auction(100, 10, None).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    t.house.bids.place_bid(auction.id, alice, money(100)).await.unwrap();
    t.clock.advance(Duration::seconds(5));
    t.house.bids.place_bid(auction.id, bob, money(110)).await.unwrap();
    t.clock.advance(Duration::seconds(5));
    t.house.bids.place_bid(auction.id, alice, money(150)).await.unwrap();

    let ledger = t.house.listings.bids_for(auction.id).await.unwrap();
    let amounts: Vec<_> = ledger.iter().map(|bid| bid.amount).collect();
    assert_eq!(amounts, vec![money(100), money(110), money(150)]);
    assert!(ledger.windows(2).all(|pair| pair[0].bid_time <= pair[1].bid_time));

    let history = t.house.listings.bids_by_bidder(alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, money(150));
}

#[tokio::test]
async fn test_amounts_near_the_decimal_limit_are_capped() {
    let t = setup_test();
    let auction = t.open_auction(0, 1, None).await;
    let ceiling = Decimal::MAX - money(1);

    let result = t.house.bids.place_bid(auction.id, Uuid::new_v4(), Decimal::MAX).await;
    assert_eq!(result, Err(BidError::BidTooHigh { maximum: ceiling }));
    assert_eq!(t.auction(auction.id).await.bid_count, 0);

    let top = t.house.bids.place_bid(auction.id, Uuid::new_v4(), ceiling).await.unwrap();
    assert_eq!(top.amount, ceiling);

    // the auction stays usable once it is pinned at the ceiling
    let result = t.house.bids.place_bid(auction.id, Uuid::new_v4(), money(5)).await;
    assert_eq!(
        result,
        Err(BidError::BidTooLow {
            minimum: Decimal::MAX,
            current_bid: Some(ceiling),
        })
    );

    let listing = t.house.listings.listing(auction.id).await.unwrap().unwrap();
    assert_eq!(listing.minimum_bid, Decimal::MAX);

    t.clock.set(end_time());
    let ended = t.house.lifecycle.refresh(auction.id).await.unwrap();
    assert_eq!(ended.winning_bid_amount, Some(ceiling));
}
