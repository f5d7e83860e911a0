use std::{sync::Arc, time::Duration};

use log::{error, info};
use rand::{seq::IndexedRandom, Rng};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    catalog::{CatalogItem, InMemoryCatalog},
    models::auctions::{AuctionStatus, ItemRef, NewAuction, UserId},
    AuctionHouse,
};

const BIDDERS: usize = 3;
const AUCTION_LENGTH_MINUTES: i64 = 5;

/// Demo traffic: one auction and a few bidders raising each other at random.
pub fn start_simulation(
    house: Arc<AuctionHouse>,
    catalog: Arc<InMemoryCatalog>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let vendor_id = Uuid::new_v4();
        let bidders: Vec<UserId> = (0..BIDDERS).map(|_| Uuid::new_v4()).collect();
        let item = ItemRef::book(Uuid::new_v4().to_string());

        catalog
            .insert(
                item.clone(),
                CatalogItem {
                    title: "Moby-Dick; or, The Whale (first edition, 1851)".into(),
                    vendor_id,
                    image: None,
                },
            )
            .await;

        let now = house.lifecycle.now();
        let request = NewAuction {
            item,
            vendor_id,
            starting_price: Decimal::from(100),
            reserve_price: Some(Decimal::from(250)),
            bid_increment: Decimal::from(10),
            starts_at: now,
            ends_at: now + chrono::Duration::minutes(AUCTION_LENGTH_MINUTES),
        };

        let auction = match house.lifecycle.create_auction(request).await {
            Ok(auction) => auction,
            Err(e) => {
                error!("Simulation couldn't open its auction: {}", e);
                return;
            }
        };

        loop {
            tokio::time::sleep(period).await;

            let listing = match house.listings.listing(auction.id).await {
                Ok(Some(listing)) => listing,
                Ok(None) => return,
                Err(e) => {
                    error!("Simulation lost its auction: {}", e);
                    return;
                }
            };

            if listing.status != AuctionStatus::Active {
                info!("[🎲] Simulated auction is {}, stopping", listing.status);
                return;
            }

            let (bidder_id, raise) = {
                let mut rng = rand::rng();
                let Some(bidder_id) = bidders.choose(&mut rng).copied() else {
                    return;
                };
                (bidder_id, rng.random_range(0..=3i64))
            };

            let amount = listing.minimum_bid + listing.auction.bid_increment * Decimal::from(raise);
            match house.bids.place_bid(auction.id, bidder_id, amount).await {
                Ok(bid) => info!("[🎲] {} bid {}", bid.bidder_id, bid.amount),
                Err(e) => info!("[🎲] {} was turned away: {}", bidder_id, e),
            }
        }
    })
}
