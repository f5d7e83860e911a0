use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub mod auction;
pub mod bid;
pub mod item;
pub mod status;

pub type Timestamp = DateTime<Utc>;
pub type Currency = Decimal;

pub type AuctionId = Uuid;
pub type BidId = Uuid;
pub type UserId = Uuid;

pub use auction::{Auction, AuctionError, NewAuction};
pub use bid::Bid;
pub use item::{AuctionableType, ItemRef};
pub use status::{AuctionStatus, Resolution, Transition};
