pub mod bidding;
pub mod cart;
pub mod catalog;
pub mod clock;
pub mod events;
pub mod house;
pub mod lifecycle;
pub mod models;
pub mod store;

pub mod cli;
pub mod logger;
pub mod simulation;

pub use house::AuctionHouse;

#[cfg(test)]
mod test;
