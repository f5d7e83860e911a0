mod desk;

pub use desk::{BidDesk, BidError};
