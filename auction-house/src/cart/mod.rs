mod cart;
mod guard;

pub use cart::{Cart, CartError, CartItem, CartService};
pub use guard::AuctionGuard;
