mod bus;
mod event;
mod handlers;

pub use bus::{DeliveryPolicy, EventBus};
pub use event::{AuctionEvent, AuctionEventHandler, DeliveryError, EventSink};
pub use handlers::LoggingEventHandler;
