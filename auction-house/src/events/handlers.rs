use async_trait::async_trait;
use log::info;

use super::{AuctionEvent, AuctionEventHandler, DeliveryError};

/// Writes every event as a JSON line to the log.
#[derive(Debug, Default)]
pub struct LoggingEventHandler;

#[async_trait]
impl AuctionEventHandler for LoggingEventHandler {
    async fn on_event(&self, event: &AuctionEvent) -> Result<(), DeliveryError> {
        let payload = event.to_json_string()?;
        info!("[📣] {}", payload);
        Ok(())
    }
}
