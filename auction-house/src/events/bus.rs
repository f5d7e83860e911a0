use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use super::{AuctionEvent, AuctionEventHandler, EventSink};

const REALTIME_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub attempts: usize,
    pub backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Fans committed events out to handlers and real-time subscribers.
///
/// `emit` only enqueues; a dispatcher task does the delivery, so nothing a
/// subscriber does can hold up or roll back a commit.
#[derive(Debug)]
pub struct EventBus {
    sender: mpsc::UnboundedSender<AuctionEvent>,
    realtime: broadcast::Sender<AuctionEvent>,
}

impl EventBus {
    pub fn start(
        handlers: Vec<Arc<dyn AuctionEventHandler>>,
        policy: DeliveryPolicy,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AuctionEvent>();
        let (realtime, _) = broadcast::channel(REALTIME_CAPACITY);

        let bus = Arc::new(Self {
            sender,
            realtime: realtime.clone(),
        });

        info!("[📣] Event dispatcher started with {} handler(s)", handlers.len());
        let dispatcher = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if realtime.send(event.clone()).is_err() {
                    debug!("No real-time subscribers for {}", event.kind());
                }

                for handler in handlers.iter() {
                    deliver(handler.as_ref(), &event, policy).await;
                }
            }

            info!("[📣] Event dispatcher stopped");
        });

        (bus, dispatcher)
    }

    /// Live feed for push transports (WebSocket, SSE, ...). A lagging
    /// receiver skips events and should re-read the auction.
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.realtime.subscribe()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: AuctionEvent) {
        if let Err(e) = self.sender.send(event) {
            error!("Event dispatcher is gone, dropping {}", e.0.kind());
        }
    }
}

async fn deliver(handler: &dyn AuctionEventHandler, event: &AuctionEvent, policy: DeliveryPolicy) {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match handler.on_event(event).await {
            Ok(_) => return,
            Err(e) if attempt < attempts => {
                warn!(
                    "Delivery of {} for auction {} failed (attempt {}/{}): {}",
                    event.kind(),
                    event.auction_id(),
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => {
                error!(
                    "Giving up on {} for auction {} after {} attempts: {}",
                    event.kind(),
                    event.auction_id(),
                    attempts,
                    e
                );
            }
        }
    }
}
