use std::{sync::Arc, time::Duration};

use auction_house::{
    catalog::InMemoryCatalog,
    cli::Arguments,
    clock::SystemClock,
    events::{AuctionEventHandler, DeliveryPolicy, EventBus, LoggingEventHandler},
    lifecycle::LifecycleManager,
    logger,
    simulation,
    store::{InFileStorage, InMemoryAuctionStore, SnapshotError, SnapshotStorage, StoreSnapshot},
    AuctionHouse,
};
use log::{error, info, warn};

const SIMULATION_PERIOD: Duration = Duration::from_secs(3);

async fn persist(store: &InMemoryAuctionStore, storage: &InFileStorage) {
    match store.persist(storage).await {
        Ok(saved) => info!("State saved! ({} auctions)", saved),
        Err(e) => error!("Failed to save auction state: {}", e),
    }
}

fn restore(storage: &InFileStorage) -> Result<InMemoryAuctionStore, Box<dyn std::error::Error>> {
    match storage.load::<StoreSnapshot>() {
        Ok(snapshot) => Ok(InMemoryAuctionStore::from_snapshot(snapshot)?),
        Err(SnapshotError::NotFound) => Ok(InMemoryAuctionStore::new()),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arguments::from_with_config()?;
    let _logger = logger::init_logger(&config.log_level, &config.log_dir, "auction-house")?;

    let storage = InFileStorage::new(&config.snapshot);
    let store = Arc::new(restore(&storage)?);
    info!("Loaded auction state from {}", storage.path().display());

    let handlers: Vec<Arc<dyn AuctionEventHandler>> = vec![Arc::new(LoggingEventHandler)];
    let (events, _dispatcher) = EventBus::start(
        handlers,
        DeliveryPolicy {
            attempts: config.delivery_attempts,
            ..DeliveryPolicy::default()
        },
    );

    let catalog = Arc::new(InMemoryCatalog::new());
    let house = Arc::new(AuctionHouse::new(
        store.clone(),
        catalog.clone(),
        Arc::new(SystemClock),
        events,
        config.max_commit_attempts,
    ));

    let _sweeper =
        LifecycleManager::start_sweeper(Arc::clone(&house.lifecycle), config.sweep_interval());

    let persist_store = Arc::clone(&store);
    let persist_storage = storage.clone();
    let snapshot_interval = config.snapshot_interval();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(snapshot_interval).await;
            persist(&persist_store, &persist_storage).await;
        }
    });

    if config.simulate {
        warn!("Simulation enabled, generating demo bids");
        simulation::start_simulation(Arc::clone(&house), catalog, SIMULATION_PERIOD);
    }

    match house.lifecycle.status_counts().await {
        Ok(counts) => info!("Auctions by status: {:?}", counts),
        Err(e) => warn!("Couldn't count auctions: {}", e),
    }

    println!("auction-house running, logs in {}", config.log_dir.display());
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    persist(&store, &storage).await;

    Ok(())
}
