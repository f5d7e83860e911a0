use std::{sync::Arc, time::Duration};

use log::{error, info};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::LifecycleManager;

impl LifecycleManager {
    pub fn start_sweeper(manager: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("[⏱️] Sweeper started, every {:?}", period);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                match manager.sweep().await {
                    Ok(report) if report.changed() || report.failed > 0 => info!(
                        "[⏱️] Sweep: {} activated, {} ended, {} failed",
                        report.activated, report.ended, report.failed
                    ),
                    Ok(_) => {}
                    Err(e) => error!("Sweep failed: {}", e),
                }
            }
        })
    }
}
