mod manager;
mod sweeper;

pub use manager::{LifecycleError, LifecycleManager, SweepReport};
