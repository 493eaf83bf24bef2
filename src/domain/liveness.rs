//! Periodic liveness sweep over all registered connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ConnectionRegistry;

/// Spawns the single process-wide liveness task.
///
/// Every `period` (τ) the registry probes each connection; one that has not
/// acknowledged the previous probe is terminated. A silent peer is evicted
/// within (τ, 2τ]; a connection accepted just before a sweep still survives
/// its first cycle because its flag starts true.
pub fn spawn(registry: Arc<ConnectionRegistry>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.reset(); // skip the immediate first tick
        loop {
            ticker.tick().await;
            registry.sweep().await;
        }
    })
}
