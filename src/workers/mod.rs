pub mod session_cleanup;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::Store;

/// Runs the session cleanup every `period` until shutdown is broadcast.
pub fn spawn_session_cleanup(
    store: Arc<Store>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => session_cleanup::run(&store),
                _ = shutdown_rx.recv() => {
                    tracing::info!("Session cleanup stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path().join("w.sled").to_str().unwrap()).unwrap());
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_session_cleanup(store, Duration::from_secs(3600), rx);
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop")
            .unwrap();
    }
}
