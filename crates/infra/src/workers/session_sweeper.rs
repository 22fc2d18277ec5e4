use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use postgate_auth::{SessionRegistry, SessionStore};

/// Default sweep period: hourly.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Handle to stop and join a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Request shutdown and wait for the sweeper task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Periodically removes expired sessions from the registry's store.
#[derive(Debug)]
pub struct SessionSweeper;

impl SessionSweeper {
    /// Spawn the sweeper on the current tokio runtime.
    ///
    /// The first sweep runs one `interval` after spawning.
    pub fn spawn<S>(registry: Arc<SessionRegistry<S>>, interval: Duration) -> SweeperHandle
    where
        S: SessionStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(sweep_loop(registry, interval, shutdown_rx));
        SweeperHandle {
            shutdown: Some(shutdown_tx),
            join,
        }
    }
}

async fn sweep_loop<S>(
    registry: Arc<SessionRegistry<S>>,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    S: SessionStore,
{
    let period = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = period.as_secs(), "session sweeper started");
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                match registry.sweep(Utc::now()).await {
                    Ok(removed) => info!(removed, "session sweep finished"),
                    Err(err) => warn!(error = %err, "session sweep failed"),
                }
            }
        }
    }
    info!("session sweeper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::InMemorySessionStore;
    use postgate_auth::{Principal, Role};
    use postgate_core::UserId;

    #[tokio::test]
    async fn removes_expired_sessions_and_stops_on_shutdown() {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = Arc::new(SessionRegistry::with_ttl(
            Arc::clone(&store),
            chrono::Duration::seconds(60),
        ));
        let principal = Principal::new(UserId::new(), "alice", Role::User);

        // Issued two minutes ago: already expired.
        registry
            .issue(&principal, Utc::now() - chrono::Duration::seconds(120))
            .await
            .unwrap();
        let live = registry.issue(&principal, Utc::now()).await.unwrap();
        assert_eq!(store.len(), 2);

        let handle = SessionSweeper::spawn(Arc::clone(&registry), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert_eq!(store.len(), 1);
        registry
            .resolve(live.token.as_str(), Utc::now())
            .await
            .unwrap();
    }
}
