//! Periodic category registry refresh

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use super::RegistryService;

/// Refresh scheduler configuration
#[derive(Debug, Clone)]
pub struct RefreshSchedulerConfig {
    /// Time between rebuilds
    pub interval: Duration,
}

impl Default for RefreshSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Rebuilds the category registry on a fixed interval.
///
/// The first rebuild happens one interval after start; the startup rebuild
/// is the caller's job.
#[derive(Debug)]
pub struct RefreshScheduler {
    service: Arc<RegistryService>,
    config: RefreshSchedulerConfig,
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(service: Arc<RegistryService>, config: RefreshSchedulerConfig) -> Self {
        Self {
            service,
            config,
            shutdown: Arc::new(Notify::new()),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawns the refresh loop. Calling it on a running scheduler is a no-op.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let service = self.service.clone();
        let shutdown = self.shutdown.clone();
        let period = self.config.interval;

        info!(interval_secs = period.as_secs(), "Category refresh scheduler started");

        self.handle = Some(tokio::spawn(refresh_loop(service, shutdown, period)));
    }

    /// Signals the loop to stop and waits for it to exit
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shutdown.notify_one();

        if let Err(e) = handle.await {
            warn!(error = %e, "Category refresh scheduler task failed");
        }

        info!("Category refresh scheduler stopped");
    }
}

async fn refresh_loop(service: Arc<RegistryService>, shutdown: Arc<Notify>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {
                match service.refresh().await {
                    Ok(count) => info!(categories = count, "Scheduled category refresh completed"),
                    Err(e) => warn!(error = %e, "Scheduled category refresh failed"),
                }
            }
        }
    }
}
