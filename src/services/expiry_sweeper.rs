use std::{sync::Arc, time::Duration};

use tokio::{sync::RwLock, task::JoinHandle};

use crate::services::attempt_service::AttemptService;

/// Periodically auto-submits in-progress attempts whose time limit elapsed.
pub struct ExpirySweeper {
    attempt_service: Arc<AttemptService>,
    interval: Duration,
    worker_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl ExpirySweeper {
    /// An interval of zero disables the sweeper.
    pub fn new(attempt_service: Arc<AttemptService>, interval_seconds: u64) -> Self {
        Self {
            attempt_service,
            interval: Duration::from_secs(interval_seconds),
            worker_handle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    pub async fn start_worker(&self) {
        if !self.is_enabled() {
            log::info!("Attempt expiry sweeper disabled");
            return;
        }

        let mut handle = self.worker_handle.write().await;
        if handle.is_some() {
            return;
        }

        let service = self.attempt_service.clone();
        let period = self.interval;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match service.expire_overdue().await {
                    Ok(0) => {}
                    Ok(count) => log::info!("Expiry sweep submitted {} overdue attempts", count),
                    Err(e) => log::warn!("Expiry sweep failed: {}", e),
                }
            }
        }));

        log::info!("Attempt expiry sweeper started, interval {:?}", period);
    }

    pub async fn stop_worker(&self) {
        let mut handle = self.worker_handle.write().await;
        if let Some(join_handle) = handle.take() {
            join_handle.abort();
            log::info!("Attempt expiry sweeper stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker_handle.read().await.is_some()
    }
}
