//! Drives a shared [`ToastManager`] from one tokio interval.
//!
//! All toasts share a single timer. The [`Ticker`] guard owns the task;
//! dropping it (on unmount) aborts the task so no timer outlives its view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::toast::{ToastManager, TICK_INTERVAL_MS};

#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the interval task on the current tokio runtime.
    pub fn spawn(manager: Arc<Mutex<ToastManager>>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_millis(TICK_INTERVAL_MS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                manager.lock().await.tick();
            }
        });
        tracing::debug!("toast ticker started");
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("toast ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::{DEFAULT_DURATION_MS, EXIT_GRACE_MS};

    #[tokio::test(start_paused = true)]
    async fn expires_toasts_on_schedule() {
        let manager = Arc::new(Mutex::new(ToastManager::new()));
        let id = manager.lock().await.success("Interest sent successfully!");
        let ticker = Ticker::spawn(Arc::clone(&manager));
        assert!(ticker.is_running());

        time::sleep(Duration::from_millis(DEFAULT_DURATION_MS / 2 + 50)).await;
        {
            let guard = manager.lock().await;
            let remaining = guard.get(id).unwrap().remaining_percent();
            assert!((remaining - 50.0).abs() < 1e-9, "remaining = {remaining}");
        }

        time::sleep(Duration::from_millis(DEFAULT_DURATION_MS / 2 + EXIT_GRACE_MS)).await;
        assert!(manager.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_guard_stops_ticking() {
        let manager = Arc::new(Mutex::new(ToastManager::new()));
        let id = manager.lock().await.success("saved");
        let ticker = Ticker::spawn(Arc::clone(&manager));
        drop(ticker);

        time::sleep(Duration::from_millis(DEFAULT_DURATION_MS * 2)).await;
        let guard = manager.lock().await;
        assert_eq!(guard.get(id).unwrap().remaining_percent(), 100.0);
    }
}
