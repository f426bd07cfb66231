//! Periodic background jobs with owned teardown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// A job running on a fixed period until stopped or dropped.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Run `job` every `period`, first run one period from now.
    ///
    /// Must be called from inside a tokio runtime. Runs never overlap: a slow
    /// run delays the next tick instead of queueing a burst.
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let period = period.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            loop {
                ticker.tick().await;
                debug!(task = %task_name, "Running periodic job");
                job().await;
            }
        });

        info!(task = %name, period_secs = period.as_secs_f64(), "Periodic job scheduled");
        Self { name, handle }
    }

    /// Cancel the job. A run in progress is abandoned at its next await point.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(task = %self.name, "Periodic job stopped");
    }
}
