use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::RenewalPipeline;
use crate::domain::run::{RunReport, TriggerReason};
use crate::infrastructure::config_store::ConfigStore;
use crate::infrastructure::logging::panic_message;

/// Drives the renewal pipeline on a fixed period and accepts manual runs.
///
/// Scheduled runs never overlap each other: the timer loop awaits each run
/// before waiting for the next tick. Manual runs are spawned as separate
/// tasks and may overlap anything, including other manual runs; nothing
/// serializes them.
pub struct Scheduler {
    pipeline: Arc<RenewalPipeline>,
    store: ConfigStore,
    period: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<RenewalPipeline>, store: ConfigStore, period: Duration) -> Self {
        Self {
            pipeline,
            store,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// One supervised run. A panic inside the pipeline is logged and turns
    /// into `None`; it never propagates to the caller.
    pub async fn run_once(&self, trigger: TriggerReason) -> Option<RunReport> {
        let snapshot = self.store.get().await;
        match AssertUnwindSafe(self.pipeline.run(trigger, snapshot))
            .catch_unwind()
            .await
        {
            Ok(report) => Some(report),
            Err(payload) => {
                tracing::error!(
                    trigger = %trigger,
                    panic = %panic_message(payload.as_ref()),
                    "renewal run panicked"
                );
                None
            }
        }
    }

    /// Starts a manual run in the background and returns without waiting.
    pub fn trigger_manual(self: &Arc<Self>) -> JoinHandle<Option<RunReport>> {
        tracing::info!("manual renewal triggered");
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_once(TriggerReason::Manual).await })
    }

    /// Spawns the timer loop. The first scheduled run fires one period after
    /// start.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_periodic().await })
    }

    async fn run_periodic(&self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_secs = self.period.as_secs(), "renewal scheduler started");

        loop {
            ticker.tick().await;
            tracing::info!("scheduled renewal triggered");
            self.run_once(TriggerReason::Scheduled).await;
        }
    }
}
