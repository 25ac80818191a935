// MIT License - Copyright (c) 2026 Peter Wright
// Poll driver and stall watchdog

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::metrics::MetricsSink;

/// A task is considered stalled after this many poll intervals without a
/// completed cycle.
pub const STALL_FACTOR: u32 = 5;

/// One periodic read of the panel.
#[async_trait]
pub trait PollTask: Send + Sync + 'static {
    /// Name used in logs and for the poll gauge.
    fn name(&self) -> &'static str;

    async fn run_once(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// How often the watchdog looks for stalled tasks
    pub watchdog_period: Duration,
    pub stall_factor: u32,
}

impl PollSettings {
    pub fn new(interval: Duration, watchdog_period: Duration) -> Self {
        Self {
            interval,
            watchdog_period,
            stall_factor: STALL_FACTOR,
        }
    }

    pub fn stall_threshold(&self) -> Duration {
        self.interval * self.stall_factor
    }
}

/// Everything needed to (re)spawn the loop of one task.
#[derive(Clone)]
struct TaskRunner {
    task: Arc<dyn PollTask>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
    last_check: Arc<Mutex<Instant>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskRunner {
    fn spawn(&self, initial_delay: Duration) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(initial_delay).await })
    }

    async fn run(mut self, initial_delay: Duration) {
        if !initial_delay.is_zero() && !self.wait(initial_delay).await {
            return;
        }
        loop {
            let name = self.task.name();
            match self.task.run_once().await {
                Ok(()) => {
                    debug!("Poll {} completed", name);
                    self.metrics.poll_completed(name);
                }
                Err(e) if e.is_retryable() => warn!("Poll {} failed: {}", name, e),
                Err(e) => error!("Poll {} failed: {}", name, e),
            }
            // Always rescheduled, whatever the outcome.
            *self.last_check.lock().await = self.clock.now();
            if !self.wait(self.interval).await {
                debug!("Poll {} shutting down", name);
                return;
            }
        }
    }

    /// Sleep for `delay`. Returns `false` when shutdown was requested.
    async fn wait(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => true,
            changed = self.shutdown_rx.changed() => changed.is_ok() && !*self.shutdown_rx.borrow(),
        }
    }
}

struct TaskSlot {
    runner: TaskRunner,
    handle: JoinHandle<()>,
    restarts: u32,
}

/// Builds and starts the periodic poll tasks.
pub struct PollDriver {
    settings: PollSettings,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
    tasks: Vec<(Arc<dyn PollTask>, Duration)>,
}

impl PollDriver {
    pub fn new(settings: PollSettings, clock: Arc<dyn Clock>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            settings,
            clock,
            metrics,
            tasks: Vec::new(),
        }
    }

    /// Add a task whose first cycle starts after `initial_delay`.
    pub fn task(mut self, task: Arc<dyn PollTask>, initial_delay: Duration) -> Self {
        self.tasks.push((task, initial_delay));
        self
    }

    /// Spawn every task plus the watchdog. Must be called inside a tokio runtime.
    pub fn start(self) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let now = self.clock.now();

        let slots: Vec<TaskSlot> = self
            .tasks
            .into_iter()
            .map(|(task, initial_delay)| {
                // Not stalled while still waiting out its stagger
                let runner = TaskRunner {
                    task,
                    interval: self.settings.interval,
                    clock: self.clock.clone(),
                    metrics: self.metrics.clone(),
                    last_check: Arc::new(Mutex::new(now + initial_delay)),
                    shutdown_rx: shutdown_rx.clone(),
                };
                let handle = runner.spawn(initial_delay);
                TaskSlot {
                    runner,
                    handle,
                    restarts: 0,
                }
            })
            .collect();
        info!(
            "Polling {} task(s) every {:?}",
            slots.len(),
            self.settings.interval
        );

        let slots = Arc::new(Mutex::new(slots));
        let watchdog = tokio::spawn(watchdog(
            slots.clone(),
            self.settings,
            self.clock,
            shutdown_rx,
        ));

        PollHandle {
            slots,
            watchdog: Some(watchdog),
            shutdown_tx,
        }
    }
}

/// Restart any task that has not completed a cycle within the stall threshold.
async fn watchdog(
    slots: Arc<Mutex<Vec<TaskSlot>>>,
    settings: PollSettings,
    clock: Arc<dyn Clock>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let threshold = settings.stall_threshold();
    loop {
        tokio::select! {
            _ = sleep(settings.watchdog_period) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Watchdog shutting down");
                    return;
                }
            }
        }

        let now = clock.now();
        let mut slots = slots.lock().await;
        for slot in slots.iter_mut() {
            let mut last_check = slot.runner.last_check.lock().await;
            let elapsed = now.saturating_duration_since(*last_check);
            if elapsed > threshold {
                warn!(
                    "Poll {} stalled for {:?}, restarting",
                    slot.runner.task.name(),
                    elapsed
                );
                slot.handle.abort();
                *last_check = now;
                drop(last_check);
                slot.handle = slot.runner.spawn(Duration::ZERO);
                slot.restarts += 1;
            }
        }
    }
}

/// Running poll tasks. Dropping the handle stops them at their next
/// scheduling point, same as [`shutdown`](PollHandle::shutdown).
pub struct PollHandle {
    slots: Arc<Mutex<Vec<TaskSlot>>>,
    watchdog: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl PollHandle {
    /// Number of times the watchdog restarted the named task.
    pub async fn restarts(&self, name: &str) -> u32 {
        let slots = self.slots.lock().await;
        slots
            .iter()
            .filter(|s| s.runner.task.name() == name)
            .map(|s| s.restarts)
            .sum()
    }

    /// Stop scheduling new cycles. A cycle already talking to the panel is
    /// left to finish on its own.
    pub async fn shutdown(mut self) {
        info!("Stopping poll tasks");
        let _ = self.shutdown_tx.send(true);
        if let Some(watchdog) = self.watchdog.take() {
            let _ = watchdog.await;
        }
    }
}
