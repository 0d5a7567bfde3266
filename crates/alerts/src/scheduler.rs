//! Scheduler that runs update cycles on interval and daily triggers.
//!
//! All triggers feed the same [`Notifier::run_update`]. Cycles run inside the
//! scheduler task, one at a time; triggers that come due together fire once.

use crate::notifier::Notifier;
use buybot_core::Trigger;
use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffer size for scheduler commands.
pub const SCHEDULER_CHANNEL_BUFFER: usize = 32;

/// Change requested through a [`SchedulerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    Add(Trigger),
    Remove(Trigger),
}

/// Cloneable handle for registering triggers with a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Handle plus the receiving end, for driving a scheduler manually.
    pub fn channel() -> (Self, mpsc::Receiver<SchedulerCommand>) {
        let (tx, rx) = mpsc::channel(SCHEDULER_CHANNEL_BUFFER);
        (Self { tx }, rx)
    }

    pub async fn add(&self, trigger: Trigger) {
        if let Err(e) = self.tx.send(SchedulerCommand::Add(trigger)).await {
            warn!(trigger = %trigger, "Failed to register trigger: {}", e);
        }
    }

    pub async fn remove(&self, trigger: Trigger) {
        if let Err(e) = self.tx.send(SchedulerCommand::Remove(trigger)).await {
            warn!(trigger = %trigger, "Failed to remove trigger: {}", e);
        }
    }
}

/// Registered triggers with their next fire times.
#[derive(Debug, Clone)]
pub struct ScheduleTable<Tz: TimeZone> {
    entries: Vec<(Trigger, DateTime<Tz>)>,
}

impl<Tz: TimeZone> Default for ScheduleTable<Tz> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<Tz: TimeZone> ScheduleTable<Tz> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Returns false if it is already registered.
    pub fn add(&mut self, trigger: Trigger, now: &DateTime<Tz>) -> bool {
        if self.entries.iter().any(|(t, _)| *t == trigger) {
            return false;
        }
        self.entries.push((trigger, trigger.next_fire(now)));
        true
    }

    /// Unregister a trigger. Returns false if it was not registered.
    pub fn remove(&mut self, trigger: Trigger) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| *t != trigger);
        self.entries.len() != before
    }

    pub fn apply(&mut self, command: SchedulerCommand, now: &DateTime<Tz>) -> bool {
        match command {
            SchedulerCommand::Add(trigger) => self.add(trigger, now),
            SchedulerCommand::Remove(trigger) => self.remove(trigger),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest upcoming fire time.
    pub fn next_due(&self) -> Option<DateTime<Tz>> {
        self.entries.iter().map(|(_, at)| at.clone()).min()
    }

    /// Advance every trigger due at `now`. Returns how many were due.
    pub fn take_due(&mut self, now: &DateTime<Tz>) -> usize {
        let mut due = 0;
        for (trigger, at) in self.entries.iter_mut() {
            if *at <= *now {
                *at = trigger.next_fire(now);
                due += 1;
            }
        }
        due
    }
}

/// Start the scheduler task with the given initial triggers.
/// Returns a handle for adding triggers later and the task handle.
pub fn start_scheduler(
    triggers: Vec<Trigger>,
    notifier: Arc<Notifier>,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (handle, rx) = SchedulerHandle::channel();
    let task = tokio::spawn(run_scheduler(triggers, notifier, rx));
    (handle, task)
}

async fn run_scheduler(
    triggers: Vec<Trigger>,
    notifier: Arc<Notifier>,
    mut rx: mpsc::Receiver<SchedulerCommand>,
) {
    let mut table = ScheduleTable::new();
    let now = Local::now();
    for trigger in triggers {
        table.add(trigger, &now);
    }
    info!(triggers = table.len(), "Scheduler started");

    loop {
        let next = table.next_due();
        let sleep_for = next
            .map(|at| (at - Local::now()).to_std().unwrap_or(Duration::ZERO));

        tokio::select! {
            _ = sleep_or_forever(sleep_for) => {
                let Some(planned) = next else { continue };
                // Never fire earlier than planned, even if the wall clock lags the timer.
                let now = Local::now().max(planned);
                let due = table.take_due(&now);
                if due > 0 {
                    debug!(due = due, "Triggers fired");
                    let outcome = notifier.run_update().await;
                    debug!(?outcome, "Update cycle finished");
                }
            }
            command = rx.recv() => match command {
                Some(command) => {
                    if table.apply(command, &Local::now()) {
                        info!(?command, "Schedule changed");
                    }
                }
                None => {
                    info!("Scheduler handles dropped, stopping");
                    return;
                }
            },
        }
    }
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
