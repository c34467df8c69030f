//! Background polling for due reminders.
//!
//! Runs on its own thread and never touches windows; it only reads from a
//! [`ReminderSource`] and hands due items to a [`NotificationSink`]. The loop
//! checks for cancellation at the top and again before each wait, and the wait
//! itself is a condvar timeout so `stop()` wakes it immediately.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: u64,
    pub content: String,
    /// 0 = normal, 1 = medium, 2 = high.
    pub priority: u8,
    pub due: SystemTime,
}

/// Where reminders come from (the application's todo store).
pub trait ReminderSource: Send {
    /// Reminders due at or before `now` that have not been marked yet.
    fn due_reminders(&mut self, now: SystemTime) -> anyhow::Result<Vec<Reminder>>;

    fn mark_reminded(&mut self, id: u64) -> anyhow::Result<()>;
}

/// Where due reminders go (toast, tray balloon, ...).
pub trait NotificationSink: Send {
    fn notify(&mut self, reminder: &Reminder) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct ScanControl {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl ScanControl {
    fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Waits up to `interval`; returns `true` if cancelled meanwhile.
    fn wait(&self, interval: Duration) -> bool {
        let mut cancelled = self.cancelled.lock();
        if !*cancelled {
            let _ = self.wake.wait_for(&mut cancelled, interval);
        }
        *cancelled
    }

    fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.wake.notify_all();
    }
}

pub struct ReminderScanner {
    control: Arc<ScanControl>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScanner {
    pub fn start<S, N>(source: S, sink: N, interval: Duration) -> anyhow::Result<Self>
    where
        S: ReminderSource + 'static,
        N: NotificationSink + 'static,
    {
        let control = Arc::new(ScanControl::default());
        let thread_control = Arc::clone(&control);
        let handle = thread::Builder::new()
            .name("reminder-scanner".into())
            .spawn(move || scan_loop(source, sink, interval, &thread_control))
            .context("spawning reminder scanner thread")?;
        info!("[Reminders] Scanner started (every {:?})", interval);
        Ok(Self { control, handle: Some(handle) })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the scanner and waits for its thread to exit.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.control.cancel();
        if handle.join().is_err() {
            error!("[Reminders] Scanner thread panicked");
        } else {
            info!("[Reminders] Scanner stopped");
        }
    }
}

impl Drop for ReminderScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scan_loop<S: ReminderSource, N: NotificationSink>(mut source: S, mut sink: N, interval: Duration, control: &ScanControl) {
    loop {
        if control.is_cancelled() {
            break;
        }
        if let Err(e) = scan_once(&mut source, &mut sink) {
            warn!("[Reminders] Scan failed: {:#}", e);
        }
        if control.is_cancelled() || control.wait(interval) {
            break;
        }
    }
    debug!("[Reminders] Scan loop exited");
}

/// Notifies every due reminder and marks it. A failing notification is not
/// marked, so it is retried on the next scan.
fn scan_once<S: ReminderSource, N: NotificationSink>(source: &mut S, sink: &mut N) -> anyhow::Result<()> {
    let due = source.due_reminders(SystemTime::now())?;
    for reminder in &due {
        if let Err(e) = sink.notify(reminder) {
            warn!("[Reminders] Notifying #{} failed: {:#}", reminder.id, e);
            continue;
        }
        source
            .mark_reminded(reminder.id)
            .with_context(|| format!("marking reminder #{}", reminder.id))?;
        info!("[Reminders] Sent reminder for #{}", reminder.id);
    }
    Ok(())
}
