//! Single-slot background worker for history load/save.

use std::sync::Mutex;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTask {
    Load,
    Save,
}

impl SyncTask {
    fn thread_name(self) -> &'static str {
        match self {
            SyncTask::Load => "henkan-history-load",
            SyncTask::Save => "henkan-history-save",
        }
    }
}

/// At most one worker runs at a time. Starting a task while another is in
/// flight is a no-op.
#[derive(Debug, Default)]
pub struct Syncer {
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl Syncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a worker is in flight. A finished worker is reaped.
    pub fn is_running(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(handle) if !handle.is_finished() => true,
            Some(_) => {
                if let Some(handle) = slot.take() {
                    join(handle);
                }
                false
            }
            None => false,
        }
    }

    /// Start `work` unless a worker is already running. Returns whether a
    /// new worker was started.
    pub fn spawn<F>(&self, task: SyncTask, work: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.as_ref() {
            if !handle.is_finished() {
                tracing::debug!(?task, "syncer busy, request dropped");
                return false;
            }
        }
        if let Some(finished) = slot.take() {
            join(finished);
        }
        match thread::Builder::new()
            .name(task.thread_name().to_owned())
            .spawn(work)
        {
            Ok(handle) => {
                *slot = Some(handle);
                true
            }
            Err(e) => {
                tracing::error!(?task, error = %e, "failed to start syncer thread");
                false
            }
        }
    }

    /// Block until the in-flight worker, if any, completes.
    pub fn wait(&self) {
        let handle = self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            join(handle);
        }
    }
}

fn join(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::error!("syncer thread panicked");
    }
}
