//! In-process one-shot delayed jobs.
//!
//! A job is registered with a fire instant, runs exactly once on the tokio
//! runtime when that instant is reached, and is deregistered as soon as its
//! body completes, whatever the outcome. Nothing is persisted: jobs still
//! pending when the process exits are lost.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use tokio::{task::AbortHandle, time::Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a scheduled job. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Scheduled,
    Running,
    Cancelled,
}

struct JobEntry {
    state: Mutex<JobState>,
    abort: OnceLock<AbortHandle>,
}

impl JobEntry {
    fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `from -> to` atomically; returns false if the job was not in `from`.
    fn transition(&self, from: JobState, to: JobState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    fn finish(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = JobState::Cancelled;
    }
}

type Registry = Arc<Mutex<HashMap<Uuid, Arc<JobEntry>>>>;

fn deregister(registry: &Registry, id: &Uuid) {
    registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(id);
}

/// Marks the job terminal and drops it from the registry when the task ends,
/// including when the body panics or the task is aborted.
struct Cleanup {
    id: Uuid,
    entry: Arc<JobEntry>,
    registry: Registry,
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.entry.finish();
        deregister(&self.registry, &self.id);
        debug!(job_id = %self.id, "job deregistered");
    }
}

/// Registry of pending one-shot jobs. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct Scheduler {
    jobs: Registry,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `job` to run once at `fire_at`. The job receives its own id
    /// for log correlation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, fire_at: Instant, job: F) -> JobHandle
    where
        F: FnOnce(Uuid) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let entry = Arc::new(JobEntry {
            state: Mutex::new(JobState::Scheduled),
            abort: OnceLock::new(),
        });

        // Register before spawning so an already-due job can't deregister
        // itself ahead of its own registration.
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entry.clone());

        let cleanup = Cleanup {
            id,
            entry: entry.clone(),
            registry: self.jobs.clone(),
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(fire_at).await;
            if !cleanup
                .entry
                .transition(JobState::Scheduled, JobState::Running)
            {
                return;
            }
            debug!(job_id = %id, "job firing");
            job(id).await;
            debug!(job_id = %id, "job finished");
        });
        let _ = entry.abort.set(task.abort_handle());

        JobHandle {
            id,
            entry,
            registry: self.jobs.clone(),
        }
    }

    /// Number of jobs that have not yet reached their terminal state.
    pub fn pending(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle to a single scheduled job.
#[derive(Clone)]
pub struct JobHandle {
    id: Uuid,
    entry: Arc<JobEntry>,
    registry: Registry,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> JobState {
        self.entry.state()
    }

    /// Cancels a job that has not fired yet. Returns false if the job is
    /// already running or terminal; a running job is never interrupted.
    pub fn cancel(&self) -> bool {
        if !self
            .entry
            .transition(JobState::Scheduled, JobState::Cancelled)
        {
            warn!(job_id = %self.id, state = ?self.state(), "cancel ignored");
            return false;
        }
        if let Some(abort) = self.entry.abort.get() {
            abort.abort();
        }
        deregister(&self.registry, &self.id);
        debug!(job_id = %self.id, "job cancelled before firing");
        true
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
