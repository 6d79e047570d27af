//! A dedicated background thread that computes edit scripts.
//!
//! The controller hands the worker `(old, new)` snapshot pairs tagged with a generation number
//! and later drains the finished scripts with [`crate::DataSourceController::poll`] or
//! [`crate::DataSourceController::wait`]. Results are delivered in submission order; the
//! controller discards any whose generation no longer matches the request it is waiting on.

use std::io;
use std::string::String;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded, unbounded};
use diffable::{EditScript, Identifier, Snapshot, diff};

const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Configuration for spawning a [`DiffWorker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Capacity of the job queue. Submissions beyond it are diffed on the caller's thread.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "diffable-worker".into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

pub(crate) struct DiffJob<S, I> {
    pub(crate) generation: u64,
    pub(crate) old: Snapshot<S, I>,
    pub(crate) new: Snapshot<S, I>,
}

pub(crate) struct DiffDone<S, I> {
    pub(crate) generation: u64,
    pub(crate) script: EditScript<S, I>,
}

/// Why a poll produced nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Idle {
    Empty,
    Disconnected,
}

/// Owns the background diffing thread. Dropping it closes the job queue and joins the thread.
pub struct DiffWorker<S, I> {
    jobs: Option<Sender<DiffJob<S, I>>>,
    results: Receiver<DiffDone<S, I>>,
    handle: Option<JoinHandle<()>>,
    name: String,
}

impl<S, I> core::fmt::Debug for DiffWorker<S, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiffWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl<S, I> DiffWorker<S, I>
where
    S: Identifier + Send + 'static,
    I: Identifier + Send + 'static,
{
    pub fn spawn() -> io::Result<Self> {
        Self::with_config(WorkerConfig::default())
    }

    pub fn with_config(config: WorkerConfig) -> io::Result<Self> {
        let (jobs, inbox) = bounded::<DiffJob<S, I>>(config.queue_capacity.max(1));
        let (outbox, results) = unbounded();
        let handle = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_loop(inbox, outbox))?;
        ddebug!(name = %config.name, "DiffWorker: spawned");
        Ok(Self {
            jobs: Some(jobs),
            results,
            handle: Some(handle),
            name: config.name,
        })
    }
}

impl<S, I> DiffWorker<S, I> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Queues a job; hands it back if the queue is full or the thread is gone.
    pub(crate) fn submit(&self, job: DiffJob<S, I>) -> Result<(), DiffJob<S, I>> {
        let Some(jobs) = &self.jobs else {
            return Err(job);
        };
        jobs.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) => {
                dwarn!("DiffWorker: job queue full");
                job
            }
            TrySendError::Disconnected(job) => {
                dwarn!("DiffWorker: worker thread is gone");
                job
            }
        })
    }

    pub(crate) fn try_recv(&self) -> Result<DiffDone<S, I>, Idle> {
        self.results.try_recv().map_err(|err| match err {
            TryRecvError::Empty => Idle::Empty,
            TryRecvError::Disconnected => Idle::Disconnected,
        })
    }

    pub(crate) fn recv(&self) -> Result<DiffDone<S, I>, Idle> {
        self.results.recv().map_err(|_| Idle::Disconnected)
    }
}

impl<S, I> Drop for DiffWorker<S, I> {
    fn drop(&mut self) {
        self.jobs = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            derror!("DiffWorker: worker thread panicked");
        }
    }
}

fn worker_loop<S: Identifier, I: Identifier>(
    inbox: Receiver<DiffJob<S, I>>,
    outbox: Sender<DiffDone<S, I>>,
) {
    while let Ok(job) = inbox.recv() {
        let script = diff(&job.old, &job.new);
        dtrace!(generation = job.generation, changes = script.len(), "DiffWorker: done");
        let done = DiffDone {
            generation: job.generation,
            script,
        };
        if outbox.send(done).is_err() {
            break;
        }
    }
}
