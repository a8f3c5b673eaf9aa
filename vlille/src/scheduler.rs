//! Out-of-line execution of deferred continuations.
//!
//! A [`Scheduler`] is a cheap handle onto a FIFO queue of jobs. A job never
//! runs inside the call that enqueued it: it runs later, when the owning
//! [`JobQueue`] is driven, either by hand with [`JobQueue::run_pending`] or
//! by a tokio task via [`JobQueue::run`].

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::trace;

/// A unit of deferred work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle used to enqueue continuations.
///
/// Clones share the same queue, so jobs enqueued through any clone run in
/// the order they were enqueued.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Job>,
}

/// The receiving end of a [`Scheduler`].
#[derive(Debug)]
pub struct JobQueue {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl Scheduler {
    /// Create a scheduler together with the queue that executes its jobs.
    pub fn channel() -> (Self, JobQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, JobQueue { rx })
    }

    /// Create a scheduler whose queue is drained by a task on `runtime`.
    ///
    /// The task finishes once every clone of the scheduler (including the
    /// ones held by deferred values) has been dropped.
    pub fn spawn_on(runtime: &Handle) -> Self {
        let (scheduler, queue) = Self::channel();
        runtime.spawn(queue.run());
        scheduler
    }

    /// Enqueue a job for later execution.
    pub(crate) fn schedule(&self, job: Job) {
        if self.tx.send(job).is_err() {
            trace!("job queue closed, dropping continuation");
        }
    }
}

impl JobQueue {
    /// Run every queued job, including jobs enqueued while running, until
    /// the queue is empty. Returns the number of jobs executed.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs as they arrive until every [`Scheduler`] has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        trace!("all schedulers dropped, job queue finished");
    }
}
