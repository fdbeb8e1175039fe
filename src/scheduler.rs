//! Serialized task execution with guarded delayed work.
//!
//! Every directory mutation runs on one worker task that drains a queue in
//! submission order, which gives the mutation stream sequential consistency
//! even though lifecycle events arrive concurrently.
//!
//! Delayed tasks are fire-and-forget and cannot be cancelled. A task that
//! depends on state which a later event may supersede carries a guard. The
//! guard is evaluated on the worker at fire time, immediately before the
//! task would run, and a false guard drops the task.

use crate::error::SchedulerError;
use crate::telemetry::spans;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, error};

type Guard = Box<dyn FnOnce() -> bool + Send>;

/// A unit of work plus the fire-time check that must still hold.
struct Deferred {
    label: &'static str,
    guard: Option<Guard>,
    task: BoxFuture<'static, ()>,
}

enum Job {
    Run(Deferred),
    Flush(oneshot::Sender<()>),
    Close,
}

/// Handle to the serialized execution context. Cheap to clone.
#[derive(Clone)]
pub struct TaskScheduler {
    tx: mpsc::UnboundedSender<Job>,
}

impl TaskScheduler {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(rx));
        Self { tx }
    }

    /// Queue `task` behind everything already submitted.
    pub fn run<F>(&self, label: &'static str, task: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit(Deferred {
            label,
            guard: None,
            task: task.boxed(),
        })
    }

    /// Queue `task` once `delay` has elapsed.
    pub fn run_delayed<F>(&self, label: &'static str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit_after(
            delay,
            Deferred {
                label,
                guard: None,
                task: task.boxed(),
            },
        );
    }

    /// Queue `task` once `delay` has elapsed, running it only if `guard`
    /// still holds when the worker reaches it.
    pub fn run_guarded<G, F>(&self, label: &'static str, delay: Duration, guard: G, task: F)
    where
        G: FnOnce() -> bool + Send + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit_after(
            delay,
            Deferred {
                label,
                guard: Some(Box::new(guard)),
                task: task.boxed(),
            },
        );
    }

    /// Resolves once everything queued before this call has run.
    pub async fn flush(&self) -> Result<(), SchedulerError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Job::Flush(done_tx))
            .map_err(|_| SchedulerError::Closed)?;
        done_rx.await.map_err(|_| SchedulerError::Closed)
    }

    /// Stop the worker once everything queued so far has run. Later
    /// submissions fail with [`SchedulerError::Closed`].
    pub fn close(&self) {
        let _ = self.tx.send(Job::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn submit(&self, deferred: Deferred) -> Result<(), SchedulerError> {
        self.tx
            .send(Job::Run(deferred))
            .map_err(|_| SchedulerError::Closed)
    }

    fn submit_after(&self, delay: Duration, deferred: Deferred) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Job::Run(deferred)).is_err() {
                debug!("Scheduler closed before delayed task fired");
            }
        });
    }
}

/// Worker loop: one job at a time, in queue order.
async fn drain(mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Run(deferred) => execute(deferred).await,
            Job::Flush(done) => {
                let _ = done.send(());
            }
            Job::Close => break,
        }
    }
    debug!("Scheduler worker stopped");
}

async fn execute(deferred: Deferred) {
    let Deferred { label, guard, task } = deferred;

    if let Some(guard) = guard
        && !guard()
    {
        debug!(task = label, "Skipping stale deferred task");
        crate::metrics::record_skipped(label);
        return;
    }

    // A panicking task must not take the worker down with it.
    if AssertUnwindSafe(task.instrument(spans::deferred_task(label)))
        .catch_unwind()
        .await
        .is_err()
    {
        error!(task = label, "Deferred task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn recorder() -> (
        Arc<Mutex<Vec<&'static str>>>,
        impl Fn(&'static str) -> BoxFuture<'static, ()>,
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let push = move |name: &'static str| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().push(name) }.boxed()
        };
        (log, push)
    }

    #[tokio::test]
    async fn runs_in_submission_order() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();

        scheduler.run("a", push("a")).unwrap();
        scheduler.run("b", push("b")).unwrap();
        scheduler.run("c", push("c")).unwrap();
        scheduler.flush().await.unwrap();

        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_tasks_fire_after_delay() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();

        scheduler.run_delayed("late", Duration::from_millis(100), push("late"));
        scheduler.run_delayed("early", Duration::from_millis(10), push("early"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.flush().await.unwrap();
        assert_eq!(*log.lock(), vec!["early"]);

        tokio::time::sleep(Duration::from_millis(60)).await;
        scheduler.flush().await.unwrap();
        assert_eq!(*log.lock(), vec!["early", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn guard_is_checked_at_fire_time() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();
        let valid = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&valid);
        scheduler.run_guarded(
            "guarded",
            Duration::from_millis(100),
            move || flag.load(Ordering::SeqCst),
            push("guarded"),
        );

        // Invalidate after scheduling but before firing.
        valid.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.flush().await.unwrap();

        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_passing_runs_task() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();

        scheduler.run_guarded("ok", Duration::from_millis(5), || true, push("ok"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.flush().await.unwrap();

        assert_eq!(*log.lock(), vec!["ok"]);
    }

    #[tokio::test]
    async fn panicking_task_does_not_stop_worker() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();

        let fail = true;
        scheduler
            .run("boom", async move {
                if fail {
                    panic!("collaborator failure");
                }
            })
            .unwrap();
        scheduler.run("after", push("after")).unwrap();
        scheduler.flush().await.unwrap();

        assert_eq!(*log.lock(), vec!["after"]);
    }

    #[tokio::test]
    async fn close_drains_queue_then_rejects() {
        let scheduler = TaskScheduler::spawn();
        let (log, push) = recorder();

        scheduler.run("queued", push("queued")).unwrap();
        scheduler.close();
        assert!(scheduler.flush().await.is_err());
        assert_eq!(*log.lock(), vec!["queued"]);
        assert!(scheduler.is_closed());
        assert!(matches!(
            scheduler.run("late", push("late")),
            Err(SchedulerError::Closed)
        ));
    }
}
