//! Captured execution contexts.
//!
//! A [`SyncContext`] is "the right thread to run something on": one named
//! OS thread draining a FIFO job queue. Marshaling onto it is either a
//! blocking [`send`](ContextHandle::send) (the caller waits for the closure
//! to finish on the servicing thread) or a non-blocking
//! [`post`](ContextHandle::post).
//!
//! Because a single thread services the queue, two sends into the same
//! context execute in submission order relative to each other. Posts carry
//! no caller-visible ordering guarantee beyond the queue itself.

use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, bounded, unbounded};

use crate::error::DispatchError;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    Run(Job),
    Stop,
}

/// Owner of a servicing thread. Dropping it (or calling
/// [`shutdown`](Self::shutdown)) stops the thread after the jobs already
/// queued have run.
#[derive(Debug)]
pub struct SyncContext {
    handle: ContextHandle,
    worker: Option<JoinHandle<()>>,
}

/// Cheap, cloneable handle for marshaling work onto a [`SyncContext`].
///
/// Handles outlive the context: once the servicing thread stops, every
/// `post`/`send` through any handle fails with
/// [`DispatchError::ContextClosed`].
#[derive(Debug, Clone)]
pub struct ContextHandle {
    jobs: Sender<Command>,
    worker_id: ThreadId,
}

impl SyncContext {
    /// Start a servicing thread with the given name.
    #[must_use]
    pub fn spawn(name: impl Into<String>) -> Self {
        let (jobs, inbox) = unbounded::<Command>();
        let (id_tx, id_rx) = bounded(1);
        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let _ = id_tx.send(thread::current().id());
                for command in inbox {
                    match command {
                        Command::Run(job) => job(),
                        Command::Stop => break,
                    }
                }
            })
            .expect("context servicing thread must spawn");
        let worker_id = id_rx.recv().expect("context servicing thread must start");

        Self {
            handle: ContextHandle { jobs, worker_id },
            worker: Some(worker),
        }
    }

    /// A handle for marshaling onto this context.
    #[must_use]
    pub fn handle(&self) -> ContextHandle {
        self.handle.clone()
    }

    /// Stop the servicing thread and wait for it to exit. Jobs queued
    /// before the shutdown still run; work submitted afterwards fails with
    /// [`DispatchError::ContextClosed`].
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.jobs.send(Command::Stop);
            let _ = worker.join();
        }
    }
}

impl Drop for SyncContext {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl ContextHandle {
    /// Non-blocking marshal: enqueue `job` and return immediately.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> Result<(), DispatchError> {
        self.jobs
            .send(Command::Run(Box::new(job)))
            .map_err(|_| DispatchError::ContextClosed)
    }

    /// Blocking marshal: run `job` on the servicing thread and return its
    /// value once it finished there.
    ///
    /// Called from the servicing thread itself, `job` runs inline instead
    /// of being queued — queueing would block the only thread able to
    /// drain the queue.
    pub fn send<R, F>(&self, job: F) -> Result<R, DispatchError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_servicing_thread() {
            return Ok(job());
        }

        let (done_tx, done_rx) = bounded(1);
        self.jobs
            .send(Command::Run(Box::new(move || {
                let _ = done_tx.send(job());
            })))
            .map_err(|_| DispatchError::ContextClosed)?;
        // The job was dropped unexecuted if the context stopped between
        // queueing and servicing; the closed ack channel reports that.
        done_rx.recv().map_err(|_| DispatchError::ContextClosed)
    }

    /// Whether the calling thread is this context's servicing thread.
    #[must_use]
    pub fn is_servicing_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    #[test]
    fn send_runs_on_the_servicing_thread_and_returns_the_value() {
        let ctx = SyncContext::spawn("ctx-send");
        let name = ctx
            .handle()
            .send(|| thread::current().name().map(String::from))
            .unwrap();
        assert_eq!(name.as_deref(), Some("ctx-send"));
    }

    #[test]
    fn queued_work_runs_in_submission_order() {
        let ctx = SyncContext::spawn("ctx-fifo");
        let handle = ctx.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let seen = seen.clone();
            handle.post(move || seen.lock().push(i)).unwrap();
        }
        // A send queued after the posts acts as a completion barrier.
        handle.send(|| ()).unwrap();

        assert_eq!(*seen.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn send_from_the_servicing_thread_runs_inline() {
        let ctx = SyncContext::spawn("ctx-reentrant");
        let handle = ctx.handle();
        let inner = handle.clone();

        let result = handle
            .send(move || {
                assert!(inner.is_servicing_thread());
                inner.send(|| 42)
            })
            .unwrap();
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn shutdown_drains_queued_work_then_rejects_new_work() {
        let ctx = SyncContext::spawn("ctx-shutdown");
        let handle = ctx.handle();
        let ran = Arc::new(AtomicU32::new(0));

        let counter = ran.clone();
        handle
            .post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        ctx.shutdown();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(matches!(
            handle.post(|| ()),
            Err(DispatchError::ContextClosed)
        ));
        assert!(matches!(
            handle.send(|| ()),
            Err(DispatchError::ContextClosed)
        ));
    }

    #[test]
    fn dropping_the_owner_stops_the_thread() {
        let ctx = SyncContext::spawn("ctx-drop");
        let handle = ctx.handle();
        drop(ctx);
        assert!(matches!(
            handle.post(|| ()),
            Err(DispatchError::ContextClosed)
        ));
    }
}
