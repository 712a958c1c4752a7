//! Synchronous execution bridge.
//!
//! Every blocking adapter call funnels through [`run_sync`], which drives one
//! asynchronous driver operation to completion and hands the result back on
//! the calling thread. Two paths:
//!
//! - Clean: the calling thread hosts no tokio runtime. A throwaway
//!   current-thread runtime is built, the operation is blocked on, and the
//!   runtime is dropped before returning. No runtime outlives the call.
//! - Reentrant: the calling thread is already inside a runtime. Blocking that
//!   runtime with a nested `block_on` would deadlock, so the operation is
//!   shipped to a dedicated worker thread that owns its own runtime, and the
//!   caller parks on a channel until the worker reports back.
//!
//! The operation is a factory rather than a future so that nothing starts
//! executing before a scheduler is in place, on whichever thread ends up
//! driving it. There is no mid-flight cancellation: a caller that abandons
//! the wait abandons the wait, not the work.

use std::future::Future;
use std::sync::OnceLock;
use std::sync::mpsc;
use std::thread;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce(&Runtime) + Send>;

/// Run `op` to completion and return its output synchronously.
///
/// The result or error comes back unchanged; the bridge never returns while
/// the operation is still suspended.
pub fn run_sync<F, Fut, T>(op: F) -> Result<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>>,
    T: Send + 'static,
{
    // Explicit capability query on the current execution context, not an
    // exception probe: a live handle means a scheduler is already running
    // on this thread.
    if Handle::try_current().is_ok() {
        tracing::debug!("bridge dispatch: reentrant path");
        shared_worker()?.run(op)
    } else {
        tracing::debug!("bridge dispatch: clean path");
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Bridge(format!("failed to build runtime: {e}")))?;
        rt.block_on(op())
    }
}

/// Dedicated single worker used by all reentrant calls.
///
/// Spawned lazily on first use and bounded at one thread; jobs from
/// concurrent reentrant callers are serialized through its channel. The
/// worker exits when the last sender drops.
struct Worker {
    jobs: mpsc::Sender<Job>,
}

static WORKER: OnceLock<Worker> = OnceLock::new();

fn shared_worker() -> Result<&'static Worker> {
    if let Some(worker) = WORKER.get() {
        return Ok(worker);
    }
    let spawned = Worker::spawn()?;
    // A lost init race drops the extra worker's sender, so its thread sees a
    // disconnected channel and exits.
    Ok(WORKER.get_or_init(|| spawned))
}

impl Worker {
    fn spawn() -> Result<Worker> {
        // Built on the initiating thread so a creation failure surfaces to
        // the caller that needed the worker, before any operation runs.
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Bridge(format!("failed to build worker runtime: {e}")))?;
        let (jobs, inbox) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("libsql-blocking-bridge".into())
            .spawn(move || {
                while let Ok(job) = inbox.recv() {
                    job(&rt);
                }
            })
            .map_err(|e| Error::Bridge(format!("failed to spawn worker thread: {e}")))?;
        Ok(Worker { jobs })
    }

    fn run<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>>,
        T: Send + 'static,
    {
        let (done, outcome) = mpsc::channel();
        let job: Job = Box::new(move |rt| {
            let _ = done.send(rt.block_on(op()));
        });
        self.jobs
            .send(job)
            .map_err(|_| Error::Bridge("bridge worker is gone".into()))?;
        outcome
            .recv()
            .map_err(|_| Error::Bridge("bridge worker dropped the operation".into()))?
    }
}
