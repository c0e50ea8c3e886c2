//! Runs conversions in the background, one at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("A conversion is already running")]
    Busy,
    #[error("Could not start worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Worker panicked")]
    Panicked,
}

/// An executor with a single slot.
///
/// [`Self::submit`] hands the job to a new worker thread. Until that job has
/// returned (or panicked) every other submission is refused with
/// [`ExecutorError::Busy`].
#[derive(Clone, Debug, Default)]
pub struct SingleSlot {
    busy: Arc<AtomicBool>,
}

impl SingleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts `job` on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Busy`] while another job is in flight, or
    /// [`ExecutorError::Spawn`] if the thread can't be created.
    pub fn submit<T, F>(&self, job: F) -> Result<JobHandle<T>, ExecutorError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ExecutorError::Busy);
        }

        let slot = SlotGuard(Arc::clone(&self.busy));
        let handle = thread::Builder::new()
            .name("docbook2epub-worker".to_string())
            .spawn(move || {
                let _slot = slot;
                job()
            });

        match handle {
            Ok(handle) => Ok(JobHandle { handle }),
            // the closure, and the guard with it, was dropped by spawn
            Err(e) => Err(ExecutorError::Spawn(e)),
        }
    }
}

// Frees the slot when the job ends, unwinding included.
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    handle: JoinHandle<T>,
}

impl<T> JobHandle<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Panicked`] if the job panicked.
    pub fn join(self) -> Result<T, ExecutorError> {
        self.handle.join().map_err(|_| ExecutorError::Panicked)
    }
}
