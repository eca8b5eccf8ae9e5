//! Gestion des streams GPU
//!
//! A stream is an ordered queue of device work. The emulated device runs each
//! stream on its own worker thread: work is asynchronous with respect to the
//! host until the host synchronizes.

use crate::error::GpuBackendError;
use crate::memory::DevicePtr;
use log::{debug, error, trace, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

type KernelJob = Box<dyn FnOnce() -> Result<(), GpuBackendError> + Send + 'static>;
type MarkerJob = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    /// Device work. Skipped when one of `reads` is faulted; on failure every
    /// block in `writes` is faulted. `reply` receives the outcome of blocking launches.
    Launch {
        kernel: String,
        reads: Vec<DevicePtr>,
        writes: Vec<DevicePtr>,
        job: KernelJob,
        reply: Option<Sender<Result<(), GpuBackendError>>>,
    },
    /// Bookkeeping that always runs in order (events, barriers).
    Marker(MarkerJob),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct GpuStream {
    name: String,
    sender: Mutex<Option<Sender<Command>>>,
    worker: Option<JoinHandle<()>>,
    sticky_error: Arc<Mutex<Option<GpuBackendError>>>,
    non_blocking: bool,
}

impl GpuStream {
    /// Spawns the worker thread backing a new stream.
    ///
    /// With `non_blocking == false`, every launch waits for its own completion
    /// before returning, which is handy when debugging kernels.
    pub fn new(name: &str, non_blocking: bool) -> Result<Self, GpuBackendError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let sticky_error = Arc::new(Mutex::new(None));
        let worker_error = Arc::clone(&sticky_error);
        let worker_name = name.to_string();
        let worker = thread::Builder::new()
            .name(format!("neuraslice-stream-{}", name))
            .spawn(move || run_worker(&worker_name, receiver, worker_error))
            .map_err(|e| GpuBackendError::StreamClosed(format!("{} (spawn failed: {})", name, e)))?;
        debug!("Created GPU stream '{}' (non_blocking={})", name, non_blocking);
        Ok(GpuStream {
            name: name.to_string(),
            sender: Mutex::new(Some(sender)),
            worker: Some(worker),
            sticky_error,
            non_blocking,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a kernel reading the blocks behind `reads` and writing those behind `writes`.
    ///
    /// Returns as soon as the work is queued unless the stream is blocking, in
    /// which case it waits and reports this kernel's own outcome.
    pub fn launch<F>(
        &self,
        kernel: &str,
        reads: &[DevicePtr],
        writes: &[DevicePtr],
        job: F,
    ) -> Result<(), GpuBackendError>
    where
        F: FnOnce() -> Result<(), GpuBackendError> + Send + 'static,
    {
        trace!("Stream '{}': enqueue kernel '{}'", self.name, kernel);
        let (reply, outcome) = if self.non_blocking {
            (None, None)
        } else {
            let (tx, rx) = mpsc::channel();
            (Some(tx), Some(rx))
        };
        self.submit(Command::Launch {
            kernel: kernel.to_string(),
            reads: reads.to_vec(),
            writes: writes.to_vec(),
            job: Box::new(job),
            reply,
        })?;
        match outcome {
            Some(rx) => rx
                .recv()
                .map_err(|_| GpuBackendError::StreamClosed(self.name.clone()))?,
            None => Ok(()),
        }
    }

    /// Enqueues a marker that runs after all previously submitted work, even if it failed.
    pub(crate) fn enqueue_marker<F>(&self, marker: F) -> Result<(), GpuBackendError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Command::Marker(Box::new(marker)))
    }

    /// Blocks until every submitted kernel has finished, leaving any kernel error in place.
    ///
    /// Host reads use this: whether the data they map is valid is recorded on
    /// the block itself.
    pub fn wait(&self) -> Result<(), GpuBackendError> {
        let (done_tx, done_rx) = mpsc::channel::<()>();
        self.enqueue_marker(move || {
            let _ = done_tx.send(());
        })?;
        done_rx
            .recv()
            .map_err(|_| GpuBackendError::StreamClosed(self.name.clone()))
    }

    /// Blocks until every submitted kernel has finished.
    ///
    /// # Errors
    /// Reports (and clears) the first error of a non-blocking kernel raised since
    /// the last synchronization. The blocks that kernel wrote stay faulted.
    pub fn synchronize(&self) -> Result<(), GpuBackendError> {
        self.wait()?;
        match lock(&self.sticky_error).take() {
            Some(e) => {
                error!("Stream '{}' reported a kernel error: {}", self.name, e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn submit(&self, command: Command) -> Result<(), GpuBackendError> {
        let guard = lock(&self.sender);
        let sender = guard
            .as_ref()
            .ok_or_else(|| GpuBackendError::StreamClosed(self.name.clone()))?;
        sender
            .send(command)
            .map_err(|_| GpuBackendError::StreamClosed(self.name.clone()))
    }
}

impl Drop for GpuStream {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit.
        lock(&self.sender).take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Worker thread of stream '{}' panicked", self.name);
            }
        }
        debug!("Destroyed GPU stream '{}'", self.name);
    }
}

fn run_worker(name: &str, receiver: Receiver<Command>, sticky_error: Arc<Mutex<Option<GpuBackendError>>>) {
    for command in receiver {
        match command {
            Command::Launch {
                kernel,
                reads,
                writes,
                job,
                reply,
            } => {
                let outcome = match reads.iter().find(|ptr| ptr.fault().is_some()) {
                    Some(faulted) => {
                        warn!(
                            "Stream '{}': skipping kernel '{}', input block {} is faulted",
                            name,
                            kernel,
                            faulted.id()
                        );
                        Err(GpuBackendError::KernelFailed {
                            kernel: kernel.clone(),
                            reason: format!("input block {} was produced by a failed kernel", faulted.id()),
                        })
                    }
                    None => catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
                        Err(GpuBackendError::KernelFailed {
                            kernel: kernel.clone(),
                            reason: "kernel panicked".to_string(),
                        })
                    }),
                };
                match &outcome {
                    Ok(()) => trace!("Stream '{}': kernel '{}' completed", name, kernel),
                    Err(e) => {
                        error!("Stream '{}': kernel '{}' failed: {}", name, kernel, e);
                        for ptr in &writes {
                            ptr.mark_faulted(e.clone());
                        }
                    }
                }
                match reply {
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => {
                        if let Err(e) = outcome {
                            lock(&sticky_error).get_or_insert(e);
                        }
                    }
                }
            }
            Command::Marker(marker) => marker(),
        }
    }
    trace!("Stream '{}': worker exiting", name);
}
