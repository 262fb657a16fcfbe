use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info};

use crate::core::error::{Error, ErrorKind, Result};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Bounded FIFO worker pool.
///
/// `enqueue` blocks while the queue is full, which back-pressures the
/// reactor. `shutdown` lets queued tasks drain before joining;
/// `force_shutdown` discards them. Worker panics are caught and logged and
/// never take a pool thread down.
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    receiver: Receiver<Task>,
    workers: Vec<JoinHandle<()>>,
    discard: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(thread_num: usize, queue_size: usize) -> Self {
        let (sender, receiver) = bounded::<Task>(queue_size.max(1));
        let discard = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(thread_num.max(1));
        for id in 0..thread_num.max(1) {
            let receiver = receiver.clone();
            let discard = discard.clone();
            workers.push(
                thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn(move || worker_loop(id, receiver, discard))
                    .expect("failed to spawn worker thread"),
            );
        }

        info!(threads = workers.len(), queue = queue_size, "worker pool started");
        WorkerPool {
            sender: Some(sender),
            receiver,
            workers,
            discard,
        }
    }

    /// Blocks while the queue is full.
    pub fn enqueue(&self, task: Task) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Internal, "worker pool is shut down"))?;
        sender
            .send(task)
            .map_err(|_| Error::new(ErrorKind::Internal, "worker pool queue is closed"))
    }

    /// Signal termination, let every queued task run, then join.
    pub fn shutdown(&mut self) {
        debug!("worker pool draining");
        self.sender.take(); // closes the queue; workers exit on empty
        self.join_workers();
        info!("worker pool stopped");
    }

    /// Clear the queue and join immediately; queued tasks never run.
    pub fn force_shutdown(&mut self) {
        self.discard.store(true, Ordering::SeqCst);
        while self.receiver.try_recv().is_ok() {}
        self.sender.take();
        self.join_workers();
        info!("worker pool force-stopped");
    }

    fn join_workers(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}

fn worker_loop(id: usize, receiver: Receiver<Task>, discard: Arc<AtomicBool>) {
    while let Ok(task) = receiver.recv() {
        if discard.load(Ordering::SeqCst) {
            continue;
        }
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(worker = id, "task panicked; worker continues");
        }
    }
}
