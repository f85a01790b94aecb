//! Asynchronous worker pool for registrations.
//!
//! [`WorkerPool`] owns one bounded [`mpsc::Sender`] per worker task and hands
//! out [`WorkRequest`]s round-robin. A shared [`CancellationToken`] stops
//! dispatch as soon as shutdown begins.

use crate::pool::{PoolError, SharedService, WorkRequest, worker_loop};
use core::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Spawns `num_workers` tasks on the current runtime, each with a
    /// request queue of `queue_depth`.
    pub fn spawn(
        num_workers: usize,
        queue_depth: usize,
        service: &SharedService,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        let workers = (0..num_workers)
            .map(|worker_id| {
                let (tx, rx) = mpsc::channel(queue_depth);
                tokio::spawn(worker_loop(worker_id, rx, SharedService::clone(service)));
                tx
            })
            .collect();

        Self::new(workers, shutdown_token, shutdown_timeout)
    }

    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
        }
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends `request` to the next worker, waiting while its queue is full.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ServiceShutdown`] once the shutdown token is cancelled,
    ///   including while waiting for queue space.
    /// - [`PoolError::ChannelError`] if the worker has exited.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<(), PoolError> {
        if self.shutdown_token.is_cancelled() {
            return Err(PoolError::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        tokio::select! {
            () = self.shutdown_token.cancelled() => Err(PoolError::ServiceShutdown),
            sent = worker.send(request) => sent.map_err(|_| PoolError::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers.
    ///
    /// Cancels the token so no new work is dispatched, then sends
    /// [`WorkRequest::Shutdown`] to every worker. Requests already queued are
    /// processed first. Waits up to `shutdown_timeout` per worker for the
    /// acknowledgement.
    pub async fn shutdown(&self) {
        tracing::debug!("Cancelling dispatch via shutdown token");
        self.shutdown_token.cancel();

        let mut shutdown_handles = Vec::with_capacity(self.workers.len());
        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        for (i, rx) in shutdown_handles {
            match timeout(self.shutdown_timeout, rx).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::error!("Worker {i} returned error: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        }

        tracing::info!("Worker pool shutdown complete");
    }
}
