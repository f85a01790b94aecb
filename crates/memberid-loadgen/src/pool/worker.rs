use crate::pool::WorkRequest;
use memberid::{AtomicCounter, MembershipIdService, MemoryStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The allocator every worker registers through. One counter and one store
/// are shared by the whole pool, as they would be by every request handler
/// of a registration service.
pub type SharedService = Arc<MembershipIdService<AtomicCounter, MemoryStore>>;

/// Worker task processing [`WorkRequest`] messages until shutdown.
///
/// # Request Types
///
/// - [`WorkRequest::Register`]: runs [`MembershipIdService::assign`] and sends
///   the outcome back. A dropped receiver is ignored; the ID stays assigned.
/// - [`WorkRequest::Shutdown`]: acknowledges and exits the loop.
pub async fn worker_loop(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    service: SharedService,
) {
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Register { user_id, response } => {
                let outcome = service.assign(user_id);
                if let Err(err) = &outcome {
                    tracing::warn!(worker_id, user = %user_id, error = %err, "registration failed");
                }
                let _ = response.send(outcome);
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
