use memberid::{Allocation, UserId};
use tokio::sync::oneshot;

/// A message for a pool worker.
#[derive(Debug)]
pub enum WorkRequest {
    /// Assign a membership ID to `user_id` and report the outcome.
    Register {
        user_id: UserId,
        response: oneshot::Sender<Result<Allocation, memberid::Error>>,
    },
    /// Stop the worker. It acknowledges on `response` before exiting.
    Shutdown { response: oneshot::Sender<()> },
}
