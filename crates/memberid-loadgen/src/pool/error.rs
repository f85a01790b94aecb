/// Failures dispatching work to the pool.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PoolError {
    /// Shutdown was requested; no new work is accepted.
    #[error("Worker pool is shutting down")]
    ServiceShutdown,

    /// A worker's channel closed unexpectedly.
    #[error("Channel error: {context}")]
    ChannelError { context: String },
}
