use crate::{
    config::LoadConfig,
    pool::{PoolError, SharedService, WorkRequest, WorkerPool},
    report::{Outcomes, Report, RunSummary},
};
use core::time::Duration;
use memberid::{AtomicCounter, MembershipIdService, MemoryStore, UserId, UserProfile};
use std::{sync::Arc, time::Instant};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

type Pending = Vec<(UserId, oneshot::Receiver<Result<memberid::Allocation, memberid::Error>>)>;

/// Builds the allocator, registers `config.registrations` users through the
/// worker pool and checks the result.
///
/// Cancelling `shutdown_token` stops dispatch; registrations already queued
/// still complete and are reported.
pub async fn run(config: LoadConfig, shutdown_token: CancellationToken) -> anyhow::Result<Report> {
    let service: SharedService = Arc::new(MembershipIdService::with_config(
        AtomicCounter::starting_at(config.start_ordinal),
        MemoryStore::new(),
        config.allocator,
    )?);

    for block in &config.prefill_blocks {
        let reserved = service.store().reserve_block(*block);
        tracing::info!(block = %block, range = %block.range(), reserved, "prefilled block");
    }

    let users: Vec<UserId> = (0..config.registrations)
        .map(|i| {
            service
                .store()
                .add_user(UserProfile::with_email(format!("member{i}@loadgen.local")))
        })
        .collect();

    let pool = WorkerPool::spawn(
        config.num_workers,
        config.queue_depth,
        &service,
        shutdown_token.clone(),
        Duration::from_secs(config.shutdown_timeout),
    );

    let started = Instant::now();
    let pending = dispatch(&pool, &users).await?;
    let dispatched = pending.len() as u64;
    let outcomes = collect(pending).await;
    let elapsed = started.elapsed();
    let interrupted = shutdown_token.is_cancelled();

    pool.shutdown().await;

    let mismatched = verify_stored(&service, &outcomes);
    let stats = service.stats()?;

    let summary = RunSummary {
        requested: config.registrations,
        dispatched,
        interrupted,
        elapsed,
        allocator: config.allocator,
    };
    Ok(Report::new(summary, outcomes, mismatched, stats))
}

async fn dispatch(pool: &WorkerPool, users: &[UserId]) -> anyhow::Result<Pending> {
    let mut pending = Vec::with_capacity(users.len());

    for &user_id in users {
        let (tx, rx) = oneshot::channel();
        match pool
            .send_to_next_worker(WorkRequest::Register {
                user_id,
                response: tx,
            })
            .await
        {
            Ok(()) => pending.push((user_id, rx)),
            Err(PoolError::ServiceShutdown) => {
                tracing::warn!(
                    dispatched = pending.len(),
                    remaining = users.len() - pending.len(),
                    "Shutdown requested, no further registrations dispatched"
                );
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(pending)
}

async fn collect(pending: Pending) -> Outcomes {
    let mut outcomes = Outcomes::with_capacity(pending.len());

    for (user_id, rx) in pending {
        match rx.await {
            Ok(Ok(allocation)) => outcomes.record_success(user_id, allocation),
            Ok(Err(err)) => outcomes.record_failure(user_id, &err),
            Err(_) => outcomes.record_dropped(user_id),
        }
    }

    outcomes
}

/// Returns the users whose stored membership ID is not the one their
/// registration reported.
fn verify_stored(service: &SharedService, outcomes: &Outcomes) -> Vec<UserId> {
    outcomes
        .allocations()
        .iter()
        .filter(|(user_id, allocation)| {
            !service
                .lookup_by_user_id(*user_id)
                .is_ok_and(|stored| stored == allocation.id)
        })
        .map(|(user_id, _)| *user_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memberid::{AllocatorConfig, Block};

    fn config(registrations: u64, prefill: &[u64]) -> LoadConfig {
        LoadConfig {
            registrations,
            num_workers: 4,
            allocator: AllocatorConfig::default(),
            start_ordinal: 0,
            prefill_blocks: prefill.iter().map(|i| Block::new(*i).unwrap()).collect(),
            queue_depth: 16,
            shutdown_timeout: 3,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn registers_everyone_without_duplicates() {
        let report = run(config(500, &[]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.registered, 500);
        assert_eq!(report.failed, 0);
        assert!(!report.interrupted);
        assert!(report.is_clean());
        assert_eq!(report.stats.assigned, 500);
        assert!(report.stats.current_ordinal >= 500);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn prefilled_primary_block_forces_fallback() {
        let report = run(config(50, &[0]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.registered, 50);
        assert_eq!(report.phases.primary, 0);
        assert_eq!(report.phases.forward, 50);
        assert!(report.is_clean());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_run_dispatches_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let report = run(config(100, &[]), token).await.unwrap();
        assert!(report.interrupted);
        assert_eq!(report.dispatched, 0);
        assert_eq!(report.registered, 0);
        assert_eq!(report.stats.total_users, 100);
    }
}
