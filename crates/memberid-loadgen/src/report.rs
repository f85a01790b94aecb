use core::time::Duration;
use memberid::{
    Allocation, AllocatorConfig, MembershipId, MembershipStats, SearchPhase, UserId,
};
use serde::Serialize;
use std::collections::HashMap;

/// Allocation counts per search phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCounts {
    pub primary: u64,
    pub forward: u64,
    pub backward: u64,
}

impl PhaseCounts {
    fn record(&mut self, phase: SearchPhase) {
        match phase {
            SearchPhase::Primary => self.primary += 1,
            SearchPhase::Forward => self.forward += 1,
            SearchPhase::Backward => self.backward += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub user_id: UserId,
    pub error: String,
    pub retryable: bool,
}

/// Registration outcomes gathered while the run is in progress.
#[derive(Debug, Default)]
pub struct Outcomes {
    holders: HashMap<MembershipId, UserId>,
    allocations: Vec<(UserId, Allocation)>,
    duplicates: Vec<MembershipId>,
    phases: PhaseCounts,
    blocks_skipped: u64,
    failures: Vec<Failure>,
}

impl Outcomes {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            holders: HashMap::with_capacity(n),
            allocations: Vec::with_capacity(n),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, user_id: UserId, allocation: Allocation) {
        if let Some(previous) = self.holders.insert(allocation.id, user_id) {
            tracing::error!(
                id = %allocation.id,
                first = %previous,
                second = %user_id,
                "membership id issued twice"
            );
            self.duplicates.push(allocation.id);
        }
        self.phases.record(allocation.phase);
        self.blocks_skipped += allocation.blocks_skipped as u64;
        self.allocations.push((user_id, allocation));
    }

    pub fn record_failure(&mut self, user_id: UserId, error: &memberid::Error) {
        self.failures.push(Failure {
            user_id,
            error: error.to_string(),
            retryable: error.is_retryable(),
        });
    }

    pub fn record_dropped(&mut self, user_id: UserId) {
        self.failures.push(Failure {
            user_id,
            error: "worker exited before responding".to_owned(),
            retryable: true,
        });
    }

    /// Successful registrations, in completion order.
    pub fn allocations(&self) -> &[(UserId, Allocation)] {
        &self.allocations
    }
}

/// The JSON document printed at the end of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub requested: u64,
    pub dispatched: u64,
    pub registered: u64,
    pub failed: u64,
    pub interrupted: bool,
    pub elapsed_ms: u64,
    pub registrations_per_sec: f64,
    pub phases: PhaseCounts,
    pub fallback_blocks_skipped: u64,
    pub duplicates: Vec<MembershipId>,
    /// Users whose stored ID differs from the one their registration returned.
    pub mismatched: Vec<UserId>,
    pub failures: Vec<Failure>,
    pub allocator: AllocatorConfig,
    pub stats: MembershipStats,
}

pub struct RunSummary {
    pub requested: u64,
    pub dispatched: u64,
    pub interrupted: bool,
    pub elapsed: Duration,
    pub allocator: AllocatorConfig,
}

impl Report {
    pub fn new(
        summary: RunSummary,
        outcomes: Outcomes,
        mismatched: Vec<UserId>,
        stats: MembershipStats,
    ) -> Self {
        let registered = outcomes.allocations.len() as u64;
        let secs = summary.elapsed.as_secs_f64();
        let registrations_per_sec = if secs > 0.0 {
            registered as f64 / secs
        } else {
            0.0
        };

        Self {
            requested: summary.requested,
            dispatched: summary.dispatched,
            registered,
            failed: outcomes.failures.len() as u64,
            interrupted: summary.interrupted,
            elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            registrations_per_sec,
            phases: outcomes.phases,
            fallback_blocks_skipped: outcomes.blocks_skipped,
            duplicates: outcomes.duplicates,
            mismatched,
            failures: outcomes.failures,
            allocator: summary.allocator,
            stats,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.mismatched.is_empty()
    }
}
