use crate::{AssignmentCounts, BLOCK_SIZE, BlockRange};

/// Read-only aggregate for operational dashboards.
///
/// The counter and the assignment counts are read independently and are not
/// reconciled: a user created without a profile, or an ordinal consumed by an
/// abandoned request, makes them drift apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MembershipStats {
    #[cfg_attr(feature = "serde", serde(rename = "totalUsers"))]
    pub total_users: u64,
    #[cfg_attr(feature = "serde", serde(rename = "usersWithMembershipId"))]
    pub assigned: u64,
    #[cfg_attr(feature = "serde", serde(rename = "usersWithoutMembershipId"))]
    pub unassigned: u64,
    #[cfg_attr(feature = "serde", serde(rename = "currentUserCount"))]
    pub current_ordinal: u64,
    #[cfg_attr(feature = "serde", serde(rename = "currentBlock"))]
    pub current_block: u64,
    #[cfg_attr(feature = "serde", serde(rename = "currentBlockRange"))]
    pub block_range: BlockRange,
    #[cfg_attr(feature = "serde", serde(rename = "blocksInUse"))]
    pub blocks_in_use: u64,
}

impl MembershipStats {
    pub fn new(counts: AssignmentCounts, current_ordinal: u64) -> Self {
        let block_size = u64::from(BLOCK_SIZE);
        let (current_block, blocks_in_use) = match current_ordinal {
            0 => (0, 0),
            n => ((n - 1) / block_size, (n - 1) / block_size + 1),
        };

        Self {
            total_users: counts.total_users,
            assigned: counts.assigned,
            unassigned: counts.total_users.saturating_sub(counts.assigned),
            current_ordinal,
            current_block,
            block_range: BlockRange::nominal(current_block),
            blocks_in_use,
        }
    }
}
