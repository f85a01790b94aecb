use crate::{
    Block, BlockAllocator, BlockOutcome, Error, FallbackSearch, MAX_BLOCK, MembershipId,
    MembershipStore, MemoryStore, RandSource, SearchPhase, SearchPlan, StoreError,
    mock::{BrokenStore, CyclingRand, FixedRand},
};

fn block(index: u64) -> Block {
    Block::new(index).unwrap()
}

fn fill(store: &MemoryStore, blocks: impl IntoIterator<Item = u64>) {
    for index in blocks {
        store.reserve_block(block(index));
    }
}

fn first_ordinal_of(index: u64) -> u64 {
    index * 100 + 1
}

fn search<R: RandSource>(rng: R) -> FallbackSearch<R> {
    FallbackSearch::new(BlockAllocator::new(rng, 100), 10)
}

fn plan(primary: u64, window: u32) -> Vec<(SearchPhase, u32)> {
    SearchPlan::new(primary, window)
        .map(|(phase, block)| (phase, block.index()))
        .collect()
}

#[test]
fn plan_visits_forward_before_backward() {
    let steps = plan(50, 10);
    assert_eq!(steps.len(), 21);
    assert_eq!(steps[0], (SearchPhase::Primary, 50));
    assert_eq!(
        steps[1..=10],
        (51..=60).map(|i| (SearchPhase::Forward, i)).collect::<Vec<_>>()[..]
    );
    assert_eq!(
        steps[11..],
        (40..=49).rev().map(|i| (SearchPhase::Backward, i)).collect::<Vec<_>>()[..]
    );
}

#[test]
fn plan_stops_at_zero() {
    let steps = plan(0, 10);
    assert_eq!(steps.len(), 11);
    assert!(steps.iter().all(|(phase, _)| *phase != SearchPhase::Backward));

    let steps = plan(3, 10);
    let backward: Vec<_> = steps
        .iter()
        .filter(|(phase, _)| *phase == SearchPhase::Backward)
        .map(|(_, index)| *index)
        .collect();
    assert_eq!(backward, [2, 1, 0]);
}

#[test]
fn plan_stops_at_ceiling() {
    let steps = plan(MAX_BLOCK as u64 - 2, 10);
    let forward: Vec<_> = steps
        .iter()
        .filter(|(phase, _)| *phase == SearchPhase::Forward)
        .map(|(_, index)| *index)
        .collect();
    assert_eq!(forward, [MAX_BLOCK - 1, MAX_BLOCK]);
    assert!(steps.iter().all(|(_, index)| *index <= MAX_BLOCK));
}

#[test]
fn plan_past_ceiling_only_searches_in_range_blocks() {
    // Primary 1005 is out of range, as are 1000..=1004 going backward.
    let steps = plan(1005, 10);
    assert_eq!(
        steps,
        (995..=999)
            .rev()
            .map(|i| (SearchPhase::Backward, i))
            .collect::<Vec<_>>()
    );
    assert!(plan(5000, 10).is_empty());
}

#[test]
fn plan_with_zero_window_is_primary_only() {
    assert_eq!(plan(7, 0), [(SearchPhase::Primary, 7)]);
}

#[test]
fn block_allocator_returns_first_free_candidate() {
    let store = MemoryStore::new();
    let allocator = BlockAllocator::new(FixedRand(9), 100);

    let outcome = allocator.allocate_in_block(&store, block(4)).unwrap();
    assert_eq!(
        outcome,
        BlockOutcome::Found {
            id: MembershipId::from_suffix(410).unwrap(),
            attempts: 1
        }
    );
}

#[test]
fn block_allocator_retries_past_taken_slots() {
    let store = MemoryStore::new();
    for suffix in 1..=40 {
        store.reserve(MembershipId::from_suffix(suffix).unwrap());
    }
    let allocator = BlockAllocator::new(CyclingRand::default(), 100);

    let outcome = allocator.allocate_in_block(&store, block(0)).unwrap();
    assert_eq!(outcome.attempts(), 41);
    assert_eq!(outcome.found().map(|id| id.suffix()), Some(41));
}

#[test]
fn block_allocator_gives_up_after_max_attempts() {
    let store = MemoryStore::new();
    store.reserve(MembershipId::from_suffix(101).unwrap());
    // Always proposes the one taken slot.
    let allocator = BlockAllocator::new(FixedRand(0), 5);

    let outcome = allocator.allocate_in_block(&store, block(1)).unwrap();
    assert_eq!(outcome, BlockOutcome::Exhausted { attempts: 5 });
    assert!(!outcome.is_found());
}

#[test]
fn block_allocator_finds_last_free_slot() {
    let store = MemoryStore::new();
    for suffix in (801..=900).filter(|s| *s != 850) {
        store.reserve(MembershipId::from_suffix(suffix).unwrap());
    }
    let allocator = BlockAllocator::new(CyclingRand::default(), 100);

    let id = allocator.allocate_in_block(&store, block(8)).unwrap().found();
    assert_eq!(id.map(|id| id.suffix()), Some(850));
}

#[test]
fn block_allocator_propagates_store_failures() {
    let allocator = BlockAllocator::new(FixedRand(0), 100);
    let err = allocator
        .allocate_in_block(&BrokenStore::default(), block(0))
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }));
}

#[test]
fn search_uses_primary_block_when_free() {
    let store = MemoryStore::new();
    let allocation = search(CyclingRand::default())
        .search(&store, first_ordinal_of(12))
        .unwrap();

    assert_eq!(allocation.phase, SearchPhase::Primary);
    assert_eq!(allocation.block.index(), 12);
    assert_eq!(allocation.blocks_skipped, 0);
    assert!(allocation.id.is_in(block(12).range()));
    assert!(!allocation.used_fallback());
}

#[test]
fn search_falls_forward_before_backward() {
    let store = MemoryStore::new();
    fill(&store, [20]);

    let allocation = search(CyclingRand::default())
        .search(&store, first_ordinal_of(20))
        .unwrap();

    assert_eq!(allocation.phase, SearchPhase::Forward);
    assert_eq!(allocation.block.index(), 21);
    assert_eq!(allocation.blocks_skipped, 1);
}

#[test]
fn search_falls_backward_once_forward_window_is_full() {
    let store = MemoryStore::new();
    fill(&store, 20..=30);

    let allocation = search(CyclingRand::default())
        .search(&store, first_ordinal_of(20) + 57)
        .unwrap();

    assert_eq!(allocation.phase, SearchPhase::Backward);
    assert_eq!(allocation.block.index(), 19);
    assert_eq!(allocation.blocks_skipped, 11);
    assert!(allocation.used_fallback());
}

#[test]
fn search_at_the_ceiling_goes_backward() {
    let store = MemoryStore::new();
    fill(&store, [MAX_BLOCK as u64]);

    let allocation = search(CyclingRand::default())
        .search(&store, 100_000)
        .unwrap();

    assert_eq!(allocation.phase, SearchPhase::Backward);
    assert_eq!(allocation.block.index(), MAX_BLOCK - 1);
}

#[test]
fn search_reports_capacity_exhaustion() {
    let store = MemoryStore::new();
    fill(&store, 40..=60);
    let ordinal = first_ordinal_of(50);

    let err = search(CyclingRand::default())
        .search(&store, ordinal)
        .unwrap_err();

    assert_eq!(
        err,
        Error::CapacityExhausted {
            ordinal,
            primary_block: 50,
            blocks_searched: 21
        }
    );
}

#[test]
fn search_window_reaches_exactly_ten_blocks_back() {
    let store = MemoryStore::new();
    fill(&store, 41..=60);

    let allocation = search(CyclingRand::default())
        .search(&store, first_ordinal_of(50))
        .unwrap();

    assert_eq!(allocation.block.index(), 40);
    assert_eq!(allocation.blocks_skipped, 20);
}

#[test]
fn search_beyond_capacity_without_free_blocks_fails() {
    let store = MemoryStore::new();
    let err = search(CyclingRand::default())
        .search(&store, 600_000)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CapacityExhausted {
            blocks_searched: 0,
            ..
        }
    ));
}

#[test]
fn search_propagates_store_failures() {
    let err = search(FixedRand(0))
        .search(&BrokenStore::default(), 1)
        .unwrap_err();
    assert!(matches!(err, Error::Storage(StoreError::Unavailable { .. })));
}

#[test]
fn search_never_returns_taken_ids() {
    let store = MemoryStore::new();
    let search = search(crate::ThreadRandom);
    for index in 0..3 {
        for _ in 0..100 {
            let allocation = search.search(&store, first_ordinal_of(index)).unwrap();
            assert!(!store.exists(&allocation.id).unwrap());
            store.reserve(allocation.id);
        }
    }
    assert_eq!(store.taken(), 300);
}
