use std::collections::BTreeSet;
use std::ops::Range;

use crate::*;
use proptest::prelude::*;

/// Upper bound of the index universe. Small enough that exhaustive
/// membership checks over `0..UNIVERSE` stay fast.
const UNIVERSE: u64 = 600;

#[derive(Clone, Debug)]
enum Op {
    Insert(Range<u64>),
    Remove(Range<u64>),
    Clear,
}

fn arb_range() -> impl Strategy<Value = Range<u64>> {
    (0..UNIVERSE, 0u64..80).prop_map(|(start, length)| start..(start + length).min(UNIVERSE))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        10 => arb_range().prop_map(Op::Insert),
        8 => arb_range().prop_map(Op::Remove),
        1 => Just(Op::Clear),
    ]
}

fn arb_stride() -> impl Strategy<Value = u64> {
    prop_oneof![Just(1u64), Just(2), Just(3), Just(7), Just(16), Just(HINT_STRIDE)]
}

fn apply(set: &mut IndexSet, model: &mut BTreeSet<u64>, op: &Op) {
    match op {
        Op::Insert(range) => {
            set.insert_range(range.clone()).unwrap();
            model.extend(range.clone());
        }
        Op::Remove(range) => {
            set.remove_range(range.clone()).unwrap();
            for i in range.clone() {
                model.remove(&i);
            }
        }
        Op::Clear => {
            set.clear();
            model.clear();
        }
    }
}

/// Group the model's indices into maximal ranges.
fn model_ranges(model: &BTreeSet<u64>) -> Vec<Range<u64>> {
    let mut ranges: Vec<Range<u64>> = Vec::new();
    for &i in model {
        match ranges.last_mut() {
            Some(last) if last.end == i => last.end = i + 1,
            _ => ranges.push(i..i + 1),
        }
    }
    ranges
}

fn build(stride: u64, ops: &[Op]) -> (IndexSet, BTreeSet<u64>) {
    let mut set = IndexSet::with_hint_stride(stride).unwrap();
    let mut model = BTreeSet::new();
    for op in ops {
        apply(&mut set, &mut model, op);
    }
    (set, model)
}

// ===== Mutation sequences =====

proptest! {
    #[test]
    fn ops_match_btreeset(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..48),
    ) {
        let mut set = IndexSet::with_hint_stride(stride).unwrap();
        let mut model = BTreeSet::new();

        for op in &ops {
            apply(&mut set, &mut model, op);
            set.check_invariants();
            prop_assert_eq!(set.len(), model.len() as u64, "after {:?}", op);
        }

        for i in 0..UNIVERSE + 2 {
            prop_assert_eq!(set.contains(i), model.contains(&i), "contains({})", i);
        }
        prop_assert_eq!(set.iter().collect::<Vec<_>>(), model.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(set.min(), model.first().copied());
        prop_assert_eq!(set.max(), model.last().copied());
        prop_assert_eq!(set.frontier(), model.last().map_or(0, |i| i + 1));
    }

    #[test]
    fn ops_far_from_zero_match_btreeset(
        stride in arb_stride(),
        base in prop_oneof![Just(1u64 << 40), Just((1u64 << 63) - 300), Just(u64::MAX - UNIVERSE - 1)],
        ops in proptest::collection::vec(arb_op(), 0..32),
    ) {
        let mut set = IndexSet::with_hint_stride(stride).unwrap();
        let mut model = BTreeSet::new();

        for op in &ops {
            let shifted = match op {
                Op::Insert(range) => Op::Insert(base + range.start..base + range.end),
                Op::Remove(range) => Op::Remove(base + range.start..base + range.end),
                Op::Clear => Op::Clear,
            };
            apply(&mut set, &mut model, &shifted);
            set.check_invariants();
        }

        for i in base..base + UNIVERSE + 1 {
            prop_assert_eq!(set.contains(i), model.contains(&i), "contains({})", i);
        }
        // Everything below `base` is one absent run, or past the frontier.
        prop_assert_eq!(set.run_start_for(base - 1), 0);
        prop_assert_eq!(set.ranges().collect::<Vec<_>>(), model_ranges(&model));

        let runs = 2 * set.ranges().count() + 1;
        prop_assert!(set.entries.len() <= runs * (1 + 64 * HINT_FANOUT as usize));
    }

    #[test]
    fn ranges_are_maximal(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..48),
    ) {
        let (set, model) = build(stride, &ops);
        prop_assert_eq!(set.ranges().collect::<Vec<_>>(), model_ranges(&model));
    }

    #[test]
    fn stride_does_not_change_contents(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..48),
    ) {
        let (small, _) = build(stride, &ops);
        let (default, _) = build(HINT_STRIDE, &ops);
        prop_assert_eq!(&small, &default);
    }
}

// ===== Idempotence and inverses =====

proptest! {
    #[test]
    fn insert_is_idempotent(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        range in arb_range(),
    ) {
        let (mut set, _) = build(stride, &ops);
        set.insert_range(range.clone()).unwrap();
        let once = set.dump();
        set.insert_range(range).unwrap();
        prop_assert_eq!(set.dump(), once);
    }

    #[test]
    fn remove_is_idempotent(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        range in arb_range(),
    ) {
        let (mut set, _) = build(stride, &ops);
        set.remove_range(range.clone()).unwrap();
        let once = set.dump();
        set.remove_range(range).unwrap();
        prop_assert_eq!(set.dump(), once);
    }

    #[test]
    fn insert_then_remove_restores_absent_range(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        range in arb_range(),
    ) {
        let (mut set, _) = build(stride, &ops);
        set.remove_range(range.clone()).unwrap();
        let before = set.dump();

        set.insert_range(range.clone()).unwrap();
        set.remove_range(range).unwrap();
        set.check_invariants();
        prop_assert_eq!(set.dump(), before);
    }

    #[test]
    fn remove_then_insert_restores_present_range(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        range in arb_range(),
    ) {
        let (mut set, _) = build(stride, &ops);
        set.insert_range(range.clone()).unwrap();
        let before = set.dump();

        set.remove_range(range.clone()).unwrap();
        set.insert_range(range).unwrap();
        set.check_invariants();
        prop_assert_eq!(set.dump(), before);
    }
}

// ===== Queries =====

proptest! {
    #[test]
    fn range_queries_match_btreeset(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        query in arb_range(),
    ) {
        let (set, model) = build(stride, &ops);
        let expected = model.range(query.clone()).count() as u64;

        prop_assert_eq!(set.count_in(query.clone()).unwrap(), expected);
        prop_assert_eq!(set.intersects(query.clone()).unwrap(), expected > 0);
        prop_assert_eq!(
            set.contains_range(query.clone()).unwrap(),
            expected == query.end - query.start
        );
    }

    #[test]
    fn neighbours_match_btreeset(
        stride in arb_stride(),
        ops in proptest::collection::vec(arb_op(), 0..32),
        index in 0..UNIVERSE + 2,
    ) {
        let (set, model) = build(stride, &ops);
        prop_assert_eq!(set.index_after(index), model.range(index + 1..).next().copied());
        prop_assert_eq!(set.index_before(index), model.range(..index).next_back().copied());
    }

    #[test]
    fn set_relations_match_btreeset(
        ops_a in proptest::collection::vec(arb_op(), 0..24),
        ops_b in proptest::collection::vec(arb_op(), 0..24),
    ) {
        let (a, model_a) = build(7, &ops_a);
        let (b, model_b) = build(16, &ops_b);

        prop_assert_eq!(a.contains_set(&b), model_b.is_subset(&model_a));
        prop_assert_eq!(a.intersects_set(&b), !model_a.is_disjoint(&model_b));

        let mut union = a.clone();
        union.insert_set(&b);
        union.check_invariants();
        prop_assert_eq!(
            union.iter().collect::<Vec<_>>(),
            model_a.union(&model_b).copied().collect::<Vec<_>>()
        );

        let mut difference = a.clone();
        difference.remove_set(&b);
        difference.check_invariants();
        prop_assert_eq!(
            difference.iter().collect::<Vec<_>>(),
            model_a.difference(&model_b).copied().collect::<Vec<_>>()
        );
    }
}
