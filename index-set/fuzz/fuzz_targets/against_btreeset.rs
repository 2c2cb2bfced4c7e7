#![no_main]

use std::collections::BTreeSet;

use index_set::IndexSet;
use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

// Indices live in 0..UNIVERSE so runs collide often.
const UNIVERSE: u64 = 2_048;

// Spans stay short enough to leave gaps.
const MAX_SPAN: u64 = 192;

const STRIDES: [u64; 6] = [1, 2, 5, 16, 64, 256];

#[derive(Debug, Copy, Clone)]
struct Index(u64);

impl<'a> Arbitrary<'a> for Index {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=UNIVERSE - 1)?))
    }
}

#[derive(Debug, Copy, Clone)]
struct Span(u64);

impl<'a> Arbitrary<'a> for Span {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=MAX_SPAN)?))
    }
}

#[derive(Arbitrary, Debug)]
enum Operation {
    Insert(Index),
    Remove(Index),
    InsertSpan(Index, Span),
    RemoveSpan(Index, Span),
    RemoveTail(Index),
    Clear,
    Contains(Index),
    CountIn(Index, Span),
    Neighbours(Index),
    CheckIter,
    CheckRanges,
    MergeOther,
    SubtractOther,
    SwapSides,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    stride_idx: u8,
    initial_lhs: Vec<(Index, Span)>,
    initial_rhs: Vec<Index>,
    ops: Vec<Operation>,
}

fn check_equal(set: &IndexSet, model: &BTreeSet<u64>) {
    set.check_invariants();
    assert_eq!(set.len(), model.len() as u64, "len mismatch: {}", set.dump());
    assert_eq!(set.min(), model.first().copied(), "min mismatch");
    assert_eq!(set.max(), model.last().copied(), "max mismatch");
    assert_eq!(set.is_empty(), model.is_empty(), "is_empty mismatch");
}

fn model_ranges(model: &BTreeSet<u64>) -> Vec<std::ops::Range<u64>> {
    let mut ranges: Vec<std::ops::Range<u64>> = Vec::new();
    for &i in model {
        match ranges.last_mut() {
            Some(last) if last.end == i => last.end = i + 1,
            _ => ranges.push(i..i + 1),
        }
    }
    ranges
}

fuzz_target!(|input: FuzzInput| {
    let stride = STRIDES[input.stride_idx as usize % STRIDES.len()];

    let mut lhs = IndexSet::with_hint_stride(stride).unwrap();
    let mut lhs_model = BTreeSet::new();
    for (Index(start), Span(length)) in &input.initial_lhs {
        lhs.insert_span(*start, *length).unwrap();
        lhs_model.extend(*start..*start + *length);
    }
    check_equal(&lhs, &lhs_model);

    let mut rhs = IndexSet::with_hint_stride(stride.max(3) - 2).unwrap();
    let mut rhs_model = BTreeSet::new();
    for Index(i) in &input.initial_rhs {
        rhs.insert(*i).unwrap();
        rhs_model.insert(*i);
    }
    check_equal(&rhs, &rhs_model);

    for op in &input.ops {
        match *op {
            Operation::Insert(Index(i)) => {
                lhs.insert(i).unwrap();
                lhs_model.insert(i);
            }
            Operation::Remove(Index(i)) => {
                lhs.remove(i).unwrap();
                lhs_model.remove(&i);
            }
            Operation::InsertSpan(Index(start), Span(length)) => {
                lhs.insert_span(start, length).unwrap();
                lhs_model.extend(start..start + length);
            }
            Operation::RemoveSpan(Index(start), Span(length)) => {
                lhs.remove_span(start, length).unwrap();
                for i in start..start + length {
                    lhs_model.remove(&i);
                }
            }
            Operation::RemoveTail(Index(start)) => {
                lhs.remove_range(start..).unwrap();
                lhs_model.retain(|&i| i < start);
            }
            Operation::Clear => {
                lhs.clear();
                lhs_model.clear();
            }
            Operation::Contains(Index(i)) => {
                assert_eq!(lhs.contains(i), lhs_model.contains(&i), "contains({i}) mismatch");
            }
            Operation::CountIn(Index(start), Span(length)) => {
                let expected = lhs_model.range(start..start + length).count() as u64;
                assert_eq!(lhs.count_in(start..start + length).unwrap(), expected);
                assert_eq!(
                    lhs.contains_range(start..start + length).unwrap(),
                    expected == length
                );
            }
            Operation::Neighbours(Index(i)) => {
                assert_eq!(lhs.index_after(i), lhs_model.range(i + 1..).next().copied());
                assert_eq!(lhs.index_before(i), lhs_model.range(..i).next_back().copied());
            }
            Operation::CheckIter => {
                let values: Vec<u64> = lhs.iter().collect();
                let expected: Vec<u64> = lhs_model.iter().copied().collect();
                assert_eq!(values, expected, "iter mismatch");
            }
            Operation::CheckRanges => {
                let ranges: Vec<_> = lhs.ranges().collect();
                assert_eq!(ranges, model_ranges(&lhs_model), "ranges mismatch");
            }
            Operation::MergeOther => {
                lhs.insert_set(&rhs);
                lhs_model.extend(rhs_model.iter().copied());
            }
            Operation::SubtractOther => {
                assert_eq!(lhs.intersects_set(&rhs), !lhs_model.is_disjoint(&rhs_model));
                lhs.remove_set(&rhs);
                lhs_model.retain(|i| !rhs_model.contains(i));
            }
            Operation::SwapSides => {
                std::mem::swap(&mut lhs, &mut rhs);
                std::mem::swap(&mut lhs_model, &mut rhs_model);
                assert_eq!(lhs.contains_set(&rhs), rhs_model.is_subset(&lhs_model));
            }
        }
        check_equal(&lhs, &lhs_model);
    }

    check_equal(&rhs, &rhs_model);
});
