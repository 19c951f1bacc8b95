//! Differential tests against `BTreeMap` and `Vec` oracles.
//!
//! Every operation is applied to both engines and the oracle, and the full
//! structural check runs after each step.

use std::collections::BTreeMap;
use std::ops::Bound;

use offset_forest::avl::AvlTree;
use offset_forest::red_black::RbTree;
use offset_forest::{Engine, Map, MultiRankMap, RangeMap, TreeConfig, TreeError};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const KEY_SPACE: u16 = 64;

#[derive(Debug, Clone)]
enum MapOp {
    Add(u16, u32),
    Remove(u16),
    Set(u16, u32),
    Probe(u16),
}

fn map_ops(max: usize) -> impl Strategy<Value = Vec<MapOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..KEY_SPACE, any::<u32>()).prop_map(|(k, v)| MapOp::Add(k, v)),
            3 => (0..KEY_SPACE).prop_map(MapOp::Remove),
            1 => (0..KEY_SPACE, any::<u32>()).prop_map(|(k, v)| MapOp::Set(k, v)),
            1 => (0..KEY_SPACE).prop_map(MapOp::Probe),
        ],
        0..=max,
    )
}

fn below(oracle: &BTreeMap<u16, u32>, key: u16, inclusive: bool) -> Option<u16> {
    let upper = if inclusive { Bound::Included(key) } else { Bound::Excluded(key) };
    oracle.range((Bound::Unbounded, upper)).next_back().map(|(k, _)| *k)
}

fn above(oracle: &BTreeMap<u16, u32>, key: u16, inclusive: bool) -> Option<u16> {
    let lower = if inclusive { Bound::Included(key) } else { Bound::Excluded(key) };
    oracle.range((lower, Bound::Unbounded)).next().map(|(k, _)| *k)
}

fn run_map<E: Engine<u16, u32, ()>>(ops: &[MapOp], config: TreeConfig) -> Result<(), TestCaseError> {
    let mut map: Map<u16, u32, E> = Map::with_config(config);
    let mut oracle = BTreeMap::new();
    for op in ops {
        match *op {
            MapOp::Add(k, v) => {
                let expected = !oracle.contains_key(&k);
                match map.try_add(k, v) {
                    Ok(added) => {
                        prop_assert_eq!(added, expected);
                        oracle.entry(k).or_insert(v);
                    }
                    Err(TreeError::CapacityExhausted { .. }) => {
                        prop_assert!(expected);
                        prop_assert_eq!(map.len() as u32, config.capacity);
                    }
                    Err(err) => prop_assert!(false, "unexpected error {err}"),
                }
            }
            MapOp::Remove(k) => {
                prop_assert_eq!(map.remove(&k).ok(), oracle.remove(&k));
            }
            MapOp::Set(k, v) => {
                let expected = oracle.get_mut(&k).map(|slot| *slot = v).is_some();
                prop_assert_eq!(map.try_set_value(&k, v), expected);
            }
            MapOp::Probe(k) => {
                prop_assert_eq!(map.try_get(&k), oracle.get(&k));
                prop_assert_eq!(map.nearest_less(&k).copied(), below(&oracle, k, false));
                prop_assert_eq!(map.nearest_less_or_equal(&k).copied(), below(&oracle, k, true));
                prop_assert_eq!(map.nearest_greater(&k).copied(), above(&oracle, k, false));
                prop_assert_eq!(map.nearest_greater_or_equal(&k).copied(), above(&oracle, k, true));
            }
        }
        map.assert_valid().map_err(TestCaseError::fail)?;
        prop_assert_eq!(map.len(), oracle.len());
    }
    let entries: Vec<(u16, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u16, u32)> = oracle.into_iter().collect();
    prop_assert_eq!(entries, expected);
    Ok(())
}

#[derive(Debug, Clone)]
enum RankOp {
    Add(u16, i64),
    Remove(u16),
    SetCount(u16, i64),
    Adjust(u16, i64),
    Rank(i64),
}

fn rank_ops(max: usize) -> impl Strategy<Value = Vec<RankOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..KEY_SPACE, 1..20i64).prop_map(|(k, c)| RankOp::Add(k, c)),
            2 => (0..KEY_SPACE).prop_map(RankOp::Remove),
            1 => (0..KEY_SPACE, 1..20i64).prop_map(|(k, c)| RankOp::SetCount(k, c)),
            2 => (0..KEY_SPACE, -10..10i64).prop_map(|(k, d)| RankOp::Adjust(k, d)),
            1 => (0..400i64).prop_map(RankOp::Rank),
        ],
        0..=max,
    )
}

fn run_rank<E: Engine<u16, u32, i64>>(ops: &[RankOp]) -> Result<(), TestCaseError> {
    let mut map: MultiRankMap<u16, u32, E> = MultiRankMap::new();
    let mut oracle: BTreeMap<u16, i64> = BTreeMap::new();
    for op in ops {
        match *op {
            RankOp::Add(k, c) => {
                let added = map.try_add(k, u32::from(k), c).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(added, !oracle.contains_key(&k));
                oracle.entry(k).or_insert(c);
            }
            RankOp::Remove(k) => {
                prop_assert_eq!(map.try_remove(&k), oracle.remove(&k).is_some());
            }
            RankOp::SetCount(k, c) => {
                let expected = oracle.get_mut(&k).map(|slot| *slot = c).is_some();
                prop_assert_eq!(map.try_set_count(&k, c), Ok(expected));
            }
            RankOp::Adjust(k, d) => {
                let current = oracle.get(&k).copied().unwrap_or(0);
                let adjusted = current + d;
                match map.adjust_count(k, d) {
                    Ok(count) => {
                        prop_assert_eq!(count, adjusted);
                        if adjusted == 0 {
                            oracle.remove(&k);
                        } else {
                            oracle.insert(k, adjusted);
                        }
                    }
                    Err(TreeError::InvalidArgument(_)) => prop_assert!(adjusted < 0),
                    Err(err) => prop_assert!(false, "unexpected error {err}"),
                }
            }
            RankOp::Rank(r) => {
                let mut start = 0;
                let mut expected = None;
                for (k, c) in &oracle {
                    if r < start + c {
                        expected = Some(*k);
                        break;
                    }
                    start += c;
                }
                prop_assert_eq!(map.try_get_key_by_rank(r).copied(), expected);
            }
        }
        map.assert_valid().map_err(TestCaseError::fail)?;
    }
    let mut rank = 0;
    for entry in map.iter() {
        prop_assert_eq!(Some(&entry.count), oracle.get(entry.key));
        prop_assert_eq!(entry.rank, rank);
        prop_assert_eq!(map.rank_of(entry.key), Some(rank));
        rank += entry.count;
    }
    prop_assert_eq!(map.rank_count(), oracle.values().sum::<i64>());
    prop_assert_eq!(map.len(), oracle.len());
    Ok(())
}

#[derive(Debug, Clone)]
enum RangeOp {
    Insert(usize, i64, u32),
    Delete(usize),
    SetLength(usize, i64),
    Contains(i64),
}

fn range_ops(max: usize) -> impl Strategy<Value = Vec<RangeOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (any::<usize>(), 1..8i64, any::<u32>()).prop_map(|(i, l, v)| RangeOp::Insert(i, l, v)),
            2 => any::<usize>().prop_map(RangeOp::Delete),
            1 => (any::<usize>(), 1..8i64).prop_map(|(i, l)| RangeOp::SetLength(i, l)),
            1 => (0..200i64).prop_map(RangeOp::Contains),
        ],
        0..=max,
    )
}

fn starts(oracle: &[(i64, u32)]) -> Vec<i64> {
    oracle
        .iter()
        .scan(0, |acc, (len, _)| {
            let start = *acc;
            *acc += len;
            Some(start)
        })
        .collect()
}

fn run_range<E: Engine<(), u32, i64>>(ops: &[RangeOp]) -> Result<(), TestCaseError> {
    let mut map: RangeMap<u32, i64, E> = RangeMap::new();
    let mut oracle: Vec<(i64, u32)> = Vec::new();
    for op in ops {
        let bounds = starts(&oracle);
        let extent: i64 = oracle.iter().map(|(l, _)| l).sum();
        match *op {
            RangeOp::Insert(i, length, value) => {
                let index = i % (oracle.len() + 1);
                let start = bounds.get(index).copied().unwrap_or(extent);
                prop_assert_eq!(map.try_insert(start, length, value), Ok(true));
                oracle.insert(index, (length, value));
            }
            RangeOp::Delete(i) if !oracle.is_empty() => {
                let index = i % oracle.len();
                prop_assert_eq!(map.delete(bounds[index]), Ok(oracle.remove(index).1));
            }
            RangeOp::Delete(_) => {
                prop_assert_eq!(map.try_delete(0), Ok(false));
            }
            RangeOp::SetLength(i, length) if !oracle.is_empty() => {
                let index = i % oracle.len();
                prop_assert_eq!(map.try_set_length(bounds[index], length), Ok(true));
                oracle[index].0 = length;
            }
            RangeOp::SetLength(..) => {}
            RangeOp::Contains(p) => {
                let expected = bounds
                    .iter()
                    .zip(&oracle)
                    .find(|(start, (len, _))| **start <= p && p < **start + len)
                    .map(|(start, (len, value))| (*start, *len, *value));
                let found = map.range_containing(p).map(|r| (r.start, r.length, *r.value));
                prop_assert_eq!(found, expected);
                if p > 0 && p != extent && !bounds.contains(&p) {
                    prop_assert_eq!(map.try_insert(p, 1, 0), Ok(false));
                }
            }
        }
        map.assert_valid().map_err(TestCaseError::fail)?;
    }
    let got: Vec<(i64, i64, u32)> = map.iter().map(|r| (r.start, r.length, *r.value)).collect();
    let expected: Vec<(i64, i64, u32)> = starts(&oracle)
        .into_iter()
        .zip(&oracle)
        .map(|(s, (l, v))| (s, *l, *v))
        .collect();
    prop_assert_eq!(got, expected);
    prop_assert_eq!(map.get_extent(), oracle.iter().map(|(l, _)| l).sum::<i64>());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn map_matches_btreemap(ops in map_ops(200)) {
        run_map::<AvlTree<u16, u32, ()>>(&ops, TreeConfig::discard())?;
        run_map::<RbTree<u16, u32, ()>>(&ops, TreeConfig::discard())?;
    }

    #[test]
    fn retained_map_matches_btreemap(ops in map_ops(200)) {
        run_map::<AvlTree<u16, u32, ()>>(&ops, TreeConfig::retained(16))?;
        run_map::<RbTree<u16, u32, ()>>(&ops, TreeConfig::retained(16))?;
    }

    #[test]
    fn fixed_map_matches_btreemap_until_full(ops in map_ops(120), capacity in 0..24u32) {
        run_map::<AvlTree<u16, u32, ()>>(&ops, TreeConfig::fixed(capacity))?;
        run_map::<RbTree<u16, u32, ()>>(&ops, TreeConfig::fixed(capacity))?;
    }

    #[test]
    fn ranks_match_prefix_sums(ops in rank_ops(150)) {
        run_rank::<AvlTree<u16, u32, i64>>(&ops)?;
        run_rank::<RbTree<u16, u32, i64>>(&ops)?;
    }

    #[test]
    fn ranges_match_vec(ops in range_ops(150)) {
        run_range::<AvlTree<(), u32, i64>>(&ops)?;
        run_range::<RbTree<(), u32, i64>>(&ops)?;
    }
}
