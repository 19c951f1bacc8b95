mod common;

use std::cmp::Ordering;

use offset_forest::avl::{AvlTree, Link};
use offset_forest::red_black::RbTree;
use offset_forest::{AvlMap, Balance, Engine, Inspect, Map, RbMap, TreeError, TreeNode};

fn add_get_remove<E: Engine<i32, String, ()>>() {
    let mut map: Map<i32, String, E> = Map::new();
    assert!(map.is_empty());
    assert!(map.try_add(5, "five".into()).unwrap());
    assert!(map.try_add(1, "one".into()).unwrap());
    assert!(map.try_add(9, "nine".into()).unwrap());
    assert!(!map.try_add(5, "again".into()).unwrap());
    assert_eq!(map.add(1, "dup".into()), Err(TreeError::DuplicateKey));
    assert_eq!(map.len(), 3);
    assert_eq!(map.long_count(), 3);

    assert_eq!(map.try_get(&5).map(String::as_str), Some("five"));
    assert_eq!(map.get(&4), Err(TreeError::NotFound));
    assert!(map.contains_key(&9));

    assert!(map.try_set_value(&9, "NINE".into()));
    assert!(!map.try_set_value(&8, "eight".into()));
    assert_eq!(map.set_value(&8, "eight".into()), Err(TreeError::NotFound));
    map.get_mut(&1).unwrap().push('!');
    assert_eq!(map.get(&1).unwrap(), "one!");

    assert_eq!(map.remove(&5).unwrap(), "five");
    assert!(!map.try_remove(&5));
    assert_eq!(map.remove(&5), Err(TreeError::NotFound));
    let entries: Vec<(i32, &str)> = map.iter().map(|(k, v)| (*k, v.as_str())).collect();
    assert_eq!(entries, vec![(1, "one!"), (9, "NINE")]);
    map.assert_valid().unwrap();
}

#[test]
fn add_get_remove_matrix() {
    add_get_remove::<AvlTree<i32, String, ()>>();
    add_get_remove::<RbTree<i32, String, ()>>();
}

fn nearest_queries<E: Engine<i32, (), ()>>() {
    let mut map: Map<i32, (), E> = Map::new();
    for k in [10, 20, 30, 40] {
        map.add(k, ()).unwrap();
    }
    assert_eq!(map.nearest_less(&10), None);
    assert_eq!(map.nearest_less(&11), Some(&10));
    assert_eq!(map.nearest_less_or_equal(&20), Some(&20));
    assert_eq!(map.nearest_less_or_equal(&5), None);
    assert_eq!(map.nearest_greater(&40), None);
    assert_eq!(map.nearest_greater(&25), Some(&30));
    assert_eq!(map.nearest_greater_or_equal(&30), Some(&30));
    assert_eq!(map.nearest_greater_or_equal(&41), None);
    assert_eq!(map.first().map(|(k, _)| *k), Some(10));
    assert_eq!(map.last().map(|(k, _)| *k), Some(40));
}

#[test]
fn nearest_queries_matrix() {
    nearest_queries::<AvlTree<i32, (), ()>>();
    nearest_queries::<RbTree<i32, (), ()>>();
}

fn bulk_insert_delete<E: Engine<u32, u32, ()> + Inspect<u32, u32, ()>>() {
    common::init_tracing();
    let mut map: Map<u32, u32, E> = Map::new();
    let n = 600;
    for (step, k) in common::shuffled(n, 7).into_iter().enumerate() {
        map.add(k, k * 2).unwrap();
        if step % 50 == 0 {
            map.assert_valid().unwrap();
        }
    }
    map.assert_valid().unwrap();
    assert_eq!(map.len(), n as usize);
    assert!(map.engine().height() <= E::depth_bound(n));
    let keys: Vec<u32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, (0..n).collect::<Vec<_>>());
    let rev: Vec<u32> = map.iter_rev().map(|(k, _)| *k).collect();
    assert_eq!(rev, (0..n).rev().collect::<Vec<_>>());

    for (step, k) in common::shuffled(n, 11).into_iter().enumerate() {
        if k % 3 == 0 {
            continue;
        }
        assert_eq!(map.remove(&k).unwrap(), k * 2);
        if step % 40 == 0 {
            map.assert_valid().unwrap();
        }
    }
    map.assert_valid().unwrap();
    let keys: Vec<u32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, (0..n).filter(|k| k % 3 == 0).collect::<Vec<_>>());

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.iter().count(), 0);
    map.assert_valid().unwrap();
}

#[test]
fn bulk_insert_delete_matrix() {
    bulk_insert_delete::<AvlTree<u32, u32, ()>>();
    bulk_insert_delete::<RbTree<u32, u32, ()>>();
}

#[test]
fn custom_comparator_matrix() {
    let reverse = |a: &i32, b: &i32| b.cmp(a);
    let mut avl: Map<i32, (), AvlTree<i32, (), ()>, _> = Map::with_comparator(reverse);
    let mut rb: Map<i32, (), RbTree<i32, (), ()>, _> = Map::with_comparator(reverse);
    for k in [3, 1, 2] {
        avl.add(k, ()).unwrap();
        rb.add(k, ()).unwrap();
    }
    assert_eq!(avl.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(rb.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(avl.nearest_greater(&3), Some(&2));
    avl.assert_valid().unwrap();
    rb.assert_valid().unwrap();
}

#[test]
fn case_insensitive_keys_matrix() {
    fn ci(a: &String, b: &String) -> Ordering {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
    let mut map: Map<String, i32, RbTree<String, i32, ()>, _> = Map::with_comparator(ci);
    map.add("Alpha".into(), 1).unwrap();
    assert!(!map.try_add("ALPHA".into(), 2).unwrap());
    assert_eq!(map.get(&"alpha".to_string()), Ok(&1));
}

#[test]
fn avl_threads_walk_in_order() {
    let mut map = AvlMap::new();
    for k in common::shuffled(64, 3) {
        map.add(k, ()).unwrap();
    }
    let tree = map.engine();
    let mut forward = Vec::new();
    let mut curr = tree.first().map(|(h, _)| h);
    while let Some(h) = curr {
        forward.push(*tree.node(h).key());
        curr = tree.next(h);
    }
    assert_eq!(forward, (0..64).collect::<Vec<_>>());

    let mut backward = Vec::new();
    let mut curr = tree.last().map(|(h, _)| h);
    while let Some(h) = curr {
        backward.push(*tree.node(h).key());
        curr = tree.prev(h);
    }
    assert_eq!(backward, (0..64).rev().collect::<Vec<_>>());
}

#[test]
fn clone_is_independent_matrix() {
    let mut avl = AvlMap::new();
    let mut rb = RbMap::new();
    for k in 0..50 {
        avl.add(k, k).unwrap();
        rb.add(k, k).unwrap();
    }
    let avl_copy = avl.clone();
    let rb_copy = rb.clone();
    for k in 0..25 {
        avl.remove(&k).unwrap();
        rb.remove(&k).unwrap();
    }
    avl.set_value(&30, -1).unwrap();
    assert_eq!(avl_copy.len(), 50);
    assert_eq!(rb_copy.len(), 50);
    assert_eq!(avl_copy.get(&30), Ok(&30));
    assert_eq!(
        avl_copy.iter().collect::<Vec<_>>(),
        rb_copy.iter().collect::<Vec<_>>()
    );
    avl_copy.assert_valid().unwrap();
    rb_copy.assert_valid().unwrap();
    avl.assert_valid().unwrap();
    rb.assert_valid().unwrap();
}

/// Rebuilds balance metadata from the public node surface alone. Returns the
/// subtree height for AVL nodes and the black height for red-black nodes.
fn audit<E: Inspect<u32, u32, ()>>(tree: &E, n: Option<u32>) -> Result<i32, String> {
    let Some(n) = n else {
        return Ok(0);
    };
    let node = tree
        .arena()
        .get(n)
        .ok_or_else(|| format!("handle {n} is vacant"))?;
    let l = audit(tree, node.left())?;
    let r = audit(tree, node.right())?;
    match tree.balance_of(n) {
        Balance::Avl(b) => {
            if i32::from(b) != r - l || b.abs() > 1 {
                return Err(format!("node {n}: balance {b} over heights {l} and {r}"));
            }
            Ok(1 + l.max(r))
        }
        Balance::RedBlack { black } => {
            if l != r {
                return Err(format!("node {n}: black heights {l} and {r}"));
            }
            let red_child = [node.left(), node.right()]
                .into_iter()
                .flatten()
                .any(|c| tree.balance_of(c) == Balance::RedBlack { black: false });
            if !black && red_child {
                return Err(format!("red node {n} has a red child"));
            }
            Ok(r + i32::from(black))
        }
    }
}

fn inspection_agrees_with_validator<E: Inspect<u32, u32, ()>>() {
    let mut map: Map<u32, u32, E> = Map::new();
    for k in common::shuffled(500, 21) {
        map.add(k, k).unwrap();
    }
    assert!(audit(map.engine(), map.engine().root()).is_ok());
    for k in common::shuffled(500, 22).into_iter().take(320) {
        map.remove(&k).unwrap();
        if k % 16 == 0 {
            map.assert_valid().unwrap();
            audit(map.engine(), map.engine().root()).unwrap();
        }
    }
    map.assert_valid().unwrap();

    let tree = map.engine();
    let measured = audit(tree, tree.root()).unwrap();
    let root = tree.root().unwrap();
    match tree.balance_of(root) {
        Balance::Avl(_) => assert_eq!(measured as usize, tree.height()),
        Balance::RedBlack { black } => {
            assert!(black, "root must be black");
            assert!(measured as usize * 2 >= tree.height());
        }
    }
    let keys: Vec<u32> = tree
        .in_order()
        .into_iter()
        .map(|(h, _)| *tree.node(h).key())
        .collect();
    assert_eq!(keys, map.iter().map(|(k, _)| *k).collect::<Vec<_>>());
}

#[test]
fn inspection_agrees_with_validator_matrix() {
    inspection_agrees_with_validator::<AvlTree<u32, u32, ()>>();
    inspection_agrees_with_validator::<RbTree<u32, u32, ()>>();
}

#[test]
fn raw_node_accessors_match_balance() {
    let mut avl = AvlMap::new();
    let mut rb = RbMap::new();
    for k in common::shuffled(100, 4) {
        avl.add(k, ()).unwrap();
        rb.add(k, ()).unwrap();
    }

    let tree = avl.engine();
    let nodes = tree.in_order();
    for (i, &(h, _)) in nodes.iter().enumerate() {
        let node = tree.node(h);
        assert_eq!(Balance::Avl(node.balance()), tree.balance_of(h));
        match node.left_link() {
            Link::Child(c) => assert_eq!(node.left(), Some(c)),
            Link::Thread(t) => assert_eq!(t, i.checked_sub(1).map(|p| nodes[p].0)),
        }
        match node.right_link() {
            Link::Child(c) => assert_eq!(node.right(), Some(c)),
            Link::Thread(t) => assert_eq!(t, nodes.get(i + 1).map(|&(n, _)| n)),
        }
    }

    let tree = rb.engine();
    for (h, _) in tree.in_order() {
        let black = tree.node(h).is_black();
        assert_eq!(tree.balance_of(h), Balance::RedBlack { black });
    }
}
