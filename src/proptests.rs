use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_tree<V>(t: &CritBitTree<V>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "tree invariants violated: {issues:#?}");
    assert_eq!(t.root.is_none(), t.is_empty());
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Tiny alphabet so that keys collide, nest as prefixes of each other and
    // differ only by trailing zero bytes.
    prop::collection::vec(prop::sample::select(vec![0u8, 1, b'a', b'b', 0xff]), 0..=6)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 15)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    LongestPrefix(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    WalkPrefix(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    WalkPath(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Clear,
}

fn model_prefixed(m: &BTreeMap<Vec<u8>, u64>, prefix: &[u8]) -> Vec<(Vec<u8>, u64)> {
    m.iter()
        .filter(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

fn model_ancestors(m: &BTreeMap<Vec<u8>, u64>, path: &[u8]) -> Vec<(Vec<u8>, u64)> {
    // Byte-wise order of a path's prefixes is also their length order.
    m.iter()
        .filter(|(k, _)| path.starts_with(k))
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u64(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t: CritBitTree<u64> = CritBitTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(&key, value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    let old_t = t.remove(&key);
                    let old_m = m.remove(key.as_slice());
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Get(key) => {
                    let got_t = t.get(&key).copied();
                    let got_m = m.get(key.as_slice()).copied();
                    prop_assert_eq!(got_t, got_m);
                    prop_assert_eq!(t.contains_key(&key), m.contains_key(key.as_slice()));
                }
                Op::LongestPrefix(query) => {
                    let got_t = t.longest_prefix(&query).map(|(k, v)| (k.to_vec(), *v));
                    let got_m = model_ancestors(&m, &query).pop();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::WalkPrefix(prefix) => {
                    let got_t: Vec<(Vec<u8>, u64)> =
                        t.prefix_iter(&prefix).map(|(k, v)| (k.to_vec(), *v)).collect();
                    prop_assert_eq!(got_t, model_prefixed(&m, &prefix));
                }
                Op::WalkPath(path) => {
                    let got_t: Vec<(Vec<u8>, u64)> =
                        t.path_iter(&path).map(|(k, v)| (k.to_vec(), *v)).collect();
                    prop_assert_eq!(got_t, model_ancestors(&m, &path));
                }
                Op::Clear => {
                    prop_assert_eq!(t.clear(), !m.is_empty());
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        let min_t = t.minimum().map(|(k, v)| (k.to_vec(), *v));
        let min_m = m.iter().next().map(|(k, v)| (k.clone(), *v));
        prop_assert_eq!(min_t, min_m);
        let max_t = t.maximum().map(|(k, v)| (k.to_vec(), *v));
        let max_m = m.iter().next_back().map(|(k, v)| (k.clone(), *v));
        prop_assert_eq!(max_t, max_m);
    }

    #[test]
    fn prop_walk_prefix_matches_filter(
        keys in prop::collection::btree_set(prop::collection::vec(any::<u8>(), 0..=12), 0..=200),
        prefix in prop::collection::vec(any::<u8>(), 0..=3),
    ) {
        let t: CritBitTree<()> = keys.iter().map(|k| (k, ())).collect();
        let mut got = Vec::new();
        t.walk_prefix(&prefix, |k, _| {
            got.push(k.to_vec());
            false
        });
        let expected: Vec<Vec<u8>> = keys.iter().filter(|k| k.starts_with(&prefix)).cloned().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_key_set() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"\0".to_vec(),
        b"a\0".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_key_set();

    let mut reference: Option<String> = None;
    for_each_permutation(&keys, |perm| {
        let mut t: CritBitTree<u64> = CritBitTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(&k, v), m.insert(k, v));
        }

        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|(k, _)| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = m.keys().cloned().collect();
        assert_eq!(got, expected);

        // A crit-bit tree's shape depends only on its key set.
        let dot = t.to_dot();
        let first = reference.get_or_insert_with(|| dot.clone());
        assert_eq!(&dot, first);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_key_set();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: CritBitTree<u64> = CritBitTree::new();
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        assert_eq!(base_tree.insert(k, v), base_map.insert(k.clone(), v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(k.as_slice()));
            assert_eq!(t.len(), m.len());
            assert_eq!(t.get(&k), None);
            validate_tree(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_none());
    });
}
