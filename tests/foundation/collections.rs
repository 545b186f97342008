//! Tests for the persistent collection wrappers.

use weft_foundation::{WfMap, WfVec};

#[test]
fn map_insert_is_pure() {
    let empty: WfMap<String, i64> = WfMap::new();
    let one = empty.insert("a".to_string(), 1);
    let two = one.insert("b".to_string(), 2);

    assert!(empty.is_empty());
    assert_eq!(one.len(), 1);
    assert_eq!(two.len(), 2);
    assert_eq!(one.get("b"), None);
    assert_eq!(two.get("b"), Some(&2));
}

#[test]
fn map_remove_is_pure() {
    let map: WfMap<String, i64> = [("a".to_string(), 1), ("b".to_string(), 2)]
        .into_iter()
        .collect();
    let smaller = map.remove("a");
    assert_eq!(map.len(), 2);
    assert_eq!(smaller.len(), 1);
    assert!(!smaller.contains_key("a"));
}

#[test]
fn map_insert_replaces_value() {
    let map: WfMap<String, i64> = WfMap::new().insert("a".to_string(), 1);
    let replaced = map.insert("a".to_string(), 9);
    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(replaced.get("a"), Some(&9));
    assert_eq!(replaced.len(), 1);
}

#[test]
fn vec_preserves_order() {
    let vec: WfVec<i64> = (0..5).collect();
    let collected: Vec<i64> = vec.iter().copied().collect();
    assert_eq!(collected, vec![0, 1, 2, 3, 4]);
    assert_eq!(vec.get(2), Some(&2));
    assert_eq!(vec.get(9), None);
}

mod persistence {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn insert_never_disturbs_other_keys(
            entries in proptest::collection::hash_map("[a-z]{1,4}", any::<i64>(), 0..16),
            key in "[a-z]{1,4}",
            value in any::<i64>(),
        ) {
            let map: WfMap<String, i64> = entries.clone().into_iter().collect();
            let updated = map.insert(key.clone(), value);
            prop_assert_eq!(updated.get(&key), Some(&value));
            for (k, v) in &entries {
                if *k != key {
                    prop_assert_eq!(updated.get(k), Some(v));
                }
                prop_assert_eq!(map.get(k), Some(v));
            }
        }
    }
}

#[test]
fn maps_compare_by_contents() {
    let a: WfMap<String, i64> = WfMap::new().insert("x".to_string(), 1);
    let b: WfMap<String, i64> = WfMap::new().insert("x".to_string(), 1);
    assert_eq!(a, b);
    assert_ne!(a, b.insert("y".to_string(), 2));
}
