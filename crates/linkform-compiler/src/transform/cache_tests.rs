use std::sync::Arc;
use std::thread;

use super::*;
use crate::test_utils::{call_f, passthrough};

fn key(pos: usize) -> TransformKey {
    TransformKey::of(TransformKind::BindArg, &[pos])
}

#[test]
fn grows_from_single_to_array_to_map() {
    let cache = TransformCache::new();
    assert_eq!(cache.shape(), "empty");
    assert!(cache.get(&key(0)).is_none());

    let forms: Vec<_> = (0..5).map(|_| call_f()).collect();
    cache.put(key(0), forms[0].clone(), 3);
    assert_eq!(cache.shape(), "single");
    cache.put(key(1), forms[1].clone(), 3);
    assert_eq!(cache.shape(), "array");
    cache.put(key(2), forms[2].clone(), 3);
    assert_eq!(cache.shape(), "array");
    cache.put(key(3), forms[3].clone(), 3);
    assert_eq!(cache.shape(), "map");
    assert_eq!(cache.len(), 4);

    for (i, form) in forms.iter().take(4).enumerate() {
        assert!(Arc::ptr_eq(&cache.get(&key(i)).unwrap(), form));
    }
}

#[test]
fn first_live_entry_wins() {
    let cache = TransformCache::new();
    let first = call_f();
    let second = call_f();
    let kept = cache.put(key(1), first.clone(), 16);
    assert!(Arc::ptr_eq(&kept, &first));
    let kept = cache.put(key(1), second, 16);
    assert!(Arc::ptr_eq(&kept, &first));
}

#[test]
fn stale_entries_are_overwritten() {
    let cache = TransformCache::new();
    let dead = passthrough(&[]);
    cache.put(key(1), dead, 16);
    assert!(cache.get(&key(1)).is_none());
    assert!(cache.is_empty());

    let fresh = call_f();
    let kept = cache.put(key(1), fresh.clone(), 16);
    assert!(Arc::ptr_eq(&kept, &fresh));
    assert_eq!(cache.len(), 1);
}

#[test]
fn stale_slot_is_reused_before_growing() {
    let cache = TransformCache::new();
    let live = call_f();
    cache.put(key(0), live.clone(), 2);
    cache.put(key(1), call_f(), 2);
    assert_eq!(cache.shape(), "array");

    let other = call_f();
    cache.put(key(2), other.clone(), 2);
    assert_eq!(cache.shape(), "array");
    assert_eq!(cache.len(), 2);
    assert!(cache.get(&key(1)).is_none());
    assert!(Arc::ptr_eq(&cache.get(&key(2)).unwrap(), &other));
}

#[test]
fn map_replaces_stale_entries() {
    let cache = TransformCache::new();
    let keep: Vec<_> = (0..3).map(|_| call_f()).collect();
    for (i, form) in keep.iter().enumerate() {
        cache.put(key(i), form.clone(), 1);
    }
    assert_eq!(cache.shape(), "map");
    cache.put(key(7), call_f(), 1);
    assert!(cache.get(&key(7)).is_none());

    let fresh = call_f();
    assert!(Arc::ptr_eq(&cache.put(key(7), fresh.clone(), 1), &fresh));
    assert_eq!(cache.len(), 4);
}

#[test]
fn lookups_do_not_wait_for_writers() {
    let cache = TransformCache::new();
    let forms: Vec<_> = (0..3).map(|_| call_f()).collect();
    for (i, form) in forms.iter().enumerate() {
        cache.put(key(i), form.clone(), 16);
    }
    let _writer = cache.hold_writer();
    let found = thread::scope(|scope| {
        scope
            .spawn(|| (0..3).filter(|&i| cache.get(&key(i)).is_some()).count())
            .join()
            .unwrap()
    });
    assert_eq!(found, 3);
    assert_eq!(cache.shape(), "array");
}

#[test]
fn concurrent_writers_agree_on_one_form_per_key() {
    let cache = TransformCache::new();
    let forms: Vec<Vec<_>> = (0..4)
        .map(|_| (0..8).map(|_| call_f()).collect())
        .collect();
    let kept: Vec<Vec<_>> = thread::scope(|scope| {
        let workers: Vec<_> = forms
            .iter()
            .map(|mine| {
                let cache = &cache;
                scope.spawn(move || {
                    mine.iter()
                        .enumerate()
                        .map(|(i, form)| cache.put(key(i), form.clone(), 4))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    assert_eq!(cache.shape(), "map");
    for i in 0..8 {
        let cached = cache.get(&key(i)).unwrap();
        for per_thread in &kept {
            assert!(Arc::ptr_eq(&per_thread[i], &cached));
        }
    }
}
