use std::sync::Arc;

use crate::soft::SoftRetainer;

#[test]
fn retains_up_to_capacity() {
    let retainer = SoftRetainer::new(2);
    let values: Vec<Arc<u32>> = (0..3).map(Arc::new).collect();
    for v in &values {
        retainer.retain(v);
    }
    assert_eq!(retainer.len(), 2);
    let held: usize = values.iter().map(|v| Arc::strong_count(v) - 1).sum();
    assert_eq!(held, 2);
}

#[test]
fn recently_used_values_get_a_second_chance() {
    let retainer = SoftRetainer::new(2);
    let a = Arc::new("a");
    let b = Arc::new("b");
    let c = Arc::new("c");
    retainer.retain(&a);
    retainer.retain(&b);
    retainer.retain(&a);
    retainer.retain(&c);

    assert_eq!(Arc::strong_count(&a), 2);
    assert_eq!(Arc::strong_count(&b), 1);
    assert_eq!(Arc::strong_count(&c), 2);
}

#[test]
fn retaining_twice_keeps_one_slot() {
    let retainer = SoftRetainer::new(4);
    let a = Arc::new(1u8);
    retainer.retain(&a);
    retainer.retain(&a);
    assert_eq!(retainer.len(), 1);
    assert_eq!(Arc::strong_count(&a), 2);
}

#[test]
fn zero_capacity_retains_nothing() {
    let retainer = SoftRetainer::new(0);
    let a = Arc::new(1u8);
    retainer.retain(&a);
    assert!(retainer.is_empty());
    assert_eq!(Arc::strong_count(&a), 1);
}

#[test]
fn clear_releases_everything() {
    let retainer: SoftRetainer<dyn std::any::Any + Send + Sync> = SoftRetainer::new(4);
    let a: Arc<dyn std::any::Any + Send + Sync> = Arc::new(5i32);
    retainer.retain(&a);
    assert_eq!(Arc::strong_count(&a), 2);
    retainer.clear();
    assert_eq!(Arc::strong_count(&a), 1);
}
