use std::sync::Arc;

use linkform_core::BasicType;

use crate::species::SpeciesRegistry;

use BasicType::{I, L};

#[test]
fn top_species_has_no_fields() {
    let registry = SpeciesRegistry::new();
    let top = registry.top();
    assert!(top.is_top());
    assert_eq!(top.key(), "");
    assert_eq!(top.field_count(), 0);
    assert!(top.getters().is_empty());
}

#[test]
fn extension_is_interned() {
    let registry = SpeciesRegistry::new();
    let top = registry.top();
    let l = registry.extend(&top, L);
    let li = registry.extend(&l, I);
    assert_eq!(li.key(), "LI");
    assert_eq!(li.fields(), &[L, I]);
    assert!(Arc::ptr_eq(&l, &registry.extend(&top, L)));
    assert!(Arc::ptr_eq(&li, &registry.species(&[L, I])));
    assert_eq!(registry.len(), 3);
}

#[test]
fn getters_read_typed_fields() {
    let registry = SpeciesRegistry::new();
    let li = registry.species(&[L, I]);
    let getter = li.getter(1);
    assert_eq!(getter.to_string(), "BoundField[LI.1]");
    assert_eq!(getter.return_type(), I);
    assert_eq!(getter.parameter_types(), vec![L]);
    assert_eq!(li.getters().len(), 2);
    assert_ne!(li.getter(0), registry.species(&[L]).getter(0));
}

#[test]
fn concurrent_extension_agrees() {
    let registry = SpeciesRegistry::new();
    let top = registry.top();
    let found: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| registry.extend(&registry.extend(&top, I), L)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for species in &found[1..] {
        assert!(Arc::ptr_eq(&found[0], species));
    }
}

#[test]
#[should_panic(expected = "has no field 2")]
fn getter_out_of_range() {
    let registry = SpeciesRegistry::new();
    registry.species(&[L, I]).getter(2);
}
