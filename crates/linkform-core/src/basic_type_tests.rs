use crate::{ARG_TYPES, BasicType, Ty};

#[test]
fn ordinals_roundtrip() {
    for bt in BasicType::ALL {
        assert_eq!(BasicType::from_ordinal(bt.ordinal()), Some(bt));
    }
    assert_eq!(BasicType::from_ordinal(BasicType::LIMIT), None);
}

#[test]
fn subword_letters_fold_to_int() {
    for c in ['Z', 'B', 'S', 'C', 'I'] {
        assert_eq!(BasicType::from_char(c), Some(BasicType::I));
    }
    assert_eq!(BasicType::from_char('X'), None);
}

#[test]
fn slot_widths() {
    assert_eq!(BasicType::L.slots(), 1);
    assert_eq!(BasicType::J.slots(), 2);
    assert_eq!(BasicType::D.slots(), 2);
    assert_eq!(BasicType::V.slots(), 0);
    assert!(ARG_TYPES.iter().all(|t| t.is_arg()));
    assert!(!BasicType::V.is_arg());
}

#[test]
fn basic_type_of_its_own_ty_is_itself() {
    for bt in BasicType::ALL {
        assert_eq!(bt.ty().basic_type(), bt);
    }
    assert_eq!(BasicType::L.ty(), Ty::object());
}

#[test]
fn chars_roundtrip() {
    let types = BasicType::parse_chars("LIJFD").unwrap();
    assert_eq!(BasicType::chars(&types), "LIJFD");
    assert!(BasicType::parse_chars("LQ").is_none());
}

#[test]
fn from_ty_folds_subwords() {
    assert_eq!(BasicType::from_ty(&Ty::Boolean), BasicType::I);
    assert_eq!(BasicType::from_ty(&Ty::Char), BasicType::I);
    assert_eq!(BasicType::from_ty(&Ty::Long), BasicType::J);
    assert_eq!(BasicType::from_ty(&Ty::array_of(Ty::Int)), BasicType::L);
    assert_eq!(BasicType::from_ty(&Ty::Void), BasicType::V);
}
