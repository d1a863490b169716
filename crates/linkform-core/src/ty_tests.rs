use crate::{BasicType, ClassKey, Ty};

#[test]
fn erase_folds_references_only() {
    assert_eq!(Ty::class("String").erase(), Ty::object());
    assert_eq!(Ty::array_of(Ty::Int).erase(), Ty::object());
    assert_eq!(Ty::Short.erase(), Ty::Short);
    assert_eq!(Ty::Void.erase(), Ty::Void);
}

#[test]
fn basic_folds_subwords() {
    assert_eq!(Ty::Short.basic(), Ty::Int);
    assert_eq!(Ty::Boolean.basic_type(), BasicType::I);
    assert_eq!(Ty::Long.basic(), Ty::Long);
    assert_eq!(Ty::class("String").basic(), Ty::object());
}

#[test]
fn classification() {
    assert!(Ty::Void.is_primitive());
    assert!(Ty::class("String").is_reference());
    assert!(Ty::object().is_object());
    assert!(!Ty::class("String").is_object());
    assert!(Ty::Char.is_subword());
    assert!(!Ty::Int.is_subword());
    assert!(Ty::Double.is_double_width());
}

#[test]
fn parse_words() {
    assert_eq!(Ty::parse_word("int"), Some(Ty::Int));
    assert_eq!(Ty::parse_word("String"), Some(Ty::class("String")));
    assert_eq!(
        Ty::parse_word("Object[]"),
        Some(Ty::array_of(Ty::object()))
    );
    assert_eq!(Ty::parse_word("void[]"), None);
    assert_eq!(Ty::parse_word("a b"), None);
}

#[test]
fn parse_descriptors() {
    assert_eq!(Ty::parse_descriptor("L"), Some(Ty::object()));
    assert_eq!(Ty::parse_descriptor("[I"), Some(Ty::array_of(Ty::Int)));
    assert_eq!(Ty::parse_descriptor("[V"), None);
    assert_eq!(Ty::parse_descriptor("Q"), None);
}

#[test]
fn display() {
    assert_eq!(Ty::array_of(Ty::class("String")).to_string(), "String[]");
    assert_eq!(Ty::Boolean.to_string(), "boolean");
    assert_eq!(ClassKey::object().to_string(), "Object");
}

#[test]
fn component_type() {
    let arr = Ty::array_of(Ty::Long);
    assert_eq!(arr.component_type(), Some(&Ty::Long));
    assert_eq!(Ty::Long.component_type(), None);
}
