use std::sync::Arc;

use linkform_compiler::Constant;
use linkform_core::{BasicType, ClassKey, Ty};

use super::error::RuntimeError;
use super::test_utils::{concat, mt, runtime, s};
use super::value::{Instance, Value};

#[test]
fn basic_types_follow_the_calling_convention() {
    assert_eq!(Value::Int(1).basic_type(), BasicType::I);
    assert_eq!(Value::Long(1).basic_type(), BasicType::J);
    assert_eq!(Value::Float(1.0).basic_type(), BasicType::F);
    assert_eq!(Value::Double(1.0).basic_type(), BasicType::D);
    assert_eq!(Value::Null.basic_type(), BasicType::L);
    assert_eq!(s("x").basic_type(), BasicType::L);
    assert_eq!(Value::Type(mt("()void")).basic_type(), BasicType::L);
    assert_eq!(Value::Void.basic_type(), BasicType::V);
}

#[test]
fn zero_values() {
    assert_eq!(Value::zero(BasicType::L), Value::Null);
    assert_eq!(Value::zero(BasicType::I), Value::Int(0));
    assert_eq!(Value::zero(BasicType::J), Value::Long(0));
    assert_eq!(Value::zero(BasicType::D), Value::Double(0.0));
    assert_eq!(Value::zero(BasicType::V), Value::Void);
}

#[test]
fn constants_convert() {
    assert_eq!(Value::from(&Constant::Int(7)), Value::Int(7));
    assert_eq!(Value::from(&Constant::Null), Value::Null);
    assert_eq!(Value::from(&Constant::Str(Arc::from("hi"))), s("hi"));
    assert_eq!(
        Value::from(&Constant::Class(ClassKey::new("Point"))),
        Value::Class(ClassKey::new("Point"))
    );
}

#[test]
fn references_compare_by_identity() {
    let rt = runtime();
    let a = concat(&rt);
    let b = concat(&rt);
    assert_eq!(Value::Handle(a.clone()), Value::Handle(a));
    assert_ne!(Value::Handle(b), Value::Handle(concat(&rt)));

    let arr = Value::array(Ty::object(), vec![s("x")]);
    assert_eq!(arr, arr.clone());
    assert_ne!(arr, Value::array(Ty::object(), vec![s("x")]));

    assert_eq!(s("x"), s("x"));
}

#[test]
fn accessors_report_null_and_mismatches() {
    assert!(matches!(
        Value::Null.as_handle(),
        Err(RuntimeError::NullPointer { .. })
    ));
    let err = s("x").as_int().unwrap_err();
    assert_eq!(err.to_string(), "cannot use string as int");
    assert_eq!(Value::Int(3).as_int().unwrap(), 3);
}

#[test]
fn display() {
    assert_eq!(Value::Long(3).to_string(), "3L");
    assert_eq!(Value::Float(1.5).to_string(), "1.5F");
    assert_eq!(s("a").to_string(), "\"a\"");
    assert_eq!(
        Value::array(Ty::Int, vec![Value::Int(1), Value::Int(2)]).to_string(),
        "int[1, 2]"
    );
    let rt = runtime();
    assert_eq!(
        Value::Handle(concat(&rt)).to_string(),
        "MethodHandle(Object,Object)Object"
    );
}

#[test]
fn array_bounds() {
    let Value::Array(arr) = Value::array(Ty::object(), vec![s("a"), s("b")]) else {
        unreachable!()
    };
    assert_eq!(arr.get(1).unwrap(), &s("b"));
    let err = arr.get(2).unwrap_err();
    assert_eq!(err.to_string(), "index 2 out of bounds for length 2");
    assert!(arr.get(-1).is_err());
}

#[test]
fn instance_fields_keep_assignment_order() {
    let obj = Instance::new(ClassKey::new("Point"));
    assert_eq!(obj.field("x"), Value::Null);
    obj.set_field("y", Value::Int(2));
    obj.set_field("x", Value::Int(1));
    obj.set_field("y", Value::Int(3));
    assert_eq!(obj.field("y"), Value::Int(3));
    assert_eq!(obj.field_names(), vec!["y".to_string(), "x".to_string()]);
}
