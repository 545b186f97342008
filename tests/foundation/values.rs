//! Tests for the dynamic value type.

use weft_foundation::{Value, record};

#[test]
fn conversions_round_through_accessors() {
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from(7i64).as_int(), Some(7));
    assert_eq!(Value::from(1.5).as_float(), Some(1.5));
    assert_eq!(Value::from("neck").as_str(), Some("neck"));
    assert_eq!(Value::from(vec![1i64, 2]).as_list().map(|l| l.len()), Some(2));
}

#[test]
fn accessors_reject_other_types() {
    assert_eq!(Value::from("neck").as_int(), None);
    assert_eq!(Value::Int(1).as_str(), None);
    assert_eq!(Value::Nil.as_bool(), None);
}

#[test]
fn as_number_widens_ints() {
    assert_eq!(Value::Int(2).as_number(), Some(2.0));
    assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
    assert_eq!(Value::from("x").as_number(), None);
}

#[test]
fn float_equality_is_bitwise() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
}

#[test]
fn record_helper_builds_lookup_table() {
    let row = record(&[("region", Value::from("neck")), ("level", Value::Int(4))]);
    assert_eq!(row.len(), 2);
    assert_eq!(row.get("region"), Some(&Value::from("neck")));
    assert_eq!(row.get("absent"), None);
}

#[test]
fn nested_records_compare_structurally() {
    let a = record(&[("inner", Value::Record(record(&[("n", Value::Int(1))])))]);
    let b = record(&[("inner", Value::Record(record(&[("n", Value::Int(1))])))]);
    assert_eq!(a, b);
}

#[test]
fn display_is_human_readable() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::from("ada").to_string(), "ada");
    assert_eq!(Value::from(vec![1i64, 2]).to_string(), "[1 2]");
}
