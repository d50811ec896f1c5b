//! Property-based round-trip fuzzing over generated value graphs (spec §8:
//! "for every value V in the supported domain, `deserialize(serialize(V))`
//! is semantically equivalent to V").
//!
//! The generator builds plain/literal objects, dense arrays, strings, bools
//! and finite numbers recursively, the way `h264-parser`'s `tests/proptests.rs`
//! builds its structured streams: a handful of leaf strategies combined with
//! `prop::strategy::Strategy::prop_recursive` for the composite cases, rather
//! than an exhaustive per-type grid.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use dynawire::value::{ArraySlot, ObjectValue, PropertyEntry, Value};
use dynawire::{Codec, CodecOptions};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,9}"
}

fn arb_string() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::Bool),
        any::<f64>()
            .prop_filter("finite", |n| n.is_finite())
            .prop_map(Value::Number),
        arb_string().prop_map(Value::string),
    ]
}

/// Recursively build arrays (dense, no holes) and plain objects (deduped,
/// sorted keys) up to a modest depth/size so cases stay small and fast.
fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::array),
            prop::collection::btree_map(arb_key(), inner, 0..8).prop_map(|map| {
                let properties = map
                    .into_iter()
                    .map(|(k, v)| PropertyEntry::data(k, v))
                    .collect();
                Value::Object(Rc::new(RefCell::new(ObjectValue {
                    constructor_name: None,
                    properties,
                })))
            }),
        ]
    })
}

/// Structural equality ignoring heap identity: the round-trip invariant is
/// about semantic equivalence, not pointer equality (that is covered
/// separately by the shared/cyclic-reference tests).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|(a, b)| match (a, b) {
                    (None, None) => true,
                    (Some(a), Some(b)) => values_equal(a, b),
                    _ => false,
                })
        }
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.properties.len() == y.properties.len()
                && x.properties.iter().zip(y.properties.iter()).all(|(a, b)| {
                    a.key == b.key
                        && match (&a.value, &b.value) {
                            (
                                dynawire::value::PropertyValue::Data(a),
                                dynawire::value::PropertyValue::Data(b),
                            ) => values_equal(a, b),
                            _ => false,
                        }
                })
        }
        _ => false,
    }
}

proptest! {
    #[test]
    fn round_trip_preserves_generated_value_graphs(value in arb_value()) {
        let codec = Codec::new(CodecOptions::default());
        let bytes = codec.serialize(&value).unwrap();
        let decoded = codec.deserialize(&bytes).unwrap();
        prop_assert!(values_equal(&value, &decoded));
    }

    #[test]
    fn decode_idempotence_over_generated_graphs(value in arb_value()) {
        let codec = Codec::new(CodecOptions::default());
        let bytes = codec.serialize(&value).unwrap();
        let first = codec.deserialize(&bytes).unwrap();
        let second = codec.deserialize(&bytes).unwrap();
        prop_assert!(values_equal(&first, &second));
    }

    #[test]
    fn sparse_arrays_preserve_holes_and_present_values(
        slots in prop::collection::vec(prop::option::of(arb_leaf()), 0..8)
    ) {
        let array: Vec<ArraySlot> = slots;
        let value = Value::Array(Rc::new(RefCell::new(array)));
        let codec = Codec::new(CodecOptions::default());
        let bytes = codec.serialize(&value).unwrap();
        let decoded = codec.deserialize(&bytes).unwrap();
        prop_assert!(values_equal(&value, &decoded));
    }
}
