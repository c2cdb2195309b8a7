//! Property-based tests for the ordered map and the binding round trip.
//!
//! The ordered map is checked against a plain vector model; bound values are
//! written and read back through a default binder.

use std::any::Any;

use jsonbind::{Binder, DynList, JsonValue, OrderedMap, TypeSignature};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, i32),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k % 32, v)),
        any::<u8>().prop_map(|k| Op::Remove(k % 32)),
    ]
}

fn round_trip<T: Any + Clone + PartialEq + std::fmt::Debug>(binder: &Binder, value: &T, sig: &TypeSignature) -> T {
    let json = binder.to_json(Some(value), sig).unwrap();
    let back: Option<T> = binder.from_json_as(&json, sig).unwrap();
    back.unwrap()
}

fn json_value() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::from),
        "[a-z \\\\\"\u{e9}]{0,8}".prop_map(JsonValue::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|entries| JsonValue::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_ordered_map_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let mut map = OrderedMap::new();
        let mut model: Vec<(u8, i32)> = Vec::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let previous = map.insert(k, v);
                    match model.iter_mut().find(|(key, _)| *key == k) {
                        Some(entry) => {
                            prop_assert_eq!(previous, Some(entry.1));
                            entry.1 = v;
                        }
                        None => {
                            prop_assert_eq!(previous, None);
                            model.push((k, v));
                        }
                    }
                }
                Op::Remove(k) => {
                    let removed = map.remove(&k);
                    let position = model.iter().position(|(key, _)| *key == k);
                    prop_assert_eq!(removed, position.map(|i| model.remove(i).1));
                }
            }
            let entries: Vec<(u8, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(&entries, &model);
            prop_assert_eq!(map.first().map(|(k, _)| *k), model.first().map(|(k, _)| *k));
            prop_assert_eq!(map.last().map(|(k, _)| *k), model.last().map(|(k, _)| *k));
        }
    }

    #[test]
    fn prop_ordered_map_clone_preserves_order(keys in prop::collection::vec(any::<i16>(), 0..40)) {
        let mut map = OrderedMap::new();
        for (i, k) in keys.iter().enumerate() {
            map.insert(*k, i);
        }
        let copy = map.clone();
        prop_assert_eq!(&copy, &map);
        prop_assert!(copy.keys().eq(map.keys()));
        prop_assert!(copy.iter_sorted().map(|(k, _)| *k).eq(map.iter_sorted().map(|(k, _)| *k)));
    }

    #[test]
    fn prop_i32(n in any::<i32>()) {
        let binder = Binder::new();
        prop_assert_eq!(round_trip(&binder, &n, &TypeSignature::class("i32")), n);
    }

    #[test]
    fn prop_i64(n in any::<i64>()) {
        let binder = Binder::new();
        prop_assert_eq!(round_trip(&binder, &n, &TypeSignature::class("i64")), n);
    }

    #[test]
    fn prop_u64(n in any::<u64>()) {
        let binder = Binder::new();
        prop_assert_eq!(round_trip(&binder, &n, &TypeSignature::class("u64")), n);
    }

    #[test]
    fn prop_finite_f64(n in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let binder = Binder::new();
        prop_assert_eq!(round_trip(&binder, &n, &TypeSignature::class("f64")), n);
    }

    #[test]
    fn prop_string(s in ".*") {
        let binder = Binder::new();
        prop_assert_eq!(round_trip(&binder, &s, &TypeSignature::string()), s);
    }

    #[test]
    fn prop_list_of_i32(v in prop::collection::vec(proptest::option::of(any::<i32>()), 0..20)) {
        let binder = Binder::new();
        let sig = TypeSignature::list_of(TypeSignature::class("i32"));
        let list: DynList = v.iter().map(|n| n.map(|n| Box::new(n) as Box<dyn Any>)).collect();
        let json = binder.to_json(Some(&list), &sig).unwrap();
        let back: Option<DynList> = binder.from_json_as(&json, &sig).unwrap();
        let back: Vec<Option<i32>> = back
            .unwrap()
            .into_iter()
            .map(|item| item.map(|b| *b.downcast::<i32>().unwrap()))
            .collect();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn prop_json_value_text_round_trip(value in json_value()) {
        let binder = Binder::builder().serialize_nulls().build();
        let sig = TypeSignature::json_value();
        let text = binder.to_json(Some(&value), &sig).unwrap();

        let cross: serde_json::Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(serde_json::to_value(&value).unwrap(), cross);

        let back: Option<JsonValue> = binder.from_json_as(&text, &sig).unwrap();
        prop_assert_eq!(back.unwrap(), value);
    }
}
