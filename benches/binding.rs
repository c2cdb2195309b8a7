use std::any::Any;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsonbind::adapter::round_trip;
use jsonbind::{AnyValue, Binder, ClassDescriptor, DynList, TypeSignature};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Default)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Clone, Default)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn binder() -> Binder {
    Binder::builder()
        .register_class(
            ClassDescriptor::builder("User")
                .constructor(User::default)
                .field("id", TypeSignature::class("u32"), |u: &User| &u.id, |u: &mut User, v| u.id = v)
                .field("name", TypeSignature::string(), |u: &User| &u.name, |u: &mut User, v| u.name = v)
                .field("email", TypeSignature::string(), |u: &User| &u.email, |u: &mut User, v| u.email = v)
                .field("active", TypeSignature::class("bool"), |u: &User| &u.active, |u: &mut User, v| u.active = v)
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("Product")
                .constructor(Product::default)
                .field("sku", TypeSignature::string(), |p: &Product| &p.sku, |p: &mut Product, v| p.sku = v)
                .field("name", TypeSignature::string(), |p: &Product| &p.name, |p: &mut Product, v| p.name = v)
                .field("price", TypeSignature::class("f64"), |p: &Product| &p.price, |p: &mut Product, v| p.price = v)
                .field(
                    "quantity",
                    TypeSignature::class("u32"),
                    |p: &Product| &p.quantity,
                    |p: &mut Product, v| p.quantity = v,
                )
                .build(),
        )
        .build()
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: u32) -> DynList {
    (0..size)
        .map(|i| {
            Some(Box::new(Product {
                sku: format!("SKU{i}"),
                name: format!("Product {i}"),
                price: 9.99 + f64::from(i),
                quantity: i,
            }) as AnyValue)
        })
        .collect()
}

fn benchmark_serialize_record(c: &mut Criterion) {
    let binder = binder();
    let sig = TypeSignature::class("User");
    let user = alice();

    c.bench_function("serialize_record", |b| {
        b.iter(|| binder.to_json(Some(black_box(&user)), &sig))
    });
}

fn benchmark_deserialize_record(c: &mut Criterion) {
    let binder = binder();
    let sig = TypeSignature::class("User");
    let json = r#"{"id":123,"name":"Alice","email":"alice@example.com","active":true}"#;

    c.bench_function("deserialize_record", |b| {
        b.iter(|| binder.from_json(black_box(json), &sig))
    });
}

fn benchmark_record_lists(c: &mut Criterion) {
    let binder = binder();
    let sig = TypeSignature::list_of(TypeSignature::class("Product"));
    let mut group = c.benchmark_group("product_list");

    for size in [10, 100, 500] {
        let list = products(size);
        let json = binder.to_json(Some(&list), &sig).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("serialize", size), &list, |b, list| {
            b.iter(|| binder.to_json(Some(black_box(list)), &sig))
        });
        group.bench_with_input(BenchmarkId::new("deserialize", size), &json, |b, json| {
            b.iter(|| binder.from_json(black_box(json), &sig))
        });
    }
    group.finish();
}

fn benchmark_untyped_document(c: &mut Criterion) {
    let binder = binder();
    let sig = TypeSignature::object();
    let json = r#"{"id":42,"metadata":{"created":"2023-01-01T00:00:00Z","version":3},"tags":["important","verified",null],"ratio":0.25}"#;

    c.bench_function("deserialize_untyped", |b| {
        b.iter(|| binder.from_json(black_box(json), &sig))
    });

    let document = binder.from_json(json, &sig).ok().flatten();
    c.bench_function("serialize_untyped", |b| {
        b.iter(|| binder.to_json(black_box(document.as_deref()), &sig))
    });
}

fn benchmark_tree_round_trip(c: &mut Criterion) {
    let binder = binder();
    let Ok(adapter) = binder.adapter(&TypeSignature::class("User")) else {
        return;
    };
    let user = alice();

    c.bench_function("tree_round_trip", |b| {
        b.iter(|| round_trip(adapter.as_ref(), Some(black_box(&user as &dyn Any))))
    });
}

fn benchmark_comparison_with_serde_json(c: &mut Criterion) {
    let binder = binder();
    let sig = TypeSignature::class("User");
    let user = alice();

    let mut group = c.benchmark_group("comparison");
    group.bench_function("jsonbind", |b| b.iter(|| binder.to_json(Some(black_box(&user)), &sig)));
    group.bench_function("serde_json", |b| b.iter(|| serde_json::to_string(black_box(&user))));
    group.finish();
}

criterion_group!(
    benches,
    benchmark_serialize_record,
    benchmark_deserialize_record,
    benchmark_record_lists,
    benchmark_untyped_document,
    benchmark_tree_round_trip,
    benchmark_comparison_with_serde_json
);
criterion_main!(benches);
