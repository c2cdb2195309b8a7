use std::any::Any;
use std::sync::Arc;

use jsonbind::adapters::SerdeAdapter;
use jsonbind::{
    AnyValue, Binder, ClassDescriptor, ClassRef, Direction, DynList, DynMap, Error, ExclusionStrategy, MemberDecl,
    MemberDescriptor, Modifiers, TypeSignature,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Debug, Default)]
struct Order {
    order_id: u32,
    customer: User,
    items: DynList,
}

#[derive(Debug, Default, PartialEq)]
struct Node {
    value: i32,
    next: Option<Box<Node>>,
}

fn user_class() -> ClassDescriptor {
    ClassDescriptor::builder("User")
        .constructor(User::default)
        .field("id", TypeSignature::class("u32"), |u: &User| &u.id, |u: &mut User, v| u.id = v)
        .field("name", TypeSignature::string(), |u: &User| &u.name, |u: &mut User, v| u.name = v)
        .field("active", TypeSignature::class("bool"), |u: &User| &u.active, |u: &mut User, v| u.active = v)
        .field(
            "tags",
            TypeSignature::list_of(TypeSignature::string()),
            |u: &User| &u.tags,
            |u: &mut User, v| u.tags = v,
        )
        .build()
}

fn product_class() -> ClassDescriptor {
    ClassDescriptor::builder("Product")
        .constructor(Product::default)
        .field("sku", TypeSignature::string(), |p: &Product| &p.sku, |p: &mut Product, v| p.sku = v)
        .field("price", TypeSignature::class("f64"), |p: &Product| &p.price, |p: &mut Product, v| p.price = v)
        .field(
            "quantity",
            TypeSignature::class("u32"),
            |p: &Product| &p.quantity,
            |p: &mut Product, v| p.quantity = v,
        )
        .build()
}

fn order_class() -> ClassDescriptor {
    ClassDescriptor::builder("Order")
        .constructor(Order::default)
        .field("orderId", TypeSignature::class("u32"), |o: &Order| &o.order_id, |o: &mut Order, v| o.order_id = v)
        .field("customer", TypeSignature::class("User"), |o: &Order| &o.customer, |o: &mut Order, v| o.customer = v)
        .field(
            "items",
            TypeSignature::list_of(TypeSignature::class("Product")),
            |o: &Order| &o.items,
            |o: &mut Order, v| o.items = v,
        )
        .build()
}

fn node_class() -> ClassDescriptor {
    ClassDescriptor::builder("Node")
        .constructor(Node::default)
        .field("value", TypeSignature::class("i32"), |n: &Node| &n.value, |n: &mut Node, v| n.value = v)
        .optional_field(
            "next",
            TypeSignature::class("Node"),
            |n: &Node| n.next.as_deref(),
            |n: &mut Node, v| n.next = v.map(Box::new),
        )
        .build()
}

/// A binder knowing the record classes above. `List<String>` is bound to
/// `Vec<String>` through serde.
fn binder() -> Binder {
    Binder::builder()
        .register_class(user_class())
        .register_class(product_class())
        .register_class(order_class())
        .register_class(node_class())
        .register_serde::<Vec<String>>(TypeSignature::list_of(TypeSignature::string()))
        .build()
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

#[test]
fn test_simple_record() {
    let binder = binder();
    let user = TypeSignature::class("User");

    let json = binder.to_json(Some(&alice()), &user).unwrap();
    assert_eq!(json, r#"{"id":123,"name":"Alice","active":true,"tags":["admin","developer"]}"#);

    let back: Option<User> = binder.from_json_as(&json, &user).unwrap();
    assert_eq!(back, Some(alice()));
}

#[test]
fn test_nested_record_with_array_of_objects() {
    let binder = binder();
    let order_sig = TypeSignature::class("Order");
    let order = Order {
        order_id: 12345,
        customer: alice(),
        items: vec![
            Some(Box::new(Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            }) as AnyValue),
            None,
        ],
    };

    let json = binder.to_json(Some(&order), &order_sig).unwrap();
    assert_eq!(
        json,
        r#"{"orderId":12345,"customer":{"id":123,"name":"Alice","active":true,"tags":["admin","developer"]},"items":[{"sku":"WIDGET-001","price":29.99,"quantity":2},null]}"#
    );

    let back: Order = binder.from_json_as(&json, &order_sig).unwrap().unwrap();
    assert_eq!(back.order_id, 12345);
    assert_eq!(back.customer, alice());
    assert_eq!(back.items.len(), 2);
    let first = back.items[0].as_ref().and_then(|p| p.downcast_ref::<Product>()).unwrap();
    assert_eq!(first.sku, "WIDGET-001");
    assert!(back.items[1].is_none());

    assert_eq!(binder.to_json(Some(&back), &order_sig).unwrap(), json);
}

#[test]
fn test_self_referential_record() {
    let binder = binder();
    let node_sig = TypeSignature::class("Node");
    let chain = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            next: Some(Box::new(Node { value: 3, next: None })),
        })),
    };

    let json = binder.to_json(Some(&chain), &node_sig).unwrap();
    assert_eq!(json, r#"{"value":1,"next":{"value":2,"next":{"value":3}}}"#);
    let back: Option<Node> = binder.from_json_as(&json, &node_sig).unwrap();
    assert_eq!(back, Some(chain));
}

#[test]
fn test_untyped_document() {
    let binder = Binder::new();
    let json = r#"{"a":5,"b":[1,2,null],"c":{"x":"y"},"d":9223372036854775807}"#;
    let map: DynMap = binder.from_json_as(json, &TypeSignature::object()).unwrap().unwrap();

    assert_eq!(map.len(), 4);
    let entry = |key: &str| map.get(key).and_then(|v| v.as_ref());
    assert_eq!(entry("a").and_then(|v| v.downcast_ref::<i64>()), Some(&5));
    assert_eq!(entry("d").and_then(|v| v.downcast_ref::<i64>()), Some(&i64::MAX));

    let b = entry("b").and_then(|v| v.downcast_ref::<DynList>()).unwrap();
    let b: Vec<Option<i64>> = b
        .iter()
        .map(|item| item.as_ref().and_then(|v| v.downcast_ref::<i64>()).copied())
        .collect();
    assert_eq!(b, [Some(1), Some(2), None]);

    let c = entry("c").and_then(|v| v.downcast_ref::<DynMap>()).unwrap();
    assert_eq!(
        c.get("x").and_then(|v| v.as_ref()).and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
        Some("y")
    );

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, ["a", "b", "c", "d"]);
}

#[derive(Debug, PartialEq)]
struct Person {
    name: Option<String>,
    age: i32,
}

fn person_binder(serialize_nulls: bool) -> Binder {
    let builder = Binder::builder().register_class(
        ClassDescriptor::builder("Person")
            .constructor(|| Person { name: Some("unnamed".to_string()), age: 18 })
            .optional_field("name", TypeSignature::string(), |p: &Person| p.name.as_ref(), |p: &mut Person, v| p.name = v)
            .field("age", TypeSignature::class("i32"), |p: &Person| &p.age, |p: &mut Person, v| p.age = v)
            .build(),
    );
    if serialize_nulls {
        builder.serialize_nulls().build()
    } else {
        builder.build()
    }
}

#[test]
fn test_null_members() {
    let person = TypeSignature::class("Person");
    let nobody = Person { name: None, age: 40 };

    assert_eq!(person_binder(false).to_json(Some(&nobody), &person).unwrap(), r#"{"age":40}"#);
    assert_eq!(
        person_binder(true).to_json(Some(&nobody), &person).unwrap(),
        r#"{"name":null,"age":40}"#
    );

    let back: Person = person_binder(false)
        .from_json_as(r#"{"name":null,"age":null}"#, &person)
        .unwrap()
        .unwrap();
    assert_eq!(back, Person { name: None, age: 18 });

    let defaults: Person = person_binder(false).from_json_as("{}", &person).unwrap().unwrap();
    assert_eq!(defaults, Person { name: Some("unnamed".to_string()), age: 18 });
}

#[test]
fn test_duplicate_keys_last_wins() {
    let person = TypeSignature::class("Person");
    let back: Person = person_binder(false)
        .from_json_as(r#"{"age":1,"age":2}"#, &person)
        .unwrap()
        .unwrap();
    assert_eq!(back.age, 2);

    let map: DynMap = Binder::new()
        .from_json_as(r#"{"k":1,"j":0,"k":2}"#, &TypeSignature::object())
        .unwrap()
        .unwrap();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, ["k", "j"]);
    assert_eq!(map.get("k").and_then(|v| v.as_ref()).and_then(|v| v.downcast_ref::<i64>()), Some(&2));
}

#[derive(Debug, Default, PartialEq)]
struct Account {
    login: String,
    password: String,
    created: i64,
    token: String,
}

fn account_class() -> ClassDescriptor {
    ClassDescriptor::builder("Account")
        .constructor(Account::default)
        .field("login", TypeSignature::string(), |a: &Account| &a.login, |a: &mut Account, v| a.login = v)
        .member(
            MemberDecl::field("password", TypeSignature::string(), |a: &Account| &a.password, |a: &mut Account, v| {
                a.password = v
            })
            .with_expose(false, true),
        )
        .member(
            MemberDecl::field("created", TypeSignature::class("i64"), |a: &Account| &a.created, |a: &mut Account, v| {
                a.created = v
            })
            .with_expose(true, true)
            .since(1.1),
        )
        .member(
            MemberDecl::field("token", TypeSignature::string(), |a: &Account| &a.token, |a: &mut Account, v| a.token = v)
                .with_modifiers(Modifiers::TRANSIENT),
        )
        .build()
}

fn account() -> Account {
    Account {
        login: "ada".to_string(),
        password: "secret".to_string(),
        created: 1_700_000_000,
        token: "t0k3n".to_string(),
    }
}

#[test]
fn test_require_expose() {
    let binder = Binder::builder().register_class(account_class()).require_expose().build();
    let sig = TypeSignature::class("Account");

    let json = binder.to_json(Some(&account()), &sig).unwrap();
    assert_eq!(json, r#"{"created":1700000000}"#);

    let back: Account = binder
        .from_json_as(r#"{"login":"x","password":"p","created":5,"token":"t"}"#, &sig)
        .unwrap()
        .unwrap();
    assert_eq!(back.login, "");
    assert_eq!(back.password, "p");
    assert_eq!(back.created, 5);
    assert_eq!(back.token, "");
}

#[test]
fn test_versions_and_modifiers() {
    let sig = TypeSignature::class("Account");

    let old = Binder::builder().register_class(account_class()).version(1.0).build();
    assert_eq!(
        old.to_json(Some(&account()), &sig).unwrap(),
        r#"{"login":"ada","password":"secret"}"#
    );

    let current = Binder::builder().register_class(account_class()).version(1.1).build();
    assert!(current.to_json(Some(&account()), &sig).unwrap().contains("created"));

    let with_transient = Binder::builder()
        .register_class(account_class())
        .exclude_fields_with_modifiers(Modifiers::STATIC)
        .build();
    assert!(with_transient.to_json(Some(&account()), &sig).unwrap().contains(r#""token":"t0k3n""#));
}

struct SkipSecrets;

impl ExclusionStrategy for SkipSecrets {
    fn should_skip_member(&self, member: &MemberDescriptor) -> bool {
        member.name == "password"
    }

    fn should_skip_class(&self, class: &ClassRef) -> bool {
        class.name() == "Account"
    }
}

#[test]
fn test_custom_exclusion_strategy() {
    let user = TypeSignature::class("User");
    let binder = Binder::builder()
        .register_class(account_class())
        .register_class(user_class())
        .register_serde::<Vec<String>>(TypeSignature::list_of(TypeSignature::string()))
        .add_exclusion_strategy(SkipSecrets, Direction::Serialize)
        .build();

    assert_eq!(binder.to_json(Some(&account()), &TypeSignature::class("Account")).unwrap(), "null");
    let back: Account = binder
        .from_json_as(r#"{"login":"x","password":"p"}"#, &TypeSignature::class("Account"))
        .unwrap()
        .unwrap();
    assert_eq!(back.password, "p");

    assert!(binder.to_json(Some(&alice()), &user).unwrap().contains("Alice"));
}

#[test]
fn test_inner_classes_can_be_disabled() {
    #[derive(Default)]
    struct Outer {
        id: i32,
        inner: Inner,
    }
    #[derive(Default)]
    struct Inner {
        x: i32,
    }
    let classes = |builder: jsonbind::BinderBuilder| {
        builder
            .register_class(
                ClassDescriptor::builder("Inner")
                    .inner()
                    .constructor(Inner::default)
                    .field("x", TypeSignature::class("i32"), |i: &Inner| &i.x, |i: &mut Inner, v| i.x = v)
                    .build(),
            )
            .register_class(
                ClassDescriptor::builder("Outer")
                    .constructor(Outer::default)
                    .field("id", TypeSignature::class("i32"), |o: &Outer| &o.id, |o: &mut Outer, v| o.id = v)
                    .field("inner", TypeSignature::class("Inner"), |o: &Outer| &o.inner, |o: &mut Outer, v| o.inner = v)
                    .build(),
            )
    };
    let value = Outer { id: 1, inner: Inner { x: 2 } };
    let sig = TypeSignature::class("Outer");

    let enabled = classes(Binder::builder()).build();
    assert_eq!(enabled.to_json(Some(&value), &sig).unwrap(), r#"{"id":1,"inner":{"x":2}}"#);

    let disabled = classes(Binder::builder()).disable_inner_class_serialization().build();
    assert_eq!(disabled.to_json(Some(&value), &sig).unwrap(), r#"{"id":1}"#);
    assert_eq!(disabled.to_json(Some(&value.inner), &TypeSignature::class("Inner")).unwrap(), "null");
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Circle {
    radius: f64,
}

struct Holder {
    item: Option<Box<dyn Any>>,
}

fn shapes_binder() -> Binder {
    Binder::builder()
        .register_class(ClassDescriptor::builder("Shape").abstract_class().build())
        .register_class(
            ClassDescriptor::builder("Circle")
                .extends(TypeSignature::class("Shape"))
                .constructor(Circle::default)
                .field("radius", TypeSignature::class("f64"), |c: &Circle| &c.radius, |c: &mut Circle, v| c.radius = v)
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("Holder")
                .constructor(|| Holder { item: None })
                .member(MemberDecl::untyped(
                    "item",
                    TypeSignature::object(),
                    |h: &Holder| h.item.as_deref(),
                    |h: &mut Holder, v| h.item = v,
                ))
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("ShapeHolder")
                .constructor(|| Holder { item: None })
                .member(MemberDecl::untyped(
                    "item",
                    TypeSignature::class("Shape"),
                    |h: &Holder| h.item.as_deref(),
                    |h: &mut Holder, v| h.item = v,
                ))
                .build(),
        )
        .build()
}

#[test]
fn test_runtime_type_of_untyped_member() {
    let binder = shapes_binder();
    let holder = Holder {
        item: Some(Box::new(Circle { radius: 2.0 })),
    };
    let json = binder.to_json(Some(&holder), &TypeSignature::class("Holder")).unwrap();
    assert_eq!(json, r#"{"item":{"radius":2.0}}"#);

    let back: Holder = binder.from_json_as(&json, &TypeSignature::class("Holder")).unwrap().unwrap();
    let item = back.item.unwrap();
    let map = item.downcast_ref::<DynMap>().unwrap();
    assert_eq!(
        map.get("radius").and_then(|v| v.as_ref()).and_then(|v| v.downcast_ref::<f64>()),
        Some(&2.0)
    );
}

#[test]
fn test_runtime_subclass_replaces_declared_reflective_type() {
    let binder = shapes_binder();
    let holder = Holder {
        item: Some(Box::new(Circle { radius: 1.5 })),
    };
    let sig = TypeSignature::class("ShapeHolder");
    assert_eq!(binder.to_json(Some(&holder), &sig).unwrap(), r#"{"item":{"radius":1.5}}"#);

    let err = binder.from_json(r#"{"item":{"radius":1.5}}"#, &sig).unwrap_err();
    assert!(matches!(err, Error::NoInstantiationStrategy { ref type_name } if type_name == "Shape"));
}

#[test]
fn test_instance_creator_for_abstract_class() {
    #[derive(Default)]
    struct Config {
        level: i32,
    }
    let binder = Binder::builder()
        .register_class(
            ClassDescriptor::builder("Config")
                .abstract_class()
                .rust_type::<Config>()
                .field("level", TypeSignature::class("i32"), |c: &Config| &c.level, |c: &mut Config, v| c.level = v)
                .build(),
        )
        .register_instance_creator("Config", || Config { level: 9 })
        .build();
    let sig = TypeSignature::class("Config");

    let config: Config = binder.from_json_as("{}", &sig).unwrap().unwrap();
    assert_eq!(config.level, 9);
    let config: Config = binder.from_json_as(r#"{"level":3}"#, &sig).unwrap().unwrap();
    assert_eq!(config.level, 3);
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn test_serde_bridge_inside_records_and_untyped_lists() {
    #[derive(Default)]
    struct Segment {
        from: Option<Point>,
        to: Option<Point>,
    }
    let point = TypeSignature::class("Point");
    let binder = Binder::builder()
        .register_serde::<Point>(point.clone())
        .register_class(
            ClassDescriptor::builder("Segment")
                .constructor(Segment::default)
                .optional_field("from", point.clone(), |s: &Segment| s.from.as_ref(), |s: &mut Segment, v| s.from = v)
                .optional_field("to", point.clone(), |s: &Segment| s.to.as_ref(), |s: &mut Segment, v| s.to = v)
                .build(),
        )
        .build();

    let segment = Segment {
        from: Some(Point { x: 0, y: 0 }),
        to: None,
    };
    let json = binder.to_json(Some(&segment), &TypeSignature::class("Segment")).unwrap();
    assert_eq!(json, r#"{"from":{"x":0,"y":0}}"#);

    let back: Segment = binder
        .from_json_as(r#"{"from":{"x":1,"y":2},"to":{"x":3,"y":4}}"#, &TypeSignature::class("Segment"))
        .unwrap()
        .unwrap();
    assert_eq!(back.to, Some(Point { x: 3, y: 4 }));

    let untyped: DynList = vec![Some(Box::new(Point { x: 5, y: 6 }) as AnyValue), Some(Box::new(true))];
    assert_eq!(
        binder.to_json(Some(&untyped), &TypeSignature::object()).unwrap(),
        r#"[{"x":5,"y":6},true]"#
    );

    let direct = binder.adapter(&point).unwrap();
    assert!(!direct.is_reflective());
    let plain = jsonbind::adapter::typed(SerdeAdapter::<Point>::new());
    assert_eq!(
        plain.to_tree(Some(&Point { x: 1, y: 1 })).unwrap(),
        jsonbind::json!({"x": 1, "y": 1})
    );
}

#[test]
fn test_error_kinds() {
    let binder = binder();
    let user = TypeSignature::class("User");

    let err = binder.from_json(r#"{"id":"#, &user).unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }), "{err:?}");

    let err = binder.from_json("[1]", &user).unwrap_err();
    assert!(matches!(err, Error::Malformed { ref path, .. } if path == "$"), "{err:?}");

    let err = binder.from_json(r#"{"id":1.5}"#, &user).unwrap_err();
    assert!(matches!(err, Error::NumericRange { ref target, .. } if target == "u32"), "{err:?}");

    let err = binder.from_json(r#"{"id":-1}"#, &user).unwrap_err();
    assert!(matches!(err, Error::NumericRange { .. }), "{err:?}");

    let keyed = TypeSignature::parameterized("Map", vec![TypeSignature::class("i32"), TypeSignature::string()]);
    assert!(matches!(binder.adapter(&keyed), Err(Error::NoAdapter { .. })));

    let err = binder.to_json(Some(&5i32), &user).unwrap_err();
    assert!(matches!(err, Error::Malformed { .. }), "{err:?}");
}

#[test]
fn test_adapters_are_cached_and_shared_across_threads() {
    let binder = binder();
    let sig = TypeSignature::class("Order");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let binder = binder.clone();
            let sig = sig.clone();
            std::thread::spawn(move || binder.adapter(&sig).unwrap())
        })
        .collect();
    let adapters: Vec<Arc<dyn jsonbind::TypeAdapter>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for adapter in &adapters[1..] {
        assert!(Arc::ptr_eq(&adapters[0], adapter));
    }
    assert!(adapters[0].is_reflective());

    let cached = binder.registry().cached();
    binder.adapter(&sig).unwrap();
    assert_eq!(binder.registry().cached(), cached);
}

#[test]
fn test_tree_entry_points() {
    let binder = binder();
    let user = TypeSignature::class("User");
    let tree = binder.to_tree(Some(&alice()), &user).unwrap();
    assert_eq!(tree.get("name").and_then(|v| v.as_str()), Some("Alice"));
    assert_eq!(tree.get("tags").and_then(|v| v.as_array()).map(Vec::len), Some(2));

    let back: User = *binder
        .from_tree(tree, &user)
        .unwrap()
        .unwrap()
        .downcast::<User>()
        .unwrap();
    assert_eq!(back, alice());
}
