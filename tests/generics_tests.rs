//! Generic member types: resolution through type arguments and superclasses,
//! and recursive signatures that must not recurse forever.

use std::any::Any;

use jsonbind::{AnyValue, Binder, ClassDescriptor, Error, MemberDecl, TypeSignature};

fn var(name: &str, declared_by: &str) -> TypeSignature {
    TypeSignature::variable(name, declared_by)
}

#[derive(Default)]
struct Foo1 {
    foo2: Option<Box<Foo2>>,
}

#[derive(Default)]
struct Foo2 {
    foo1: Option<Box<Foo1>>,
}

/// `Foo1<A> { Foo2<? extends A> foo2 }` and `Foo2<B> { Foo1<? super B> foo1 }`.
fn mutual_binder() -> Binder {
    Binder::builder()
        .register_class(
            ClassDescriptor::builder("Foo1")
                .type_param("A")
                .constructor(Foo1::default)
                .optional_field(
                    "foo2",
                    TypeSignature::parameterized("Foo2", vec![TypeSignature::subtype_of(var("A", "Foo1"))]),
                    |f: &Foo1| f.foo2.as_deref(),
                    |f: &mut Foo1, v| f.foo2 = v.map(Box::new),
                )
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("Foo2")
                .type_param("B")
                .constructor(Foo2::default)
                .optional_field(
                    "foo1",
                    TypeSignature::parameterized("Foo1", vec![TypeSignature::supertype_of(var("B", "Foo2"))]),
                    |f: &Foo2| f.foo1.as_deref(),
                    |f: &mut Foo2, v| f.foo1 = v.map(Box::new),
                )
                .build(),
        )
        .build()
}

#[test]
fn test_mutually_recursive_wildcards() {
    let binder = mutual_binder();
    let raw = TypeSignature::class("Foo1");
    assert!(binder.adapter(&raw).unwrap().is_reflective());
    assert_eq!(binder.to_json(Some(&Foo1::default()), &raw).unwrap(), "{}");

    let nested = Foo1 {
        foo2: Some(Box::new(Foo2 {
            foo1: Some(Box::new(Foo1::default())),
        })),
    };
    let json = binder.to_json(Some(&nested), &raw).unwrap();
    assert_eq!(json, r#"{"foo2":{"foo1":{}}}"#);

    let back: Foo1 = binder.from_json_as(&json, &raw).unwrap().unwrap();
    let inner = back.foo2.and_then(|f| f.foo1);
    assert!(inner.is_some_and(|f| f.foo2.is_none()));

    let parameterized = TypeSignature::parameterized("Foo1", vec![TypeSignature::string()]);
    assert_eq!(binder.to_json(Some(&nested), &parameterized).unwrap(), json);
}

#[derive(Default)]
struct TestType {
    super_type: Option<Box<TestType>>,
}

#[derive(Default)]
struct TestType2 {
    sub_type: Option<Box<TestType2>>,
}

#[test]
fn test_self_referential_lower_bounds() {
    let binder = Binder::builder()
        .register_class(
            ClassDescriptor::builder("TestType")
                .type_param("X")
                .constructor(TestType::default)
                .optional_field(
                    "superType",
                    TypeSignature::parameterized("TestType", vec![TypeSignature::supertype_of(var("X", "TestType"))]),
                    |t: &TestType| t.super_type.as_deref(),
                    |t: &mut TestType, v| t.super_type = v.map(Box::new),
                )
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("TestType2")
                .type_param("X")
                .type_param("Y")
                .constructor(TestType2::default)
                .optional_field(
                    "subType",
                    TypeSignature::parameterized(
                        "TestType2",
                        vec![
                            TypeSignature::supertype_of(var("Y", "TestType2")),
                            TypeSignature::supertype_of(var("X", "TestType2")),
                        ],
                    ),
                    |t: &TestType2| t.sub_type.as_deref(),
                    |t: &mut TestType2, v| t.sub_type = v.map(Box::new),
                )
                .build(),
        )
        .build();

    let one = TypeSignature::parameterized("TestType", vec![TypeSignature::class("i32")]);
    assert_eq!(binder.to_json(Some(&TestType::default()), &one).unwrap(), "{}");
    let chained = TestType {
        super_type: Some(Box::new(TestType::default())),
    };
    assert_eq!(binder.to_json(Some(&chained), &one).unwrap(), r#"{"superType":{}}"#);

    let two = TypeSignature::parameterized("TestType2", vec![TypeSignature::class("i32"), TypeSignature::string()]);
    assert_eq!(binder.to_json(Some(&TestType2::default()), &two).unwrap(), "{}");
    let back: Option<TestType2> = binder.from_json_as(r#"{"subType":{"subType":{}}}"#, &two).unwrap();
    assert!(back.unwrap().sub_type.unwrap().sub_type.is_some());
}

#[test]
fn test_wildcard_constructors_normalize() {
    let number = TypeSignature::class("Number");
    assert_eq!(
        TypeSignature::supertype_of(TypeSignature::supertype_of(number.clone())),
        TypeSignature::supertype_of(number.clone())
    );
    assert_eq!(
        TypeSignature::subtype_of(TypeSignature::subtype_of(number.clone())),
        TypeSignature::subtype_of(number.clone())
    );
    assert_eq!(
        TypeSignature::subtype_of(TypeSignature::supertype_of(number)),
        TypeSignature::subtype_of(TypeSignature::object())
    );
    assert_eq!(TypeSignature::unbounded(), TypeSignature::subtype_of(TypeSignature::object()));
}

struct Holder {
    item: Option<AnyValue>,
}

fn holder_binder() -> Binder {
    Binder::builder()
        .register_class(
            ClassDescriptor::builder("Holder")
                .type_param("T")
                .constructor(|| Holder { item: None })
                .member(MemberDecl::untyped(
                    "item",
                    var("T", "Holder"),
                    |h: &Holder| h.item.as_deref(),
                    |h: &mut Holder, v| h.item = v,
                ))
                .build(),
        )
        .build()
}

#[test]
fn test_member_type_follows_type_argument() {
    let binder = holder_binder();

    let of_i32 = TypeSignature::parameterized("Holder", vec![TypeSignature::class("i32")]);
    let holder: Holder = binder.from_json_as(r#"{"item":7}"#, &of_i32).unwrap().unwrap();
    assert_eq!(holder.item.unwrap().downcast_ref::<i32>(), Some(&7));

    let err = binder.from_json(r#"{"item":7.5}"#, &of_i32).unwrap_err();
    assert!(matches!(err, Error::NumericRange { ref target, .. } if target == "i32"), "{err:?}");

    let of_string = TypeSignature::parameterized("Holder", vec![TypeSignature::string()]);
    let holder: Holder = binder.from_json_as(r#"{"item":"seven"}"#, &of_string).unwrap().unwrap();
    assert_eq!(holder.item.unwrap().downcast_ref::<String>().map(String::as_str), Some("seven"));

    let raw = TypeSignature::class("Holder");
    let holder: Holder = binder.from_json_as(r#"{"item":7}"#, &raw).unwrap().unwrap();
    assert_eq!(holder.item.unwrap().downcast_ref::<i64>(), Some(&7));
}

#[test]
fn test_member_type_follows_parameterized_superclass() {
    #[derive(Default)]
    struct Leaf {
        value: i32,
        label: String,
    }
    let binder = Binder::builder()
        .register_class(
            ClassDescriptor::builder("Base")
                .type_param("T")
                .abstract_class()
                .member(MemberDecl::untyped(
                    "value",
                    var("T", "Base"),
                    |leaf: &Leaf| Some(&leaf.value as &dyn Any),
                    |leaf: &mut Leaf, v| {
                        if let Some(v) = v.and_then(|v| v.downcast::<i32>().ok()) {
                            leaf.value = *v;
                        }
                    },
                ))
                .build(),
        )
        .register_class(
            ClassDescriptor::builder("Leaf")
                .extends(TypeSignature::parameterized("Base", vec![TypeSignature::class("i32")]))
                .constructor(Leaf::default)
                .field("label", TypeSignature::string(), |l: &Leaf| &l.label, |l: &mut Leaf, v| l.label = v)
                .build(),
        )
        .build();
    let leaf = TypeSignature::class("Leaf");

    let value = Leaf {
        value: 3,
        label: "x".to_string(),
    };
    assert_eq!(binder.to_json(Some(&value), &leaf).unwrap(), r#"{"value":3,"label":"x"}"#);

    let back: Leaf = binder.from_json_as(r#"{"label":"y","value":5}"#, &leaf).unwrap().unwrap();
    assert_eq!(back.value, 5);
    assert_eq!(back.label, "y");

    let err = binder.from_json(r#"{"value":"five"}"#, &leaf).unwrap_err();
    assert!(matches!(err, Error::Malformed { .. }), "{err:?}");
}

#[test]
fn test_parameterized_lists_resolve_elements() {
    #[derive(Default)]
    struct Bag {
        items: jsonbind::DynList,
    }
    let binder = Binder::builder()
        .register_class(
            ClassDescriptor::builder("Bag")
                .type_param("E")
                .constructor(Bag::default)
                .field(
                    "items",
                    TypeSignature::list_of(TypeSignature::subtype_of(var("E", "Bag"))),
                    |b: &Bag| &b.items,
                    |b: &mut Bag, v| b.items = v,
                )
                .build(),
        )
        .build();
    let of_u8 = TypeSignature::parameterized("Bag", vec![TypeSignature::class("u8")]);

    let bag: Bag = binder.from_json_as(r#"{"items":[1,null,255]}"#, &of_u8).unwrap().unwrap();
    assert_eq!(bag.items.len(), 3);
    assert_eq!(bag.items[2].as_ref().and_then(|v| v.downcast_ref::<u8>()), Some(&255));

    let err = binder.from_json(r#"{"items":[256]}"#, &of_u8).unwrap_err();
    assert!(matches!(err, Error::NumericRange { .. }), "{err:?}");
}
