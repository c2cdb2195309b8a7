//! # jsonbind
//!
//! A descriptor-driven object binding engine for JSON.
//!
//! Values are converted to and from JSON by *adapters*, looked up by the
//! value's type signature. Record-like types are described once in a
//! [`TypeCatalog`] and bound member by member; everything else is handled by
//! built-in adapters, by adapters registered on a [`BinderBuilder`], or by
//! serde through [`SerdeAdapter`](adapters::SerdeAdapter).
//!
//! ## Key Features
//!
//! - **Generic types**: member types are resolved against the type arguments
//!   of the enclosing signature, including recursive bounds such as
//!   `Foo<? super T>`
//! - **Layered registrations**: exact-type adapters, hierarchy adapters and
//!   factories, with per-direction overrides
//! - **Exclusion**: modifiers, versions, expose markers and custom strategies
//! - **Enums**: constants written by name, with serialized names and alternates
//! - **Streaming and trees**: adapters drive token streams, so the same adapter
//!   writes JSON text and [`JsonValue`] trees
//! - **Insertion-ordered objects**: backed by [`OrderedMap`]
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonbind::{Binder, ClassDescriptor, TypeSignature};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Option<String>,
//! }
//!
//! let binder = Binder::builder()
//!     .register_class(
//!         ClassDescriptor::builder("User")
//!             .constructor(User::default)
//!             .field("id", TypeSignature::class("u32"), |u: &User| &u.id, |u: &mut User, v| u.id = v)
//!             .field("name", TypeSignature::string(), |u: &User| &u.name, |u: &mut User, v| u.name = v)
//!             .optional_field("tags", TypeSignature::string(), |u: &User| u.tags.as_ref(), |u: &mut User, v| u.tags = v)
//!             .build(),
//!     )
//!     .build();
//!
//! let user = TypeSignature::class("User");
//! let alice = User { id: 7, name: "Alice".to_string(), tags: None };
//!
//! let json = binder.to_json(Some(&alice), &user).unwrap();
//! assert_eq!(json, r#"{"id":7,"name":"Alice"}"#);
//!
//! let back: Option<User> = binder.from_json_as(&json, &user).unwrap();
//! assert_eq!(back, Some(alice));
//! ```
//!
//! ### Untyped Documents
//!
//! ```rust
//! use jsonbind::{Binder, DynMap, TypeSignature};
//!
//! let binder = Binder::new();
//! let doc: Option<DynMap> = binder
//!     .from_json_as(r#"{"a": 5, "b": [1, 2, null]}"#, &TypeSignature::object())
//!     .unwrap();
//! let doc = doc.unwrap();
//! assert_eq!(doc.len(), 2);
//! assert_eq!(doc.get("a").and_then(|v| v.as_ref()).and_then(|v| v.downcast_ref::<i64>()), Some(&5));
//! ```
//!
//! ### Dynamic Values with the json! Macro
//!
//! ```rust
//! use jsonbind::{json, JsonValue};
//!
//! let data = json!({
//!     "name": "Alice",
//!     "age": 30,
//!     "tags": ["rust", "json"]
//! });
//!
//! if let JsonValue::Object(obj) = &data {
//!     assert_eq!(obj.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! }
//! assert_eq!(data.to_string(), r#"{"name":"Alice","age":30,"tags":["rust","json"]}"#);
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events when binders and adapters are built and
//! when construction failures are cached. It never installs a subscriber.

pub mod adapter;
pub mod adapters;
pub mod binder;
pub mod catalog;
pub mod de;
pub mod error;
pub mod exclusion;
pub mod macros;
pub mod map;
pub mod naming;
pub mod options;
pub mod reflective;
pub mod registry;
pub mod resolver;
pub mod ser;
pub mod signature;
pub mod stream;
pub mod value;

pub use adapter::{AdapterFactory, AdapterKind, BindContext, NullSafe, TypeAdapter, TypedAdapter};
pub use binder::{Binder, BinderBuilder};
pub use catalog::{
    AnyValue, ClassDescriptor, ClassKind, Constructor, DynList, DynMap, EnumConstant, MemberDecl, MemberDescriptor,
    Modifiers, Nesting, TypeCatalog,
};
pub use de::{from_value, ValueDeserializer};
pub use error::{Error, Result};
pub use exclusion::{Direction, ExclusionPolicy, ExclusionStrategy};
pub use map::{Comparator, FnOrder, NaturalOrder, OrderedMap, TotalComparator};
pub use naming::{FieldNamingPolicy, FieldNamingStrategy};
pub use options::{BindOptions, NON_EXECUTABLE_PREFIX};
pub use registry::{FactoryContext, Registry};
pub use resolver::Resolver;
pub use ser::{to_value, ValueSerializer};
pub use signature::{ClassRef, TypeSignature};
pub use value::{JsonObject, JsonValue, Number};
