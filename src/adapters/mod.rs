//! Built-in adapter factories.
//!
//! The registry consults these after every user registration has declined,
//! in this order:
//!
//! 1. [`JsonValueFactory`]: [`JsonValue`](crate::JsonValue) trees as-is
//! 2. [`ObjectFactory`]: untyped `Object`, dispatched on the runtime class
//! 3. [`PrimitiveFactory`]: numbers, `bool`, `char` and `String`
//! 4. [`EnumFactory`]: enum classes, by constant name
//! 5. [`ListFactory`] and [`MapFactory`]: `List<E>` and `Map<K, V>`
//!
//! The reflective factory closes the chain, and the class-exclusion factory
//! opens it.

mod collections;
mod enums;
mod excluder;
mod json_value;
mod object;
mod primitives;
mod serde_bridge;

use std::sync::Arc;

use crate::adapter::AdapterFactory;

pub use collections::{ListFactory, MapFactory};
pub use enums::EnumFactory;
pub(crate) use excluder::ExcluderFactory;
pub use json_value::JsonValueFactory;
pub use object::ObjectFactory;
pub use primitives::PrimitiveFactory;
pub use serde_bridge::SerdeAdapter;

/// The built-in factories, in consultation order.
pub(crate) fn builtin() -> Vec<Arc<dyn AdapterFactory>> {
    vec![
        Arc::new(JsonValueFactory),
        Arc::new(ObjectFactory),
        Arc::new(PrimitiveFactory),
        Arc::new(EnumFactory),
        Arc::new(ListFactory),
        Arc::new(MapFactory),
    ]
}
