use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapter::TypedAdapter;
use crate::de::from_value;
use crate::error::Result;
use crate::ser::to_value;
use crate::stream::{read_tree, write_tree, TokenReader, TokenWriter};

/// Binds any serde type by routing it through a [`JsonValue`](crate::JsonValue)
/// tree.
///
/// # Examples
///
/// ```rust
/// use jsonbind::adapters::SerdeAdapter;
/// use jsonbind::{AdapterKind, Binder, TypeSignature};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let point = TypeSignature::class("Point");
/// let binder = Binder::builder()
///     .register_adapter(point.clone(), AdapterKind::streaming(SerdeAdapter::<Point>::new()).null_safe())
///     .build();
///
/// let json = binder.to_json(Some(&Point { x: 1, y: 2 }), &point).unwrap();
/// assert_eq!(json, r#"{"x":1,"y":2}"#);
/// let back: Option<Point> = binder.from_json_as(&json, &point).unwrap();
/// assert_eq!(back, Some(Point { x: 1, y: 2 }));
/// ```
pub struct SerdeAdapter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> SerdeAdapter<T> {
    #[must_use]
    pub fn new() -> Self {
        SerdeAdapter { marker: PhantomData }
    }
}

impl<T> Default for SerdeAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypedAdapter<T> for SerdeAdapter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn write(&self, out: &mut dyn TokenWriter, value: &T) -> Result<()> {
        write_tree(out, &to_value(value)?)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<T> {
        from_value(read_tree(reader)?)
    }
}
