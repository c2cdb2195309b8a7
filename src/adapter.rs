//! The adapter model.
//!
//! A [`TypeAdapter`] converts host values of one type signature to and from
//! a token stream. Adapters are erased: values travel as `&dyn Any` and
//! [`AnyValue`], with `None` standing for null. Typed code implements
//! [`TypedAdapter`] and is bridged with [`typed`], or supplies tree-level
//! [`TreeSerializer`] / [`TreeDeserializer`] callbacks.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::adapter::{typed, TypedAdapter};
//! use jsonbind::stream::{TokenReader, TokenWriter};
//! use jsonbind::Result;
//!
//! struct Celsius(f64);
//!
//! struct CelsiusAdapter;
//!
//! impl TypedAdapter<Celsius> for CelsiusAdapter {
//!     fn write(&self, out: &mut dyn TokenWriter, value: &Celsius) -> Result<()> {
//!         out.string_value(&format!("{}C", value.0))
//!     }
//!
//!     fn read(&self, reader: &mut dyn TokenReader) -> Result<Celsius> {
//!         let text = reader.next_string()?;
//!         let degrees = text.trim_end_matches('C').parse().map_err(jsonbind::Error::custom)?;
//!         Ok(Celsius(degrees))
//!     }
//! }
//!
//! let adapter = typed(CelsiusAdapter);
//! let tree = adapter.to_tree(Some(&Celsius(21.5))).unwrap();
//! assert_eq!(tree.as_str(), Some("21.5C"));
//! ```

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, Weak};

use crate::catalog::AnyValue;
use crate::error::{Error, Result};
use crate::registry::{FactoryContext, Registry};
use crate::signature::TypeSignature;
use crate::stream::{Token, TokenReader, TokenWriter, TreeReader, TreeWriter};
use crate::value::JsonValue;

/// Converts values of one type signature to and from tokens.
pub trait TypeAdapter: Send + Sync {
    /// Writes `value`, where `None` is null.
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()>;

    /// Reads one value, where `None` is null.
    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>>;

    /// Returns `true` for adapters that bind members by introspection.
    fn is_reflective(&self) -> bool {
        false
    }
}

impl dyn TypeAdapter {
    /// Writes `value` into a fresh [`JsonValue`] tree.
    pub fn to_tree(&self, value: Option<&dyn Any>) -> Result<JsonValue> {
        let mut writer = TreeWriter::new();
        self.write(&mut writer, value)?;
        writer.finish()
    }

    /// Reads a value back out of a [`JsonValue`] tree.
    pub fn from_tree(&self, tree: JsonValue) -> Result<Option<AnyValue>> {
        let mut reader = TreeReader::new(tree);
        self.read(&mut reader)
    }
}

/// A statically typed streaming adapter, erased with [`typed`].
pub trait TypedAdapter<T: Any>: Send + Sync + 'static {
    fn write(&self, out: &mut dyn TokenWriter, value: &T) -> Result<()>;
    fn read(&self, reader: &mut dyn TokenReader) -> Result<T>;
}

struct Typed<T, A> {
    adapter: A,
    marker: PhantomData<fn() -> T>,
}

impl<T: Any, A: TypedAdapter<T>> TypeAdapter for Typed<T, A> {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        match value {
            Some(value) => match value.downcast_ref::<T>() {
                Some(value) => self.adapter.write(out, value),
                None => Err(Error::malformed(type_name::<T>(), "a value of another type", "$")),
            },
            None => Err(Error::custom(format!(
                "adapter for {} is not null-safe; register it with null_safe()",
                type_name::<T>()
            ))),
        }
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        self.adapter
            .read(reader)
            .map(|value| Some(Box::new(value) as AnyValue))
    }
}

/// Erases a typed adapter.
pub fn typed<T: Any, A: TypedAdapter<T>>(adapter: A) -> Arc<dyn TypeAdapter> {
    Arc::new(Typed {
        adapter,
        marker: PhantomData,
    })
}

struct FnAdapter<W, R> {
    write: W,
    read: R,
}

impl<T, W, R> TypedAdapter<T> for FnAdapter<W, R>
where
    T: Any,
    W: Fn(&mut dyn TokenWriter, &T) -> Result<()> + Send + Sync + 'static,
    R: Fn(&mut dyn TokenReader) -> Result<T> + Send + Sync + 'static,
{
    fn write(&self, out: &mut dyn TokenWriter, value: &T) -> Result<()> {
        (self.write)(out, value)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<T> {
        (self.read)(reader)
    }
}

/// Builds an erased adapter from a pair of closures.
pub fn adapter_fn<T, W, R>(write: W, read: R) -> Arc<dyn TypeAdapter>
where
    T: Any,
    W: Fn(&mut dyn TokenWriter, &T) -> Result<()> + Send + Sync + 'static,
    R: Fn(&mut dyn TokenReader) -> Result<T> + Send + Sync + 'static,
{
    typed::<T, _>(FnAdapter { write, read })
}

/// Writes null for `None` and reads null as `None`, delegating everything
/// else.
pub struct NullSafe(Arc<dyn TypeAdapter>);

impl NullSafe {
    pub fn wrap(adapter: Arc<dyn TypeAdapter>) -> Arc<dyn TypeAdapter> {
        Arc::new(NullSafe(adapter))
    }
}

impl TypeAdapter for NullSafe {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        match value {
            None => out.null_value(),
            Some(_) => self.0.write(out, value),
        }
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            return Ok(None);
        }
        self.0.read(reader)
    }

    fn is_reflective(&self) -> bool {
        self.0.is_reflective()
    }
}

/// Nested conversions available to tree callbacks.
pub struct BindContext<'a> {
    registry: &'a Registry,
}

impl<'a> BindContext<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        BindContext { registry }
    }

    /// Converts `value` to a tree with the adapter for `signature`.
    pub fn serialize(&self, value: Option<&dyn Any>, signature: &TypeSignature) -> Result<JsonValue> {
        self.registry.get(signature)?.to_tree(value)
    }

    /// Converts `tree` to a host value with the adapter for `signature`.
    pub fn deserialize(&self, tree: JsonValue, signature: &TypeSignature) -> Result<Option<AnyValue>> {
        self.registry.get(signature)?.from_tree(tree)
    }
}

/// Converts a non-null host value to a tree.
pub trait TreeSerializer: Send + Sync {
    fn serialize(&self, value: &dyn Any, signature: &TypeSignature, context: &BindContext<'_>) -> Result<JsonValue>;
}

/// Converts a non-null tree to a host value.
pub trait TreeDeserializer: Send + Sync {
    fn deserialize(
        &self,
        tree: &JsonValue,
        signature: &TypeSignature,
        context: &BindContext<'_>,
    ) -> Result<Option<AnyValue>>;
}

struct SerializerFn<T, F> {
    f: F,
    marker: PhantomData<fn(&T)>,
}

impl<T, F> TreeSerializer for SerializerFn<T, F>
where
    T: Any,
    F: Fn(&T, &TypeSignature, &BindContext<'_>) -> Result<JsonValue> + Send + Sync,
{
    fn serialize(&self, value: &dyn Any, signature: &TypeSignature, context: &BindContext<'_>) -> Result<JsonValue> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| Error::malformed(type_name::<T>(), "a value of another type", "$"))?;
        (self.f)(value, signature, context)
    }
}

struct DeserializerFn<T, F> {
    f: F,
    marker: PhantomData<fn() -> T>,
}

impl<T, F> TreeDeserializer for DeserializerFn<T, F>
where
    T: Any,
    F: Fn(&JsonValue, &TypeSignature, &BindContext<'_>) -> Result<T> + Send + Sync,
{
    fn deserialize(
        &self,
        tree: &JsonValue,
        signature: &TypeSignature,
        context: &BindContext<'_>,
    ) -> Result<Option<AnyValue>> {
        (self.f)(tree, signature, context).map(|value| Some(Box::new(value) as AnyValue))
    }
}

/// Creates adapters for the signatures it recognizes.
pub trait AdapterFactory: Send + Sync {
    /// Returns `Ok(None)` to decline `signature`.
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>>;
}

impl<F> AdapterFactory for F
where
    F: Fn(&TypeSignature, &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> + Send + Sync,
{
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        self(signature, context)
    }
}

/// One user registration.
#[derive(Clone)]
pub enum AdapterKind {
    /// Serves both directions.
    Streaming(Arc<dyn TypeAdapter>),
    /// Serves writes only.
    TreeSerializer(Arc<dyn TreeSerializer>),
    /// Serves reads only.
    TreeDeserializer(Arc<dyn TreeDeserializer>),
    /// Serves both directions for whatever it accepts.
    Factory(Arc<dyn AdapterFactory>),
}

impl AdapterKind {
    /// A streaming registration from a typed adapter.
    pub fn streaming<T: Any, A: TypedAdapter<T>>(adapter: A) -> Self {
        AdapterKind::Streaming(typed(adapter))
    }

    /// A write-only registration from a closure.
    pub fn serializer<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&T, &TypeSignature, &BindContext<'_>) -> Result<JsonValue> + Send + Sync + 'static,
    {
        AdapterKind::TreeSerializer(Arc::new(SerializerFn {
            f,
            marker: PhantomData,
        }))
    }

    /// A read-only registration from a closure.
    pub fn deserializer<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&JsonValue, &TypeSignature, &BindContext<'_>) -> Result<T> + Send + Sync + 'static,
    {
        AdapterKind::TreeDeserializer(Arc::new(DeserializerFn {
            f,
            marker: PhantomData,
        }))
    }

    /// Wraps a streaming registration in [`NullSafe`]. Tree callbacks never
    /// see null, so the other kinds are returned unchanged.
    #[must_use]
    pub fn null_safe(self) -> Self {
        match self {
            AdapterKind::Streaming(adapter) => AdapterKind::Streaming(NullSafe::wrap(adapter)),
            other => other,
        }
    }
}

impl fmt::Debug for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdapterKind::Streaming(_) => "Streaming",
            AdapterKind::TreeSerializer(_) => "TreeSerializer",
            AdapterKind::TreeDeserializer(_) => "TreeDeserializer",
            AdapterKind::Factory(_) => "Factory",
        })
    }
}

/// Placeholder handed out while the adapter for `signature` is being built.
pub(crate) struct FutureAdapter {
    signature: TypeSignature,
    target: OnceLock<Weak<dyn TypeAdapter>>,
}

impl FutureAdapter {
    pub(crate) fn new(signature: TypeSignature) -> Self {
        FutureAdapter {
            signature,
            target: OnceLock::new(),
        }
    }

    pub(crate) fn resolve(&self, adapter: &Arc<dyn TypeAdapter>) {
        let _ = self.target.set(Arc::downgrade(adapter));
    }

    fn target(&self) -> Result<Arc<dyn TypeAdapter>> {
        self.target
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::IncompleteAdapter {
                type_name: self.signature.to_string(),
            })
    }
}

impl TypeAdapter for FutureAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        self.target()?.write(out, value)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        self.target()?.read(reader)
    }

    fn is_reflective(&self) -> bool {
        self.target().is_ok_and(|target| target.is_reflective())
    }
}

/// Writes `value` with `adapter` into a tree and reads it back. Fails if the
/// read leaves part of the tree unconsumed.
#[doc(hidden)]
pub fn round_trip(adapter: &dyn TypeAdapter, value: Option<&dyn Any>) -> Result<Option<AnyValue>> {
    let mut writer = TreeWriter::new();
    adapter.write(&mut writer, value)?;
    let tree = writer.finish()?;
    let mut reader = TreeReader::new(tree);
    let value = adapter.read(&mut reader)?;
    if reader.peek()? != Token::EndDocument {
        return Err(Error::custom("adapter did not consume its whole value"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{JsonReader, JsonWriter};

    fn upper() -> Arc<dyn TypeAdapter> {
        adapter_fn(
            |out: &mut dyn TokenWriter, s: &String| out.string_value(&s.to_uppercase()),
            |reader: &mut dyn TokenReader| reader.next_string().map(|s| s.to_lowercase()),
        )
    }

    #[test]
    fn test_typed_bridge() {
        let adapter = upper();
        let tree = adapter.to_tree(Some(&"abc".to_string())).unwrap();
        assert_eq!(tree, JsonValue::from("ABC"));
        let back = adapter.from_tree(tree).unwrap().unwrap();
        assert_eq!(*back.downcast::<String>().unwrap(), "abc");
    }

    #[test]
    fn test_typed_bridge_rejects_null_and_wrong_type() {
        let adapter = upper();
        assert!(adapter.to_tree(None).is_err());
        assert!(matches!(adapter.to_tree(Some(&5i32)), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_null_safe() {
        let adapter = NullSafe::wrap(upper());
        let mut writer = JsonWriter::new();
        adapter.write(&mut writer, None).unwrap();
        assert_eq!(writer.finish().unwrap(), "null");

        let mut reader = JsonReader::new("null");
        assert!(adapter.read(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_unresolved_future_fails() {
        let future = Arc::new(FutureAdapter::new(TypeSignature::class("Node")));
        let erased: Arc<dyn TypeAdapter> = future.clone();
        let err = erased.to_tree(Some(&1i32)).unwrap_err();
        assert!(matches!(err, Error::IncompleteAdapter { ref type_name } if type_name == "Node"));

        let real = upper();
        future.resolve(&real);
        let tree = erased.to_tree(Some(&"x".to_string())).unwrap();
        assert_eq!(tree, JsonValue::from("X"));
    }

    #[test]
    fn test_round_trip_helper() {
        let adapter = upper();
        let back = round_trip(adapter.as_ref(), Some(&"q".to_string())).unwrap().unwrap();
        assert_eq!(*back.downcast::<String>().unwrap(), "q");
    }
}
