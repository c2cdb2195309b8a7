use std::any::Any;
use std::sync::Arc;

use crate::adapter::{AdapterFactory, NullSafe, TypeAdapter};
use crate::catalog::{AnyValue, DynList, DynMap};
use crate::error::{Error, Result};
use crate::registry::FactoryContext;
use crate::signature::{builtin, ClassRef, TypeSignature};
use crate::stream::{JsonReader, JsonWriter, TokenReader, TokenWriter, TreeReader};
use crate::value::JsonValue;

fn is_raw(signature: &TypeSignature, name: &str) -> bool {
    signature.raw_class().is_some_and(|class| class.name() == name)
}

/// The `i`-th type argument, or `Object` for a raw signature.
fn argument(signature: &TypeSignature, i: usize) -> TypeSignature {
    signature.args().get(i).cloned().unwrap_or_else(TypeSignature::object)
}

fn host_type_error(expected: &str) -> Error {
    Error::malformed(expected, "a value of another type", "$")
}

/// Handles `List<E>`, held as a [`DynList`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFactory;

impl AdapterFactory for ListFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        if !is_raw(signature, builtin::LIST) {
            return Ok(None);
        }
        let element = context.adapter(&argument(signature, 0))?;
        Ok(Some(NullSafe::wrap(Arc::new(ListAdapter { element }))))
    }
}

struct ListAdapter {
    element: Arc<dyn TypeAdapter>,
}

impl TypeAdapter for ListAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let list = value
            .and_then(|v| v.downcast_ref::<DynList>())
            .ok_or_else(|| host_type_error("a list"))?;
        out.begin_array()?;
        for item in list {
            self.element.write(out, item.as_deref())?;
        }
        out.end_array()
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        let mut list = DynList::new();
        reader.begin_array()?;
        while reader.has_next()? {
            list.push(self.element.read(reader)?);
        }
        reader.end_array()?;
        Ok(Some(Box::new(list)))
    }
}

/// Key classes converted through their adapter to and from member names.
const PRIMITIVE_KEYS: [&str; 12] = [
    builtin::BOOL,
    builtin::CHAR,
    builtin::I8,
    builtin::I16,
    builtin::I32,
    builtin::I64,
    builtin::U8,
    builtin::U16,
    builtin::U32,
    builtin::U64,
    builtin::F32,
    builtin::F64,
];

/// Handles `Map<K, V>`, held as a [`DynMap`].
///
/// Host maps are keyed by the key's JSON text. String and `Object` keys are
/// taken as-is. Primitive and enum keys go through the key adapter in both
/// directions, so `{"007": 1}` read as `Map<i32, V>` is keyed `"7"` and a
/// key that does not parse fails the read or write. Other key types fail
/// with [`Error::UnsupportedMapKey`].
///
/// A key repeated in the input keeps its first position and takes the last
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapFactory;

impl AdapterFactory for MapFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        if !is_raw(signature, builtin::MAP) {
            return Ok(None);
        }
        let key_signature = argument(signature, 0);
        let key_class = context.resolver().erasure(&key_signature);
        let keys = if key_class == ClassRef::new(builtin::STRING) || key_class.is_object() {
            None
        } else if PRIMITIVE_KEYS.contains(&key_class.name())
            || context.catalog().get(&key_class).is_some_and(|class| class.is_enum())
        {
            Some(context.adapter(&TypeSignature::Class(key_class))?)
        } else {
            return Err(Error::UnsupportedMapKey {
                type_name: signature.to_string(),
                key: key_signature.to_string(),
            });
        };
        let value = context.adapter(&argument(signature, 1))?;
        Ok(Some(NullSafe::wrap(Arc::new(MapAdapter { keys, value }))))
    }
}

struct MapAdapter {
    keys: Option<Arc<dyn TypeAdapter>>,
    value: Arc<dyn TypeAdapter>,
}

impl MapAdapter {
    /// Parses `key` with the key adapter and renders it back.
    fn normalize_key(&self, key: String) -> Result<String> {
        let Some(adapter) = &self.keys else {
            return Ok(key);
        };
        let mut reader = TreeReader::new(JsonValue::String(key.clone()));
        let parsed = adapter
            .read(&mut reader)?
            .ok_or_else(|| Error::malformed("a map key", format!("{key:?}"), "$"))?;
        let mut writer = JsonWriter::new();
        adapter.write(&mut writer, Some(&*parsed))?;
        let text = writer.finish()?;
        if text.starts_with('"') {
            JsonReader::new(&text).next_string()
        } else {
            Ok(text)
        }
    }
}

impl TypeAdapter for MapAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let map = value
            .and_then(|v| v.downcast_ref::<DynMap>())
            .ok_or_else(|| host_type_error("a map"))?;
        out.begin_object()?;
        for (key, item) in map {
            out.name(&self.normalize_key(key.clone())?)?;
            self.value.write(out, item.as_deref())?;
        }
        out.end_object()
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        let mut map = DynMap::new();
        reader.begin_object()?;
        while reader.has_next()? {
            let key = self.normalize_key(reader.next_name()?)?;
            let item = self.value.read(reader)?;
            map.insert(key, item);
        }
        reader.end_object()?;
        Ok(Some(Box::new(map)))
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{AnyValue, DynMap};
    use crate::{Binder, Error, TypeSignature};

    fn map_of(key: &str, value: TypeSignature) -> TypeSignature {
        TypeSignature::parameterized("Map", vec![TypeSignature::class(key), value])
    }

    #[test]
    fn test_integral_keys_are_normalized() {
        let binder = Binder::new();
        let sig = map_of("i32", TypeSignature::string());
        let map: DynMap = binder
            .from_json_as(r#"{"007":"bond","-2":"x"}"#, &sig)
            .unwrap()
            .unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["7", "-2"]);
        assert_eq!(binder.to_json(Some(&map), &sig).unwrap(), r#"{"7":"bond","-2":"x"}"#);

        let err = binder.from_json(r#"{"seven":"x"}"#, &sig).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. } | Error::NumericRange { .. }), "{err:?}");

        let mut bad = DynMap::new();
        bad.insert("1.5".to_string(), Some(Box::new("x".to_string()) as AnyValue));
        let err = binder.to_json(Some(&bad), &sig).unwrap_err();
        assert!(matches!(err, Error::NumericRange { .. }), "{err:?}");
    }

    #[test]
    fn test_bool_and_float_keys() {
        let binder = Binder::new();
        let flags = map_of("bool", TypeSignature::class("i64"));
        let map: DynMap = binder.from_json_as(r#"{"TRUE":1,"false":0}"#, &flags).unwrap().unwrap();
        assert!(map.contains_key("true"));
        assert!(map.contains_key("false"));

        let floats = map_of("f64", TypeSignature::class("i64"));
        let map: DynMap = binder.from_json_as(r#"{"1":1,"2.50":2}"#, &floats).unwrap().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["1.0", "2.5"]);
    }

    #[test]
    fn test_record_keys_are_unsupported() {
        let binder = Binder::new();
        let sig = TypeSignature::parameterized("Map", vec![TypeSignature::list_of(TypeSignature::string()), TypeSignature::string()]);
        let err = binder.adapter(&sig).err().unwrap();
        assert!(matches!(err, Error::UnsupportedMapKey { ref key, .. } if key == "List<String>"), "{err:?}");
        assert!(err.to_string().contains("map keys must be strings"));
    }
}
