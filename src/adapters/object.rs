use std::any::Any;
use std::sync::{Arc, Weak};

use crate::adapter::{AdapterFactory, TypeAdapter};
use crate::catalog::{AnyValue, DynList, DynMap};
use crate::error::{Error, Result};
use crate::registry::{FactoryContext, Registry};
use crate::signature::TypeSignature;
use crate::stream::{Token, TokenReader, TokenWriter};
use crate::value::Number;

/// Handles the untyped `Object` signature.
///
/// Reads build plain host values: arrays become [`DynList`], objects
/// [`DynMap`], integral numbers that fit become `i64` and other numbers
/// `f64`. Writes look up the adapter for the value's runtime class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectFactory;

impl AdapterFactory for ObjectFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        if !matches!(signature, TypeSignature::Class(class) if class.is_object()) {
            return Ok(None);
        }
        Ok(Some(Arc::new(ObjectAdapter {
            registry: context.registry(),
        })))
    }
}

struct ObjectAdapter {
    registry: Weak<Registry>,
}

impl TypeAdapter for ObjectAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            return out.null_value();
        };
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| Error::custom("the binder owning this adapter was dropped"))?;
        let class = registry
            .catalog()
            .class_of_value(value)
            .cloned()
            .ok_or_else(|| Error::NoAdapter {
                type_name: "a value whose Rust type is not in the catalog".to_string(),
            })?;
        registry.get(&TypeSignature::Class(class))?.write(out, Some(value))
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        read_untyped(reader)
    }
}

fn read_untyped(reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
    let value: AnyValue = match reader.peek()? {
        Token::BeginArray => {
            reader.begin_array()?;
            let mut list = DynList::new();
            while reader.has_next()? {
                list.push(read_untyped(reader)?);
            }
            reader.end_array()?;
            Box::new(list)
        }
        Token::BeginObject => {
            reader.begin_object()?;
            let mut map = DynMap::new();
            while reader.has_next()? {
                let name = reader.next_name()?;
                let value = read_untyped(reader)?;
                map.insert(name, value);
            }
            reader.end_object()?;
            Box::new(map)
        }
        Token::String => Box::new(reader.next_string()?),
        Token::Number => {
            let literal = reader.next_number()?;
            match Number::parse(&literal) {
                Some(Number::Integer(i)) => Box::new(i),
                Some(Number::Float(f)) => Box::new(f),
                None => return Err(Error::numeric_range(&literal, "Object")),
            }
        }
        Token::Bool => Box::new(reader.next_bool()?),
        Token::Null => {
            reader.next_null()?;
            return Ok(None);
        }
        token => return Err(reader.unexpected(&"a value", token)),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::JsonReader;

    #[test]
    fn test_read_untyped_document() {
        let mut reader = JsonReader::new(r#"{"a":5,"b":[1,2,null],"c":{"x":"y"},"d":9223372036854775807,"e":1.5}"#);
        let value = read_untyped(&mut reader).unwrap().unwrap();
        let map = value.downcast::<DynMap>().unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map.get("a").and_then(|v| v.as_ref()?.downcast_ref::<i64>()), Some(&5));
        assert_eq!(map.get("d").and_then(|v| v.as_ref()?.downcast_ref::<i64>()), Some(&i64::MAX));
        assert_eq!(map.get("e").and_then(|v| v.as_ref()?.downcast_ref::<f64>()), Some(&1.5));

        let list = map.get("b").and_then(|v| v.as_ref()?.downcast_ref::<DynList>()).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list[2].is_none());

        let nested = map.get("c").and_then(|v| v.as_ref()?.downcast_ref::<DynMap>()).unwrap();
        assert_eq!(nested.get("x").and_then(|v| v.as_ref()?.downcast_ref::<String>()).map(String::as_str), Some("y"));
    }

    #[test]
    fn test_read_untyped_rejects_stray_close() {
        let mut reader = JsonReader::new("[]");
        reader.begin_array().unwrap();
        assert!(matches!(read_untyped(&mut reader), Err(Error::Malformed { .. })));
    }
}
