use std::any::Any;
use std::sync::Arc;

use crate::adapter::{AdapterFactory, TypeAdapter};
use crate::catalog::AnyValue;
use crate::error::{Error, Result};
use crate::registry::FactoryContext;
use crate::signature::{builtin, TypeSignature};
use crate::stream::{read_tree, write_tree, TokenReader, TokenWriter};
use crate::value::JsonValue;

/// Passes [`JsonValue`] trees through unchanged.
///
/// A JSON `null` reads as `Some(JsonValue::Null)` rather than `None`, so a
/// tree member never loses its explicit null.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValueFactory;

impl AdapterFactory for JsonValueFactory {
    fn create(&self, signature: &TypeSignature, _context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let is_tree = signature
            .raw_class()
            .is_some_and(|class| class.name() == builtin::JSON_VALUE);
        Ok(is_tree.then(|| Arc::new(JsonValueAdapter) as Arc<dyn TypeAdapter>))
    }
}

struct JsonValueAdapter;

impl TypeAdapter for JsonValueAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            return out.null_value();
        };
        let tree = value
            .downcast_ref::<JsonValue>()
            .ok_or_else(|| Error::malformed("a JsonValue", "a value of another type", "$"))?;
        write_tree(out, tree)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        Ok(Some(Box::new(read_tree(reader)?)))
    }
}
