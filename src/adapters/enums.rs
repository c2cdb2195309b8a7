use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{AdapterFactory, NullSafe, TypeAdapter};
use crate::catalog::{AnyValue, EnumConstant};
use crate::error::{Error, Result};
use crate::registry::FactoryContext;
use crate::signature::TypeSignature;
use crate::stream::{TokenReader, TokenWriter};

/// Handles classes declared with
/// [`ClassBuilder::enumeration`](crate::catalog::ClassBuilder::enumeration).
///
/// A constant is written as its serialized name, or its declared name when
/// it has none. Reads look the string up among serialized names and
/// alternates first, then among declared names. An unknown name reads as
/// null.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumFactory;

impl AdapterFactory for EnumFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let Some(descriptor) = signature
            .raw_class()
            .and_then(|raw| context.catalog().get(raw))
            .filter(|descriptor| descriptor.is_enum())
        else {
            return Ok(None);
        };

        let constants = descriptor.constants().to_vec();
        let mut by_name = HashMap::new();
        for (i, constant) in constants.iter().enumerate() {
            by_name.insert(constant.external_name().to_string(), i);
            if let Some(serialized) = constant.serialized_name() {
                for alternate in &serialized.alternates {
                    by_name.insert(alternate.clone(), i);
                }
            }
        }
        for (i, constant) in constants.iter().enumerate() {
            by_name.entry(constant.name().to_string()).or_insert(i);
        }

        Ok(Some(NullSafe::wrap(Arc::new(EnumAdapter {
            type_name: signature.to_string(),
            constants,
            by_name,
        }))))
    }
}

struct EnumAdapter {
    type_name: String,
    constants: Vec<EnumConstant>,
    by_name: HashMap<String, usize>,
}

impl TypeAdapter for EnumAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let Some(value) = value else {
            return out.null_value();
        };
        let constant = self
            .constants
            .iter()
            .find(|constant| constant.matches(value))
            .ok_or_else(|| Error::malformed(format!("a constant of {}", self.type_name), "another value", "$"))?;
        out.string_value(constant.external_name())
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        let name = reader.next_string()?;
        Ok(self.by_name.get(&name).map(|&i| self.constants[i].value()))
    }
}
