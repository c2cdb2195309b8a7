use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use crate::adapter::{AdapterFactory, TypeAdapter};
use crate::catalog::AnyValue;
use crate::error::{Error, Result};
use crate::registry::FactoryContext;
use crate::signature::TypeSignature;
use crate::stream::{TokenReader, TokenWriter};

/// Opens the factory chain and silences classes the exclusion policy
/// removes: excluded writes emit null, excluded reads skip the value and
/// yield null. A direction that is not excluded uses the delegate adapter.
pub(crate) struct ExcluderFactory;

impl AdapterFactory for ExcluderFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let policy = context.policy();
        if policy.never_excludes_classes() {
            return Ok(None);
        }
        let Some(descriptor) = signature.raw_class().and_then(|raw| context.catalog().get(raw)) else {
            return Ok(None);
        };
        let skip_write = policy.excludes_class(descriptor, false);
        let skip_read = policy.excludes_class(descriptor, true);
        if !skip_write && !skip_read {
            return Ok(None);
        }
        trace!(%signature, skip_write, skip_read, "class excluded");
        let delegate = if skip_write && skip_read {
            None
        } else {
            Some(context.delegate(signature))
        };
        Ok(Some(Arc::new(ExcludedAdapter {
            skip_write,
            skip_read,
            delegate,
        })))
    }
}

struct ExcludedAdapter {
    skip_write: bool,
    skip_read: bool,
    delegate: Option<Result<Arc<dyn TypeAdapter>>>,
}

impl ExcludedAdapter {
    fn delegate(&self) -> Result<&Arc<dyn TypeAdapter>> {
        match &self.delegate {
            Some(Ok(adapter)) => Ok(adapter),
            Some(Err(err)) => Err(err.clone()),
            None => Err(Error::custom("excluded class has no delegate")),
        }
    }
}

impl TypeAdapter for ExcludedAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        if self.skip_write {
            return out.null_value();
        }
        self.delegate()?.write(out, value)
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        if self.skip_read {
            reader.skip_value()?;
            return Ok(None);
        }
        self.delegate()?.read(reader)
    }
}
