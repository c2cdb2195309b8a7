//! The adapter registry.
//!
//! The registry owns an ordered chain of [`AdapterFactory`]s and answers
//! "which adapter handles this signature" by asking each factory in turn.
//! Answers, including failures, are cached per `(chain position, signature)`,
//! so every adapter is built at most once.
//!
//! Construction is serialized by one re-entrant lock. While the adapter for a
//! key is being built, a recursive request for the same key receives a
//! placeholder that forwards to the finished adapter once it exists. Adapters
//! built during one outermost construction are published to the cache
//! together, and only if that construction succeeds.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, trace, warn};

use crate::adapter::{
    AdapterFactory, AdapterKind, BindContext, FutureAdapter, TreeDeserializer, TreeSerializer, TypeAdapter,
};
use crate::catalog::{AnyValue, Constructor, TypeCatalog};
use crate::error::{Error, Result};
use crate::exclusion::ExclusionPolicy;
use crate::naming::FieldNamingStrategy;
use crate::options::BindOptions;
use crate::resolver::Resolver;
use crate::signature::{ClassRef, TypeSignature};
use crate::stream::{read_tree, write_tree, TokenReader, TokenWriter};

type Key = (usize, TypeSignature);

#[derive(Default)]
struct BuildState {
    depth: usize,
    in_flight: HashMap<Key, Arc<FutureAdapter>>,
    built: Vec<(Key, Arc<dyn TypeAdapter>)>,
}

/// Where a user registration applies.
#[derive(Debug, Clone)]
pub(crate) enum Scope {
    /// Exactly this signature.
    Exact(TypeSignature),
    /// This class and every subtype of it.
    Hierarchy(ClassRef),
    /// Whatever the factory accepts.
    Any,
}

#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub(crate) scope: Scope,
    pub(crate) kind: AdapterKind,
}

/// Everything the registry needs besides its factories.
pub(crate) struct Config {
    pub(crate) catalog: TypeCatalog,
    pub(crate) policy: ExclusionPolicy,
    pub(crate) naming: Arc<dyn FieldNamingStrategy>,
    pub(crate) options: BindOptions,
    pub(crate) instance_creators: IndexMap<ClassRef, Constructor>,
}

/// Resolves signatures to adapters through a chain of factories.
pub struct Registry {
    config: Config,
    factories: Vec<Arc<dyn AdapterFactory>>,
    cache: RwLock<HashMap<Key, Result<Arc<dyn TypeAdapter>>>>,
    building: ReentrantMutex<RefCell<BuildState>>,
    this: Weak<Registry>,
}

impl Registry {
    pub(crate) fn new(config: Config, factories: Vec<Arc<dyn AdapterFactory>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Registry {
            config,
            factories,
            cache: RwLock::new(HashMap::new()),
            building: ReentrantMutex::new(RefCell::new(BuildState::default())),
            this: this.clone(),
        })
    }

    /// The adapter for `signature`, built on first request.
    pub fn get(&self, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        self.get_from(0, signature)
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.config.catalog
    }

    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.config.catalog)
    }

    #[must_use]
    pub fn options(&self) -> &BindOptions {
        &self.config.options
    }

    /// Number of cached entries, failures included.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    pub(crate) fn handle(&self) -> Weak<Registry> {
        self.this.clone()
    }

    fn key(&self, start: usize, signature: &TypeSignature) -> Key {
        let resolver = self.resolver();
        (start, resolver.adapter_key(&resolver.canonicalize(signature)))
    }

    pub(crate) fn get_from(&self, start: usize, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        let key = self.key(start, signature);
        let hit = self.cache.read().get(&key).cloned();
        if let Some(hit) = hit {
            trace!(signature = %key.1, "adapter cache hit");
            return hit;
        }

        let guard = self.building.lock();
        let hit = self.cache.read().get(&key).cloned();
        if let Some(hit) = hit {
            return hit;
        }
        {
            let state = guard.borrow();
            if let Some((_, adapter)) = state.built.iter().find(|(k, _)| *k == key) {
                return Ok(adapter.clone());
            }
            if let Some(future) = state.in_flight.get(&key) {
                trace!(signature = %key.1, "handing out placeholder adapter");
                let placeholder: Arc<dyn TypeAdapter> = future.clone();
                return Ok(placeholder);
            }
        }

        let future = Arc::new(FutureAdapter::new(key.1.clone()));
        {
            let mut state = guard.borrow_mut();
            state.in_flight.insert(key.clone(), future.clone());
            state.depth += 1;
        }

        let result = self.construct(start, &key.1);

        let mut state = guard.borrow_mut();
        state.in_flight.remove(&key);
        state.depth -= 1;
        match &result {
            Ok(adapter) => {
                future.resolve(adapter);
                state.built.push((key.clone(), adapter.clone()));
            }
            Err(err) => {
                warn!(signature = %key.1, error = %err, "caching adapter construction failure");
                self.cache.write().insert(key.clone(), Err(err.clone()));
            }
        }
        if state.depth == 0 {
            let built = std::mem::take(&mut state.built);
            if result.is_ok() {
                let mut cache = self.cache.write();
                for (key, adapter) in built {
                    cache.entry(key).or_insert(Ok(adapter));
                }
            }
        }
        result
    }

    fn construct(&self, start: usize, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        for (position, factory) in self.factories.iter().enumerate().skip(start) {
            let context = FactoryContext {
                registry: self,
                position,
            };
            if let Some(adapter) = factory.create(signature, &context)? {
                debug!(%signature, position, "built adapter");
                return Ok(adapter);
            }
        }
        Err(Error::NoAdapter {
            type_name: signature.to_string(),
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("factories", &self.factories.len())
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}

/// What a factory sees while creating an adapter.
pub struct FactoryContext<'a> {
    registry: &'a Registry,
    position: usize,
}

impl<'a> FactoryContext<'a> {
    /// The adapter the whole chain produces for `signature`.
    pub fn adapter(&self, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        self.registry.get_from(0, signature)
    }

    /// The adapter the chain produces for `signature` when the asking
    /// factory and every factory before it are skipped.
    pub fn delegate(&self, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        self.registry.get_from(self.position + 1, signature)
    }

    #[must_use]
    pub fn catalog(&self) -> &'a TypeCatalog {
        &self.registry.config.catalog
    }

    #[must_use]
    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(&self.registry.config.catalog)
    }

    #[must_use]
    pub fn policy(&self) -> &'a ExclusionPolicy {
        &self.registry.config.policy
    }

    #[must_use]
    pub fn naming(&self) -> &'a dyn FieldNamingStrategy {
        self.registry.config.naming.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &'a BindOptions {
        &self.registry.config.options
    }

    /// The instance creator registered for `class`, if any.
    #[must_use]
    pub fn instance_creator(&self, class: &ClassRef) -> Option<&'a Constructor> {
        self.registry.config.instance_creators.get(class)
    }

    pub(crate) fn registry(&self) -> Weak<Registry> {
        self.registry.handle()
    }
}

enum WriteSlot {
    Streaming(Arc<dyn TypeAdapter>),
    Tree(Arc<dyn TreeSerializer>),
}

enum ReadSlot {
    Streaming(Arc<dyn TypeAdapter>),
    Tree(Arc<dyn TreeDeserializer>),
}

/// The user registrations, as one factory.
///
/// Registrations are scanned newest first, exact scopes before hierarchy
/// scopes, filling a write slot and a read slot independently. Whatever is
/// left empty is served by the delegate adapter.
pub(crate) struct UserAdapters {
    registrations: Vec<Registration>,
}

impl UserAdapters {
    pub(crate) fn new(registrations: Vec<Registration>) -> Self {
        UserAdapters { registrations }
    }

    fn matches(&self, scope: &Scope, exact_tier: bool, signature: &TypeSignature, context: &FactoryContext<'_>) -> bool {
        match scope {
            Scope::Exact(target) => exact_tier && target == signature,
            Scope::Any => exact_tier,
            Scope::Hierarchy(class) => {
                !exact_tier
                    && signature
                        .raw_class()
                        .is_some_and(|raw| context.catalog().is_assignable(raw, class))
            }
        }
    }
}

impl AdapterFactory for UserAdapters {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let mut writer: Option<WriteSlot> = None;
        let mut reader: Option<ReadSlot> = None;

        'tiers: for exact_tier in [true, false] {
            for registration in self.registrations.iter().rev() {
                if writer.is_some() && reader.is_some() {
                    break 'tiers;
                }
                if !self.matches(&registration.scope, exact_tier, signature, context) {
                    continue;
                }
                let both = match &registration.kind {
                    AdapterKind::Streaming(adapter) => Some(adapter.clone()),
                    AdapterKind::Factory(factory) => factory.create(signature, context)?,
                    AdapterKind::TreeSerializer(serializer) => {
                        writer.get_or_insert_with(|| WriteSlot::Tree(serializer.clone()));
                        None
                    }
                    AdapterKind::TreeDeserializer(deserializer) => {
                        reader.get_or_insert_with(|| ReadSlot::Tree(deserializer.clone()));
                        None
                    }
                };
                if let Some(adapter) = both {
                    writer.get_or_insert_with(|| WriteSlot::Streaming(adapter.clone()));
                    reader.get_or_insert_with(|| ReadSlot::Streaming(adapter));
                }
            }
        }

        match (writer, reader) {
            (None, None) => Ok(None),
            (Some(WriteSlot::Streaming(w)), Some(ReadSlot::Streaming(r))) if Arc::ptr_eq(&w, &r) => Ok(Some(w)),
            (writer, reader) => {
                let delegate = if writer.is_none() || reader.is_none() {
                    Some(context.delegate(signature)?)
                } else {
                    None
                };
                Ok(Some(Arc::new(CompositeAdapter {
                    signature: signature.clone(),
                    writer,
                    reader,
                    delegate,
                    registry: context.registry(),
                })))
            }
        }
    }
}

/// One effective adapter assembled from per-direction registrations.
struct CompositeAdapter {
    signature: TypeSignature,
    writer: Option<WriteSlot>,
    reader: Option<ReadSlot>,
    delegate: Option<Arc<dyn TypeAdapter>>,
    registry: Weak<Registry>,
}

impl CompositeAdapter {
    fn delegate(&self) -> Result<&Arc<dyn TypeAdapter>> {
        self.delegate.as_ref().ok_or_else(|| Error::NoAdapter {
            type_name: self.signature.to_string(),
        })
    }

    fn registry(&self) -> Result<Arc<Registry>> {
        self.registry
            .upgrade()
            .ok_or_else(|| Error::custom("the binder owning this adapter was dropped"))
    }
}

impl TypeAdapter for CompositeAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        match &self.writer {
            Some(WriteSlot::Streaming(adapter)) => adapter.write(out, value),
            Some(WriteSlot::Tree(serializer)) => match value {
                None => out.null_value(),
                Some(value) => {
                    let registry = self.registry()?;
                    let tree = serializer.serialize(value, &self.signature, &BindContext::new(&registry))?;
                    write_tree(out, &tree)
                }
            },
            None => self.delegate()?.write(out, value),
        }
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        match &self.reader {
            Some(ReadSlot::Streaming(adapter)) => adapter.read(reader),
            Some(ReadSlot::Tree(deserializer)) => {
                let tree = read_tree(reader)?;
                if tree.is_null() {
                    return Ok(None);
                }
                let registry = self.registry()?;
                deserializer.deserialize(&tree, &self.signature, &BindContext::new(&registry))
            }
            None => self.delegate()?.read(reader),
        }
    }
}
