//! The binding facade.
//!
//! A [`Binder`] is assembled once by a [`BinderBuilder`] and then shared:
//! cloning is cheap and every clone sees the same adapter cache.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{Binder, DynList, TypeSignature};
//!
//! let binder = Binder::new();
//! let numbers = TypeSignature::list_of(TypeSignature::class("i32"));
//!
//! let list: Option<DynList> = binder.from_json_as("[1, null, 3]", &numbers).unwrap();
//! let list = list.unwrap();
//! assert_eq!(list.len(), 3);
//! assert!(list[1].is_none());
//!
//! let json = binder.to_json(Some(&list), &numbers).unwrap();
//! assert_eq!(json, "[1,null,3]");
//! ```

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::adapter::{AdapterFactory, AdapterKind, TypeAdapter};
use crate::adapters::{self, ExcluderFactory, SerdeAdapter};
use crate::catalog::{unbox, AnyValue, ClassDescriptor, Constructor, Modifiers, TypeCatalog};
use crate::error::{Error, Result};
use crate::exclusion::{Direction, ExclusionPolicy, ExclusionStrategy};
use crate::naming::{FieldNamingPolicy, FieldNamingStrategy};
use crate::options::{BindOptions, NON_EXECUTABLE_PREFIX};
use crate::reflective::ReflectiveFactory;
use crate::registry::{Config, Registration, Registry, Scope, UserAdapters};
use crate::resolver::Resolver;
use crate::signature::{ClassRef, TypeSignature};
use crate::stream::{JsonDocuments, JsonReader, JsonWriter, TokenReader, TokenWriter, TreeReader, TreeWriter};
use crate::value::JsonValue;

/// Chain position of the first built-in factory, after the class excluder
/// and the user registrations.
const BUILTIN_START: usize = 2;

/// Converts host values to and from JSON through the adapter registry.
#[derive(Clone)]
pub struct Binder {
    registry: Arc<Registry>,
}

impl Binder {
    /// A binder with default options and only the builtin classes.
    #[must_use]
    pub fn new() -> Self {
        BinderBuilder::new().build()
    }

    pub fn builder() -> BinderBuilder {
        BinderBuilder::new()
    }

    #[must_use]
    pub fn options(&self) -> &BindOptions {
        self.registry.options()
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        self.registry.catalog()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The adapter for `signature`.
    ///
    /// # Errors
    ///
    /// Returns the (cached) construction error if no adapter can be built.
    pub fn adapter(&self, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        self.registry.get(signature)
    }

    /// The adapter the built-in factories produce for `signature`, ignoring
    /// every user registration.
    ///
    /// # Errors
    ///
    /// Returns the construction error if no built-in factory accepts it.
    pub fn delegate_adapter(&self, signature: &TypeSignature) -> Result<Arc<dyn TypeAdapter>> {
        self.registry.get_from(BUILTIN_START, signature)
    }

    /// A text writer configured with this binder's output options.
    #[must_use]
    pub fn new_json_writer(&self) -> JsonWriter {
        let options = self.options();
        let mut writer = match options.indent_string() {
            Some(indent) => JsonWriter::pretty(indent),
            None => JsonWriter::new(),
        };
        writer.set_lenient(options.lenient);
        writer.set_serialize_nulls(options.serialize_nulls);
        writer.set_html_safe(options.html_safe);
        writer
    }

    /// A text reader configured with this binder's input options.
    #[must_use]
    pub fn new_json_reader<'a>(&self, json: &'a str) -> JsonReader<'a> {
        let mut reader = JsonReader::new(json);
        reader.set_lenient(self.options().lenient_reads);
        reader.set_nesting_limit(self.options().nesting_limit);
        reader
    }

    /// Iterates over the whole documents in `json`, such as
    /// `{"a":1} {"a":2}` or newline-delimited JSON.
    #[must_use]
    pub fn documents<'a>(&self, json: &'a str) -> JsonDocuments<'a> {
        JsonDocuments::new(self.new_json_reader(json))
    }

    /// Serializes `value` as `signature`. `None` writes `null`.
    ///
    /// # Errors
    ///
    /// Fails if no adapter exists for `signature` or the adapter rejects the
    /// value.
    pub fn to_json(&self, value: Option<&dyn Any>, signature: &TypeSignature) -> Result<String> {
        let mut writer = self.new_json_writer();
        self.write(value, signature, &mut writer)?;
        self.finish_output(writer)
    }

    /// Like [`to_json`](Self::to_json), always pretty printed.
    ///
    /// # Errors
    ///
    /// Same as [`to_json`](Self::to_json).
    pub fn to_json_pretty(&self, value: Option<&dyn Any>, signature: &TypeSignature) -> Result<String> {
        let options = self.options();
        let mut writer = JsonWriter::pretty(" ".repeat(options.indent.max(1)));
        writer.set_lenient(options.lenient);
        writer.set_html_safe(options.html_safe);
        self.write(value, signature, &mut writer)?;
        self.finish_output(writer)
    }

    fn finish_output(&self, writer: JsonWriter) -> Result<String> {
        let json = writer.finish()?;
        if self.options().non_executable_prefix {
            Ok(format!("{NON_EXECUTABLE_PREFIX}{json}"))
        } else {
            Ok(json)
        }
    }

    /// Serializes `value` into an I/O sink.
    ///
    /// # Errors
    ///
    /// Fails like [`to_json`](Self::to_json), or with [`Error::Io`] if the
    /// sink fails.
    pub fn to_writer<W>(&self, mut out: W, value: Option<&dyn Any>, signature: &TypeSignature) -> Result<()>
    where
        W: io::Write,
    {
        let json = self.to_json(value, signature)?;
        out.write_all(json.as_bytes())
            .map_err(|e| Error::io(&e.to_string()))?;
        Ok(())
    }

    /// Writes `value` to any token sink. The sink is made lenient and
    /// follows this binder's null policy for the duration of the call.
    ///
    /// # Errors
    ///
    /// Fails if no adapter exists for `signature` or the adapter rejects the
    /// value.
    pub fn write(&self, value: Option<&dyn Any>, signature: &TypeSignature, out: &mut dyn TokenWriter) -> Result<()> {
        let adapter = self.adapter(signature)?;
        let lenient = out.is_lenient();
        let serialize_nulls = out.serialize_nulls();
        out.set_lenient(true);
        out.set_serialize_nulls(self.options().serialize_nulls);
        let result = adapter.write(out, value);
        out.set_lenient(lenient);
        out.set_serialize_nulls(serialize_nulls);
        result
    }

    /// Serializes `value` into a [`JsonValue`] tree.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub fn to_tree(&self, value: Option<&dyn Any>, signature: &TypeSignature) -> Result<JsonValue> {
        let mut writer = TreeWriter::new();
        self.write(value, signature, &mut writer)?;
        writer.finish()
    }

    /// Deserializes a whole document as `signature`. An empty document and
    /// `null` both read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for text that is not JSON or has trailing
    /// data, and the adapter's error for JSON of the wrong shape.
    pub fn from_json(&self, json: &str, signature: &TypeSignature) -> Result<Option<AnyValue>> {
        if json.trim().is_empty() {
            return Ok(None);
        }
        let mut reader = self.new_json_reader(json);
        let value = self.read(signature, &mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// [`from_json`](Self::from_json), downcast to `T`.
    ///
    /// # Errors
    ///
    /// In addition to the [`from_json`](Self::from_json) errors, returns
    /// [`Error::Malformed`] if the adapter produced something other than `T`.
    pub fn from_json_as<T: Any>(&self, json: &str, signature: &TypeSignature) -> Result<Option<T>> {
        self.from_json(json, signature)?.map(unbox::<T>).transpose()
    }

    /// Deserializes a whole document read from an I/O source.
    ///
    /// # Errors
    ///
    /// Fails like [`from_json`](Self::from_json), or with [`Error::Io`] if
    /// the source fails.
    pub fn from_reader<R>(&self, mut input: R, signature: &TypeSignature) -> Result<Option<AnyValue>>
    where
        R: io::Read,
    {
        let mut json = String::new();
        input
            .read_to_string(&mut json)
            .map_err(|e| Error::io(&e.to_string()))?;
        self.from_json(&json, signature)
    }

    /// Reads one value from any token source. The source is made lenient for
    /// the duration of the call when lenient reads are enabled.
    ///
    /// # Errors
    ///
    /// Fails if no adapter exists for `signature` or the input does not fit
    /// it.
    pub fn read(&self, signature: &TypeSignature, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        let adapter = self.adapter(signature)?;
        let lenient = reader.is_lenient();
        reader.set_lenient(lenient || self.options().lenient_reads);
        let result = adapter.read(reader);
        reader.set_lenient(lenient);
        result
    }

    /// Deserializes a [`JsonValue`] tree as `signature`.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn from_tree(&self, tree: JsonValue, signature: &TypeSignature) -> Result<Option<AnyValue>> {
        let mut reader = TreeReader::new(tree);
        self.read(signature, &mut reader)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("options", self.options())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Builder for [`Binder`].
///
/// # Examples
///
/// ```rust
/// use jsonbind::{AdapterKind, Binder, JsonValue, TypeSignature};
///
/// let binder = Binder::builder()
///     .register_adapter(
///         TypeSignature::class("bool"),
///         AdapterKind::serializer(|b: &bool, _sig, _cx| Ok(JsonValue::from(if *b { "yes" } else { "no" }))),
///     )
///     .serialize_nulls()
///     .build();
///
/// assert_eq!(binder.to_json(Some(&true), &TypeSignature::class("bool")).unwrap(), r#""yes""#);
/// let flag: Option<bool> = binder.from_json_as("false", &TypeSignature::class("bool")).unwrap();
/// assert_eq!(flag, Some(false));
/// ```
#[must_use]
pub struct BinderBuilder {
    catalog: TypeCatalog,
    policy: ExclusionPolicy,
    naming: Arc<dyn FieldNamingStrategy>,
    options: BindOptions,
    registrations: Vec<Registration>,
    instance_creators: IndexMap<ClassRef, Constructor>,
}

impl BinderBuilder {
    pub fn new() -> Self {
        BinderBuilder {
            catalog: TypeCatalog::new(),
            policy: ExclusionPolicy::new(),
            naming: Arc::new(FieldNamingPolicy::Identity),
            options: BindOptions::new(),
            registrations: Vec::new(),
            instance_creators: IndexMap::new(),
        }
    }

    /// Replaces the class catalog.
    pub fn catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn register_class(mut self, descriptor: ClassDescriptor) -> Self {
        self.catalog.register(descriptor);
        self
    }

    /// Registers an adapter for exactly `signature`. Later registrations win
    /// per direction.
    pub fn register_adapter(mut self, signature: TypeSignature, kind: AdapterKind) -> Self {
        self.registrations.push(Registration {
            scope: Scope::Exact(signature),
            kind,
        });
        self
    }

    /// Registers an adapter for `class` and all of its subtypes. Exact
    /// registrations always take precedence.
    pub fn register_hierarchy_adapter(mut self, class: impl Into<ClassRef>, kind: AdapterKind) -> Self {
        self.registrations.push(Registration {
            scope: Scope::Hierarchy(class.into()),
            kind,
        });
        self
    }

    /// Registers a factory consulted for every signature, ahead of the
    /// built-in factories.
    pub fn register_factory<F>(mut self, factory: F) -> Self
    where
        F: AdapterFactory + 'static,
    {
        self.registrations.push(Registration {
            scope: Scope::Any,
            kind: AdapterKind::Factory(Arc::new(factory)),
        });
        self
    }

    /// Supplies instances of `class` to the reflective adapter, in place of
    /// the descriptor's constructor.
    pub fn register_instance_creator<T: Any>(
        mut self,
        class: impl Into<ClassRef>,
        make: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let constructor: Constructor = Arc::new(move || Box::new(make()) as AnyValue);
        self.instance_creators.insert(class.into(), constructor);
        self
    }

    /// Binds `signature` through serde. The Rust type is added to the
    /// catalog when its class is not described yet, so untyped values of it
    /// are written too.
    pub fn register_serde<T>(mut self, signature: TypeSignature) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        if let TypeSignature::Class(class) = &signature {
            if !self.catalog.contains(class) {
                self.catalog
                    .register(ClassDescriptor::builder(class.clone()).rust_type::<T>().build());
            }
        }
        self.register_adapter(signature, AdapterKind::streaming(SerdeAdapter::<T>::new()).null_safe())
    }

    pub fn exclusion_policy(mut self, policy: ExclusionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Only binds classes and members valid in `version`.
    pub fn version(mut self, version: f64) -> Self {
        self.policy.set_version(version);
        self
    }

    /// Replaces the excluded modifier set, `TRANSIENT | STATIC` by default.
    pub fn exclude_fields_with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.policy.set_modifiers(modifiers);
        self
    }

    /// Only binds members carrying an expose marker.
    pub fn require_expose(mut self) -> Self {
        self.policy = self.policy.requiring_expose();
        self
    }

    pub fn disable_inner_class_serialization(mut self) -> Self {
        self.policy = self.policy.without_inner_classes();
        self
    }

    pub fn add_exclusion_strategy<S>(mut self, strategy: S, direction: Direction) -> Self
    where
        S: ExclusionStrategy + 'static,
    {
        self.policy = self.policy.with_strategy(Arc::new(strategy), direction);
        self
    }

    pub fn field_naming_policy(mut self, policy: FieldNamingPolicy) -> Self {
        self.naming = Arc::new(policy);
        self
    }

    pub fn field_naming_strategy<S>(mut self, strategy: S) -> Self
    where
        S: FieldNamingStrategy + 'static,
    {
        self.naming = Arc::new(strategy);
        self
    }

    /// Replaces all output and input options at once.
    pub fn options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    /// Writes null members instead of dropping them.
    pub fn serialize_nulls(mut self) -> Self {
        self.options.serialize_nulls = true;
        self
    }

    pub fn lenient(mut self) -> Self {
        self.options.lenient = true;
        self
    }

    pub fn pretty_printing(mut self) -> Self {
        self.options.pretty = true;
        self
    }

    /// Allows NaN and infinities in output.
    pub fn serialize_special_floating_point_values(mut self) -> Self {
        self.options.serialize_special_floats = true;
        self
    }

    /// Prefixes output with [`NON_EXECUTABLE_PREFIX`].
    pub fn generate_non_executable_json(mut self) -> Self {
        self.options.non_executable_prefix = true;
        self
    }

    /// Escapes HTML-sensitive characters in output strings.
    pub fn escape_html(mut self) -> Self {
        self.options.html_safe = true;
        self
    }

    /// Caps how deeply input arrays and objects may nest.
    pub fn nesting_limit(mut self, limit: usize) -> Self {
        self.options.nesting_limit = limit;
        self
    }

    /// Assembles the factory chain: class exclusion, user registrations,
    /// built-ins, then reflection.
    pub fn build(self) -> Binder {
        let resolver = Resolver::new(&self.catalog);
        let registrations: Vec<Registration> = self
            .registrations
            .into_iter()
            .map(|registration| match registration.scope {
                Scope::Exact(signature) => Registration {
                    scope: Scope::Exact(resolver.adapter_key(&resolver.canonicalize(&signature))),
                    kind: registration.kind,
                },
                _ => registration,
            })
            .collect();

        let mut factories: Vec<Arc<dyn AdapterFactory>> =
            vec![Arc::new(ExcluderFactory), Arc::new(UserAdapters::new(registrations))];
        factories.extend(adapters::builtin());
        factories.push(Arc::new(ReflectiveFactory));
        debug!(
            classes = self.catalog.len(),
            factories = factories.len(),
            instance_creators = self.instance_creators.len(),
            "building binder"
        );

        let config = Config {
            catalog: self.catalog,
            policy: self.policy,
            naming: self.naming,
            options: self.options,
            instance_creators: self.instance_creators,
        };
        Binder {
            registry: Registry::new(config, factories),
        }
    }
}

impl Default for BinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
