//! Runtime class descriptors.
//!
//! Rust has no runtime reflection, so every record-like type taking part in
//! reflective binding is described once by a [`ClassDescriptor`]: its type
//! parameters, supertypes, members with their accessors, markers and an
//! optional constructor. Descriptors live in a [`TypeCatalog`], an arena keyed
//! by class name, which the resolver and the reflective adapter factory query.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{ClassDescriptor, TypeCatalog, TypeSignature};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register(
//!     ClassDescriptor::builder("Point")
//!         .constructor(Point::default)
//!         .field("x", TypeSignature::class("i32"), |p: &Point| &p.x, |p: &mut Point, v| p.x = v)
//!         .field("y", TypeSignature::class("i32"), |p: &Point| &p.y, |p: &mut Point, v| p.y = v)
//!         .build(),
//! );
//!
//! let point = catalog.get_named("Point").unwrap();
//! assert_eq!(point.members().len(), 2);
//! assert_eq!(catalog.class_of_value(&Point::default()).map(|c| c.name()), Some("Point"));
//! ```

use std::any::{type_name, Any, TypeId};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::map::OrderedMap;
use crate::signature::{builtin, ClassRef, TypeSignature};
use crate::value::JsonValue;

/// A host value of any described type.
pub type AnyValue = Box<dyn Any>;

/// The host representation of `List<E>`.
pub type DynList = Vec<Option<AnyValue>>;

/// The host representation of `Map<String, V>`.
pub type DynMap = OrderedMap<String, Option<AnyValue>>;

pub type Constructor = Arc<dyn Fn() -> AnyValue + Send + Sync>;
pub type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut dyn Any, Option<AnyValue>) -> Result<()> + Send + Sync>;

fn getter<G>(get: G) -> Getter
where
    G: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(get)
}

fn setter<S>(set: S) -> Setter
where
    S: Fn(&mut dyn Any, Option<AnyValue>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(set)
}

fn host_mut<T: Any>(host: &mut dyn Any) -> Result<&mut T> {
    host.downcast_mut::<T>()
        .ok_or_else(|| Error::custom(format!("member host is not a {}", type_name::<T>())))
}

/// Unboxes a host value produced by an adapter.
pub(crate) fn unbox<F: Any>(value: AnyValue) -> Result<F> {
    value
        .downcast::<F>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::malformed(type_name::<F>(), "a value of another type", "$"))
}

/// Member modifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const VOLATILE: Modifiers = Modifiers(0x0040);
    pub const TRANSIENT: Modifiers = Modifiers(0x0080);
    pub const SYNTHETIC: Modifiers = Modifiers(0x1000);

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if any flag is set in both.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// Explicit opt-in marker, scoped per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expose {
    pub serialize: bool,
    pub deserialize: bool,
}

impl Default for Expose {
    fn default() -> Self {
        Expose {
            serialize: true,
            deserialize: true,
        }
    }
}

/// `since` / `until` version markers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VersionRange {
    pub since: Option<f64>,
    pub until: Option<f64>,
}

impl VersionRange {
    /// A member introduced in `since` is valid from that version on; one
    /// removed in `until` is valid strictly before it.
    #[must_use]
    pub fn is_valid(&self, version: f64) -> bool {
        self.since.map_or(true, |since| since <= version)
            && self.until.map_or(true, |until| until > version)
    }
}

/// External rename for a member, with alternate names accepted on input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedName {
    pub value: String,
    pub alternates: Vec<String>,
}

/// Immutable snapshot of one member, as seen by exclusion strategies and
/// naming policies.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub declaring: TypeSignature,
    pub name: String,
    pub declared: TypeSignature,
    pub modifiers: Modifiers,
    pub expose: Option<Expose>,
    pub serialized_name: Option<SerializedName>,
    pub version: VersionRange,
}

impl MemberDescriptor {
    #[must_use]
    pub fn has_modifier(&self, modifiers: Modifiers) -> bool {
        self.modifiers.intersects(modifiers)
    }
}

/// A member declaration together with its erased accessors.
#[derive(Clone)]
pub struct MemberDecl {
    name: String,
    declared: TypeSignature,
    modifiers: Modifiers,
    expose: Option<Expose>,
    serialized_name: Option<SerializedName>,
    version: VersionRange,
    getter: Getter,
    setter: Setter,
}

impl MemberDecl {
    /// A non-null member of host type `T` holding an `F`.
    ///
    /// Reading an explicit `null` into such a member leaves it untouched.
    pub fn field<T: Any, F: Any>(
        name: impl Into<String>,
        declared: TypeSignature,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        MemberDecl::erased(
            name,
            declared,
            getter(move |host: &dyn Any| host.downcast_ref::<T>().map(|h| get(h) as &dyn Any)),
            setter(move |host: &mut dyn Any, value: Option<AnyValue>| {
                let host = host_mut::<T>(host)?;
                if let Some(value) = value {
                    set(host, unbox::<F>(value)?);
                }
                Ok(())
            }),
        )
    }

    /// A nullable member of host type `T` holding an `Option<F>`.
    pub fn optional<T: Any, F: Any>(
        name: impl Into<String>,
        declared: TypeSignature,
        get: impl Fn(&T) -> Option<&F> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<F>) + Send + Sync + 'static,
    ) -> Self {
        MemberDecl::erased(
            name,
            declared,
            getter(move |host: &dyn Any| {
                host.downcast_ref::<T>()
                    .and_then(|h| get(h))
                    .map(|v| v as &dyn Any)
            }),
            setter(move |host: &mut dyn Any, value: Option<AnyValue>| {
                let host = host_mut::<T>(host)?;
                let value = value.map(unbox::<F>).transpose()?;
                set(host, value);
                Ok(())
            }),
        )
    }

    /// A member of host type `T` holding a value of any type, typically a
    /// `Box<dyn Any>` declared as `Object` or as a supertype.
    pub fn untyped<T: Any>(
        name: impl Into<String>,
        declared: TypeSignature,
        get: impl Fn(&T) -> Option<&dyn Any> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<AnyValue>) + Send + Sync + 'static,
    ) -> Self {
        MemberDecl::erased(
            name,
            declared,
            getter(move |host: &dyn Any| host.downcast_ref::<T>().and_then(|h| get(h))),
            setter(move |host: &mut dyn Any, value: Option<AnyValue>| {
                set(host_mut::<T>(host)?, value);
                Ok(())
            }),
        )
    }

    /// A member with caller-supplied erased accessors.
    pub fn erased(name: impl Into<String>, declared: TypeSignature, get: Getter, set: Setter) -> Self {
        MemberDecl {
            name: name.into(),
            declared,
            modifiers: Modifiers::NONE,
            expose: None,
            serialized_name: None,
            version: VersionRange::default(),
            getter: get,
            setter: set,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn with_expose(mut self, serialize: bool, deserialize: bool) -> Self {
        self.expose = Some(Expose {
            serialize,
            deserialize,
        });
        self
    }

    #[must_use]
    pub fn with_serialized_name(mut self, name: impl Into<String>) -> Self {
        let alternates = self
            .serialized_name
            .take()
            .map(|n| n.alternates)
            .unwrap_or_default();
        self.serialized_name = Some(SerializedName {
            value: name.into(),
            alternates,
        });
        self
    }

    /// Adds an input-only alternate name. Requires a serialized name.
    #[must_use]
    pub fn with_alternate(mut self, name: impl Into<String>) -> Self {
        let serialized = self.serialized_name.get_or_insert_with(|| SerializedName {
            value: self.name.clone(),
            alternates: Vec::new(),
        });
        serialized.alternates.push(name.into());
        self
    }

    #[must_use]
    pub fn since(mut self, version: f64) -> Self {
        self.version.since = Some(version);
        self
    }

    #[must_use]
    pub fn until(mut self, version: f64) -> Self {
        self.version.until = Some(version);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declared(&self) -> &TypeSignature {
        &self.declared
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Reads the member from `host`. `None` stands for null.
    #[inline]
    pub fn get<'a>(&self, host: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.getter)(host)
    }

    /// Writes `value` into the member of `host`.
    #[inline]
    pub fn set(&self, host: &mut dyn Any, value: Option<AnyValue>) -> Result<()> {
        (self.setter)(host, value)
    }

    /// Snapshots this member as declared by `declaring`.
    #[must_use]
    pub fn descriptor(&self, declaring: &TypeSignature) -> MemberDescriptor {
        MemberDescriptor {
            declaring: declaring.clone(),
            name: self.name.clone(),
            declared: self.declared.clone(),
            modifiers: self.modifiers,
            expose: self.expose,
            serialized_name: self.serialized_name.clone(),
            version: self.version,
        }
    }
}

impl fmt::Debug for MemberDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDecl")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
    /// A closed set of named constants.
    Enum,
}

pub type ConstantMatcher = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// One constant of an enum class.
///
/// The constant is written as its serialized name, or its declared name
/// when it has none. Reads accept either, plus any alternates.
#[derive(Clone)]
pub struct EnumConstant {
    name: String,
    serialized_name: Option<SerializedName>,
    make: Constructor,
    matches: ConstantMatcher,
}

impl EnumConstant {
    pub fn new<T>(name: impl Into<String>, value: T) -> Self
    where
        T: Any + Clone + PartialEq + Send + Sync,
    {
        let prototype = value.clone();
        EnumConstant {
            name: name.into(),
            serialized_name: None,
            make: Arc::new(move || Box::new(prototype.clone()) as AnyValue),
            matches: Arc::new(move |host: &dyn Any| host.downcast_ref::<T>() == Some(&value)),
        }
    }

    #[must_use]
    pub fn with_serialized_name(mut self, name: impl Into<String>) -> Self {
        let alternates = self
            .serialized_name
            .take()
            .map(|n| n.alternates)
            .unwrap_or_default();
        self.serialized_name = Some(SerializedName {
            value: name.into(),
            alternates,
        });
        self
    }

    #[must_use]
    pub fn with_alternate(mut self, name: impl Into<String>) -> Self {
        let serialized = self.serialized_name.get_or_insert_with(|| SerializedName {
            value: self.name.clone(),
            alternates: Vec::new(),
        });
        serialized.alternates.push(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn serialized_name(&self) -> Option<&SerializedName> {
        self.serialized_name.as_ref()
    }

    /// The name this constant is written as.
    #[must_use]
    pub fn external_name(&self) -> &str {
        self.serialized_name.as_ref().map_or(&self.name, |n| &n.value)
    }

    /// A fresh host value of this constant.
    #[must_use]
    pub fn value(&self) -> AnyValue {
        (self.make)()
    }

    /// Returns `true` if `host` is this constant.
    #[must_use]
    pub fn matches(&self, host: &dyn Any) -> bool {
        (self.matches)(host)
    }
}

impl fmt::Debug for EnumConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumConstant")
            .field("name", &self.name)
            .field("serialized_name", &self.serialized_name)
            .finish_non_exhaustive()
    }
}

/// How a class is nested in its enclosing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    TopLevel,
    /// Nested without a reference to an enclosing instance.
    StaticNested,
    /// Bound to an instance of the enclosing class.
    Inner,
}

/// A declared type parameter and its upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    name: Arc<str>,
    bound: TypeSignature,
}

impl TypeParam {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bound(&self) -> &TypeSignature {
        &self.bound
    }
}

/// Everything the engine knows about one class.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: ClassRef,
    type_id: Option<TypeId>,
    type_params: Vec<TypeParam>,
    superclass: Option<TypeSignature>,
    interfaces: Vec<TypeSignature>,
    kind: ClassKind,
    nesting: Nesting,
    version: VersionRange,
    members: Vec<MemberDecl>,
    constants: Vec<EnumConstant>,
    constructor: Option<Constructor>,
}

impl ClassDescriptor {
    pub fn builder(name: impl Into<ClassRef>) -> ClassBuilder {
        ClassBuilder {
            descriptor: ClassDescriptor {
                name: name.into(),
                type_id: None,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                kind: ClassKind::Concrete,
                nesting: Nesting::TopLevel,
                version: VersionRange::default(),
                members: Vec::new(),
                constants: Vec::new(),
                constructor: None,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &ClassRef {
        &self.name
    }

    /// The Rust type of the class's instances, when known.
    #[must_use]
    pub fn rust_type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    #[must_use]
    pub fn type_params(&self) -> &[TypeParam] {
        &self.type_params
    }

    #[must_use]
    pub fn type_param_index(&self, name: &str) -> Option<usize> {
        self.type_params.iter().position(|p| p.name() == name)
    }

    #[must_use]
    pub fn superclass(&self) -> Option<&TypeSignature> {
        self.superclass.as_ref()
    }

    #[must_use]
    pub fn interfaces(&self) -> &[TypeSignature] {
        &self.interfaces
    }

    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, ClassKind::Abstract | ClassKind::Interface)
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    #[must_use]
    pub fn nesting(&self) -> Nesting {
        self.nesting
    }

    #[must_use]
    pub fn version(&self) -> VersionRange {
        self.version
    }

    #[must_use]
    pub fn members(&self) -> &[MemberDecl] {
        &self.members
    }

    /// The constants of an enum class, in declaration order.
    #[must_use]
    pub fn constants(&self) -> &[EnumConstant] {
        &self.constants
    }

    #[must_use]
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// The class applied to its own type variables, or the raw class when it
    /// declares none.
    #[must_use]
    pub fn this_type(&self) -> TypeSignature {
        let args = self
            .type_params
            .iter()
            .map(|p| TypeSignature::variable(p.name.clone(), self.name.clone()))
            .collect();
        TypeSignature::parameterized(self.name.clone(), args)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("type_params", &self.type_params)
            .field("superclass", &self.superclass)
            .field("kind", &self.kind)
            .field("nesting", &self.nesting)
            .field("members", &self.members)
            .field("constants", &self.constants)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClassDescriptor`].
#[must_use]
pub struct ClassBuilder {
    descriptor: ClassDescriptor,
}

impl ClassBuilder {
    /// Declares a type parameter bounded by `Object`.
    pub fn type_param(self, name: impl Into<Arc<str>>) -> Self {
        self.bounded_type_param(name, TypeSignature::object())
    }

    pub fn bounded_type_param(mut self, name: impl Into<Arc<str>>, bound: TypeSignature) -> Self {
        self.descriptor.type_params.push(TypeParam {
            name: name.into(),
            bound,
        });
        self
    }

    pub fn extends(mut self, superclass: TypeSignature) -> Self {
        self.descriptor.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeSignature) -> Self {
        self.descriptor.interfaces.push(interface);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.descriptor.kind = ClassKind::Abstract;
        self
    }

    pub fn interface(mut self) -> Self {
        self.descriptor.kind = ClassKind::Interface;
        self
    }

    /// Marks the class as an enum whose constants are values of `T`.
    pub fn enumeration<T: Any>(mut self) -> Self {
        self.descriptor.kind = ClassKind::Enum;
        self.descriptor.type_id = Some(TypeId::of::<T>());
        self
    }

    pub fn constant(mut self, constant: EnumConstant) -> Self {
        self.descriptor.constants.push(constant);
        self
    }

    pub fn inner(mut self) -> Self {
        self.descriptor.nesting = Nesting::Inner;
        self
    }

    pub fn static_nested(mut self) -> Self {
        self.descriptor.nesting = Nesting::StaticNested;
        self
    }

    pub fn since(mut self, version: f64) -> Self {
        self.descriptor.version.since = Some(version);
        self
    }

    pub fn until(mut self, version: f64) -> Self {
        self.descriptor.version.until = Some(version);
        self
    }

    /// Associates the class with the Rust type of its instances, enabling
    /// runtime-type dispatch for untyped values.
    pub fn rust_type<T: Any>(mut self) -> Self {
        self.descriptor.type_id = Some(TypeId::of::<T>());
        self
    }

    /// Sets the no-argument constructor; also records `T` as the instance type.
    pub fn constructor<T: Any>(mut self, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.descriptor.type_id = Some(TypeId::of::<T>());
        self.descriptor.constructor = Some(Arc::new(move || Box::new(make()) as AnyValue));
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.descriptor.members.push(member);
        self
    }

    /// Shorthand for [`MemberDecl::field`].
    pub fn field<T: Any, F: Any>(
        self,
        name: impl Into<String>,
        declared: TypeSignature,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.member(MemberDecl::field(name, declared, get, set))
    }

    /// Shorthand for [`MemberDecl::optional`].
    pub fn optional_field<T: Any, F: Any>(
        self,
        name: impl Into<String>,
        declared: TypeSignature,
        get: impl Fn(&T) -> Option<&F> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<F>) + Send + Sync + 'static,
    ) -> Self {
        self.member(MemberDecl::optional(name, declared, get, set))
    }

    #[must_use]
    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

impl Borrow<str> for ClassRef {
    fn borrow(&self) -> &str {
        self.name()
    }
}

/// Arena of class descriptors keyed by class name.
///
/// A fresh catalog already describes the builtin classes: `Object`, the
/// primitives, `String`, `List<E>`, `Map<K, V>` and `JsonValue`.
#[derive(Clone)]
pub struct TypeCatalog {
    classes: IndexMap<ClassRef, Arc<ClassDescriptor>>,
    by_type: HashMap<TypeId, ClassRef>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = TypeCatalog {
            classes: IndexMap::new(),
            by_type: HashMap::new(),
        };
        catalog.register(ClassDescriptor::builder(builtin::OBJECT).build());
        catalog.register_scalar::<bool>(builtin::BOOL);
        catalog.register_scalar::<char>(builtin::CHAR);
        catalog.register_scalar::<i8>(builtin::I8);
        catalog.register_scalar::<i16>(builtin::I16);
        catalog.register_scalar::<i32>(builtin::I32);
        catalog.register_scalar::<i64>(builtin::I64);
        catalog.register_scalar::<u8>(builtin::U8);
        catalog.register_scalar::<u16>(builtin::U16);
        catalog.register_scalar::<u32>(builtin::U32);
        catalog.register_scalar::<u64>(builtin::U64);
        catalog.register_scalar::<f32>(builtin::F32);
        catalog.register_scalar::<f64>(builtin::F64);
        catalog.register_scalar::<String>(builtin::STRING);
        catalog.register_scalar::<JsonValue>(builtin::JSON_VALUE);
        catalog.register(
            ClassDescriptor::builder(builtin::LIST)
                .type_param("E")
                .interface()
                .rust_type::<DynList>()
                .build(),
        );
        catalog.register(
            ClassDescriptor::builder(builtin::MAP)
                .type_param("K")
                .type_param("V")
                .interface()
                .rust_type::<DynMap>()
                .build(),
        );
        catalog
    }

    fn register_scalar<T: Any>(&mut self, name: &str) {
        self.register(ClassDescriptor::builder(name).rust_type::<T>().build());
    }

    /// Adds or replaces a descriptor, returning its class identity.
    pub fn register(&mut self, descriptor: ClassDescriptor) -> ClassRef {
        let name = descriptor.name.clone();
        if let Some(type_id) = descriptor.type_id {
            self.by_type.insert(type_id, name.clone());
        }
        self.classes.insert(name.clone(), Arc::new(descriptor));
        name
    }

    #[must_use]
    pub fn get(&self, class: &ClassRef) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(class)
    }

    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn contains(&self, class: &ClassRef) -> bool {
        self.classes.contains_key(class)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> {
        self.classes.values()
    }

    /// The class registered for the Rust type `type_id`.
    #[must_use]
    pub fn class_of_type(&self, type_id: TypeId) -> Option<&ClassRef> {
        self.by_type.get(&type_id)
    }

    /// The class of a host value's dynamic type.
    #[must_use]
    pub fn class_of_value(&self, value: &dyn Any) -> Option<&ClassRef> {
        self.by_type.get(&value.type_id())
    }

    /// Returns `true` if `from` is `to` or one of its subclasses or
    /// implementors. Every class is assignable to `Object`.
    #[must_use]
    pub fn is_assignable(&self, from: &ClassRef, to: &ClassRef) -> bool {
        if from == to || to.is_object() {
            return true;
        }
        let mut pending = vec![from.clone()];
        let mut seen = HashSet::new();
        while let Some(class) = pending.pop() {
            if &class == to {
                return true;
            }
            if !seen.insert(class.clone()) {
                continue;
            }
            if let Some(descriptor) = self.get(&class) {
                pending.extend(
                    descriptor
                        .superclass()
                        .into_iter()
                        .chain(descriptor.interfaces())
                        .filter_map(TypeSignature::raw_class)
                        .cloned(),
                );
            }
        }
        false
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.classes.keys()).finish()
    }
}
