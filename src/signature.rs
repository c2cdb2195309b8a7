//! Canonical, structurally comparable type signatures.
//!
//! A [`TypeSignature`] names a possibly generic type: a raw class, a class
//! applied to type arguments, a type variable, or a wildcard. Signatures are
//! immutable, cheap to clone and hashable, so the adapter registry uses them
//! directly as cache keys.
//!
//! Wildcard constructors normalize their bound, so a doubly wrapped bound is
//! the same signature as a single one:
//!
//! ```rust
//! use jsonbind::TypeSignature;
//!
//! let number = TypeSignature::class("Number");
//! assert_eq!(
//!     TypeSignature::supertype_of(TypeSignature::supertype_of(number.clone())),
//!     TypeSignature::supertype_of(number.clone()),
//! );
//! assert_eq!(
//!     TypeSignature::subtype_of(TypeSignature::supertype_of(number)),
//!     TypeSignature::subtype_of(TypeSignature::object()),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

/// Names of the classes every catalog knows about.
pub mod builtin {
    pub const OBJECT: &str = "Object";
    pub const BOOL: &str = "bool";
    pub const CHAR: &str = "char";
    pub const I8: &str = "i8";
    pub const I16: &str = "i16";
    pub const I32: &str = "i32";
    pub const I64: &str = "i64";
    pub const U8: &str = "u8";
    pub const U16: &str = "u16";
    pub const U32: &str = "u32";
    pub const U64: &str = "u64";
    pub const F32: &str = "f32";
    pub const F64: &str = "f64";
    pub const STRING: &str = "String";
    pub const LIST: &str = "List";
    pub const MAP: &str = "Map";
    pub const JSON_VALUE: &str = "JsonValue";
}

/// Nominal identity of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassRef(Arc<str>);

impl ClassRef {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        ClassRef(name.into())
    }

    /// The root of every class hierarchy.
    #[must_use]
    pub fn object() -> Self {
        ClassRef::new(builtin::OBJECT)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        &*self.0 == builtin::OBJECT
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassRef {
    fn from(name: &str) -> Self {
        ClassRef::new(name)
    }
}

impl From<String> for ClassRef {
    fn from(name: String) -> Self {
        ClassRef::new(name)
    }
}

/// A type parameter, identified by its name and the class declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    name: Arc<str>,
    declared_by: ClassRef,
}

impl TypeVariable {
    pub fn new(name: impl Into<Arc<str>>, declared_by: impl Into<ClassRef>) -> Self {
        TypeVariable {
            name: name.into(),
            declared_by: declared_by.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declared_by(&self) -> &ClassRef {
        &self.declared_by
    }
}

/// A class applied to type arguments, optionally nested in an owning type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameterized {
    owner: Option<Box<TypeSignature>>,
    raw: ClassRef,
    args: Vec<TypeSignature>,
}

impl Parameterized {
    #[must_use]
    pub fn owner(&self) -> Option<&TypeSignature> {
        self.owner.as_deref()
    }

    #[must_use]
    pub fn raw(&self) -> &ClassRef {
        &self.raw
    }

    #[must_use]
    pub fn args(&self) -> &[TypeSignature] {
        &self.args
    }
}

/// `? extends upper` or `? super lower`.
///
/// A lower-bounded wildcard always carries `Object` as its upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Wildcard {
    upper: Box<TypeSignature>,
    lower: Option<Box<TypeSignature>>,
}

impl Wildcard {
    #[must_use]
    pub fn upper(&self) -> &TypeSignature {
        &self.upper
    }

    #[must_use]
    pub fn lower(&self) -> Option<&TypeSignature> {
        self.lower.as_deref()
    }
}

/// A possibly generic type.
///
/// Equality and hashing are structural. Build signatures through the
/// constructors, which keep wildcards normalized and collapse argument-less
/// parameterizations to plain classes.
///
/// # Examples
///
/// ```rust
/// use jsonbind::TypeSignature;
///
/// let list = TypeSignature::list_of(TypeSignature::subtype_of(TypeSignature::class("Number")));
/// assert_eq!(list.to_string(), "List<? extends Number>");
/// assert_eq!(list, TypeSignature::parameterized("List", vec![
///     TypeSignature::subtype_of(TypeSignature::class("Number")),
/// ]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Class(ClassRef),
    Parameterized(Parameterized),
    Variable(TypeVariable),
    Wildcard(Wildcard),
}

impl TypeSignature {
    pub fn class(name: impl Into<ClassRef>) -> Self {
        TypeSignature::Class(name.into())
    }

    #[must_use]
    pub fn object() -> Self {
        TypeSignature::Class(ClassRef::object())
    }

    #[must_use]
    pub fn string() -> Self {
        TypeSignature::class(builtin::STRING)
    }

    #[must_use]
    pub fn json_value() -> Self {
        TypeSignature::class(builtin::JSON_VALUE)
    }

    /// `List<element>`.
    #[must_use]
    pub fn list_of(element: TypeSignature) -> Self {
        TypeSignature::parameterized(builtin::LIST, vec![element])
    }

    /// `Map<String, value>`.
    #[must_use]
    pub fn map_of(value: TypeSignature) -> Self {
        TypeSignature::parameterized(builtin::MAP, vec![TypeSignature::string(), value])
    }

    pub fn parameterized(raw: impl Into<ClassRef>, args: Vec<TypeSignature>) -> Self {
        TypeSignature::parameterized_with_owner(None, raw, args)
    }

    pub fn parameterized_with_owner(
        owner: Option<TypeSignature>,
        raw: impl Into<ClassRef>,
        args: Vec<TypeSignature>,
    ) -> Self {
        let raw = raw.into();
        if owner.is_none() && args.is_empty() {
            return TypeSignature::Class(raw);
        }
        TypeSignature::Parameterized(Parameterized {
            owner: owner.map(Box::new),
            raw,
            args,
        })
    }

    pub fn variable(name: impl Into<Arc<str>>, declared_by: impl Into<ClassRef>) -> Self {
        TypeSignature::Variable(TypeVariable::new(name, declared_by))
    }

    /// `? extends bound`. Wrapping a wildcard keeps only its upper bound.
    #[must_use]
    pub fn subtype_of(bound: TypeSignature) -> Self {
        let upper = match bound {
            TypeSignature::Wildcard(w) => w.upper,
            other => Box::new(other),
        };
        TypeSignature::Wildcard(Wildcard { upper, lower: None })
    }

    /// `? super bound`. Wrapping a wildcard keeps only its lower bound, and a
    /// wildcard without one becomes `? extends Object`.
    #[must_use]
    pub fn supertype_of(bound: TypeSignature) -> Self {
        let lower = match bound {
            TypeSignature::Wildcard(w) => w.lower,
            other => Some(Box::new(other)),
        };
        TypeSignature::Wildcard(Wildcard {
            upper: Box::new(TypeSignature::object()),
            lower,
        })
    }

    /// `?`, the same as `? extends Object`.
    #[must_use]
    pub fn unbounded() -> Self {
        TypeSignature::subtype_of(TypeSignature::object())
    }

    /// The raw class of a class or parameterized signature.
    #[must_use]
    pub fn raw_class(&self) -> Option<&ClassRef> {
        match self {
            TypeSignature::Class(class) => Some(class),
            TypeSignature::Parameterized(p) => Some(&p.raw),
            TypeSignature::Variable(_) | TypeSignature::Wildcard(_) => None,
        }
    }

    /// Type arguments; empty for anything but a parameterized signature.
    #[must_use]
    pub fn args(&self) -> &[TypeSignature] {
        match self {
            TypeSignature::Parameterized(p) => &p.args,
            _ => &[],
        }
    }

    /// Returns `true` if a type variable occurs anywhere in the signature.
    #[must_use]
    pub fn has_variables(&self) -> bool {
        match self {
            TypeSignature::Class(_) => false,
            TypeSignature::Variable(_) => true,
            TypeSignature::Parameterized(p) => {
                p.owner.as_deref().is_some_and(TypeSignature::has_variables)
                    || p.args.iter().any(TypeSignature::has_variables)
            }
            TypeSignature::Wildcard(w) => {
                w.upper.has_variables() || w.lower.as_deref().is_some_and(TypeSignature::has_variables)
            }
        }
    }
}

impl From<ClassRef> for TypeSignature {
    fn from(class: ClassRef) -> Self {
        TypeSignature::Class(class)
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Class(class) => write!(f, "{class}"),
            TypeSignature::Parameterized(p) => {
                if let Some(owner) = &p.owner {
                    write!(f, "{owner}$")?;
                }
                write!(f, "{}<", p.raw)?;
                for (i, arg) in p.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeSignature::Variable(v) => f.write_str(&v.name),
            TypeSignature::Wildcard(w) => match &w.lower {
                Some(lower) => write!(f, "? super {lower}"),
                None if w.upper.raw_class().is_some_and(ClassRef::is_object) => f.write_str("?"),
                None => write!(f, "? extends {}", w.upper),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn number() -> TypeSignature {
        TypeSignature::class("Number")
    }

    #[test]
    fn test_double_supertype() {
        assert_eq!(
            TypeSignature::supertype_of(TypeSignature::supertype_of(number())),
            TypeSignature::supertype_of(number())
        );
    }

    #[test]
    fn test_double_subtype() {
        assert_eq!(
            TypeSignature::subtype_of(TypeSignature::subtype_of(number())),
            TypeSignature::subtype_of(number())
        );
    }

    #[test]
    fn test_super_of_sub_and_sub_of_super() {
        assert_eq!(
            TypeSignature::supertype_of(TypeSignature::subtype_of(number())),
            TypeSignature::subtype_of(TypeSignature::object())
        );
        assert_eq!(
            TypeSignature::subtype_of(TypeSignature::supertype_of(number())),
            TypeSignature::subtype_of(TypeSignature::object())
        );
    }

    #[test]
    fn test_structural_hash_agrees_with_eq() {
        let a = TypeSignature::map_of(TypeSignature::list_of(number()));
        let b = TypeSignature::parameterized(
            "Map",
            vec![TypeSignature::string(), TypeSignature::list_of(number())],
        );
        let set: HashSet<_> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_empty_parameterization_is_raw_class() {
        assert_eq!(TypeSignature::parameterized("Foo", vec![]), TypeSignature::class("Foo"));
    }

    #[test]
    fn test_display() {
        let sig = TypeSignature::parameterized(
            "Foo",
            vec![
                TypeSignature::supertype_of(TypeSignature::variable("T", "Bar")),
                TypeSignature::unbounded(),
            ],
        );
        assert_eq!(sig.to_string(), "Foo<? super T, ?>");
        assert!(sig.has_variables());
    }
}
