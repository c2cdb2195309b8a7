//! Type-variable resolution against a generic context.
//!
//! Resolving `T` declared by `Base<T>` in the context `Leaf` walks the
//! catalog's supertype chain from `Leaf` up to `Base`, takes the argument
//! `Leaf` passes for `T`, and resolves that argument in turn until it no
//! longer mentions variables bound by the context.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{ClassDescriptor, Resolver, TypeCatalog, TypeSignature};
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register(ClassDescriptor::builder("Base").type_param("T").build());
//! catalog.register(
//!     ClassDescriptor::builder("Leaf")
//!         .extends(TypeSignature::parameterized("Base", vec![TypeSignature::string()]))
//!         .build(),
//! );
//!
//! let resolver = Resolver::new(&catalog);
//! let resolved = resolver
//!     .resolve(&TypeSignature::class("Leaf"), &TypeSignature::variable("T", "Base"))
//!     .unwrap();
//! assert_eq!(resolved, TypeSignature::string());
//! ```

use std::collections::HashMap;

use crate::catalog::TypeCatalog;
use crate::error::{Error, Result};
use crate::signature::{ClassRef, TypeSignature, TypeVariable};

/// Bounds the supertype walk and bound erasure on malformed, cyclic catalogs.
const MAX_DEPTH: usize = 64;

/// `None` marks a variable whose resolution is still in progress.
type Visited = HashMap<TypeVariable, Option<TypeSignature>>;

/// Resolves type signatures against the classes of a [`TypeCatalog`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Resolver { catalog }
    }

    /// Substitutes the type variables of `signature` bound by `context`.
    ///
    /// Variables `context` does not bind are left in place. A variable met
    /// again while its own resolution is in progress resolves to its declared
    /// bound.
    pub fn resolve(&self, context: &TypeSignature, signature: &TypeSignature) -> Result<TypeSignature> {
        let mut visited = Visited::new();
        self.resolve_in(context, signature, &mut visited)
    }

    fn resolve_in(
        &self,
        context: &TypeSignature,
        signature: &TypeSignature,
        visited: &mut Visited,
    ) -> Result<TypeSignature> {
        match signature {
            TypeSignature::Class(_) => Ok(signature.clone()),
            TypeSignature::Variable(variable) => {
                match visited.get(variable) {
                    Some(Some(done)) => return Ok(done.clone()),
                    Some(None) => return self.declared_bound(variable),
                    None => {}
                }
                visited.insert(variable.clone(), None);
                let binding = self.resolve_variable(context, variable)?;
                let resolved = if binding == *signature {
                    binding
                } else {
                    self.resolve_in(context, &binding, visited)?
                };
                visited.insert(variable.clone(), Some(resolved.clone()));
                Ok(resolved)
            }
            TypeSignature::Parameterized(p) => {
                let owner = p
                    .owner()
                    .map(|owner| self.resolve_in(context, owner, visited))
                    .transpose()?;
                let args = p
                    .args()
                    .iter()
                    .map(|arg| self.resolve_in(context, arg, visited))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeSignature::parameterized_with_owner(owner, p.raw().clone(), args))
            }
            TypeSignature::Wildcard(w) => match w.lower() {
                Some(lower) => Ok(TypeSignature::supertype_of(self.resolve_in(context, lower, visited)?)),
                None => Ok(TypeSignature::subtype_of(self.resolve_in(context, w.upper(), visited)?)),
            },
        }
    }

    /// The argument `context` supplies for `variable`, unresolved, or the
    /// variable itself when `context` does not parameterize its declarer.
    fn resolve_variable(&self, context: &TypeSignature, variable: &TypeVariable) -> Result<TypeSignature> {
        let index = self.param_index(variable)?;
        let unresolved = TypeSignature::Variable(variable.clone());
        let Some(raw) = context.raw_class() else {
            return Ok(unresolved);
        };
        match self.supertype_at(context, raw, variable.declared_by(), 0) {
            Some(TypeSignature::Parameterized(p)) => Ok(p.args().get(index).cloned().unwrap_or(unresolved)),
            _ => Ok(unresolved),
        }
    }

    fn param_index(&self, variable: &TypeVariable) -> Result<usize> {
        self.catalog
            .get(variable.declared_by())
            .and_then(|declaring| declaring.type_param_index(variable.name()))
            .ok_or_else(|| Error::TypeResolution {
                variable: variable.name().to_string(),
                declared_by: variable.declared_by().to_string(),
            })
    }

    /// The signature under which `context` sees its supertype `target`,
    /// expressed in terms of the variables of the class that names `target`
    /// directly.
    #[must_use]
    pub fn generic_supertype(&self, context: &TypeSignature, target: &ClassRef) -> Option<TypeSignature> {
        let raw = context.raw_class()?;
        self.supertype_at(context, raw, target, 0)
    }

    fn supertype_at(
        &self,
        context: &TypeSignature,
        raw: &ClassRef,
        target: &ClassRef,
        depth: usize,
    ) -> Option<TypeSignature> {
        if raw == target {
            return Some(context.clone());
        }
        if depth >= MAX_DEPTH {
            return None;
        }
        let descriptor = self.catalog.get(raw)?;
        for supertype in descriptor.interfaces().iter().chain(descriptor.superclass()) {
            let Some(super_raw) = supertype.raw_class() else {
                continue;
            };
            if super_raw == target {
                return Some(supertype.clone());
            }
            if self.catalog.is_assignable(super_raw, target) {
                return self.supertype_at(supertype, super_raw, target, depth + 1);
            }
        }
        None
    }

    /// The declared upper bound of `variable`.
    pub fn declared_bound(&self, variable: &TypeVariable) -> Result<TypeSignature> {
        let index = self.param_index(variable)?;
        self.catalog
            .get(variable.declared_by())
            .and_then(|declaring| declaring.type_params().get(index))
            .map(|param| param.bound().clone())
            .ok_or_else(|| Error::TypeResolution {
                variable: variable.name().to_string(),
                declared_by: variable.declared_by().to_string(),
            })
    }

    /// The raw class of `signature`. Variables erase to the erasure of their
    /// bound and wildcards to the erasure of their upper bound.
    #[must_use]
    pub fn erasure(&self, signature: &TypeSignature) -> ClassRef {
        self.erasure_at(signature, 0)
    }

    fn erasure_at(&self, signature: &TypeSignature, depth: usize) -> ClassRef {
        match signature {
            TypeSignature::Class(class) => class.clone(),
            TypeSignature::Parameterized(p) => p.raw().clone(),
            TypeSignature::Wildcard(w) => self.erasure_at(w.upper(), depth + 1),
            TypeSignature::Variable(variable) if depth < MAX_DEPTH => match self.declared_bound(variable) {
                Ok(bound) => self.erasure_at(&bound, depth + 1),
                Err(_) => ClassRef::object(),
            },
            TypeSignature::Variable(_) => ClassRef::object(),
        }
    }

    /// The signature adapters are looked up under: wildcards stand for their
    /// upper bound and unresolved variables for their erasure.
    #[must_use]
    pub fn adapter_key(&self, signature: &TypeSignature) -> TypeSignature {
        match signature {
            TypeSignature::Wildcard(w) => self.adapter_key(w.upper()),
            TypeSignature::Variable(_) => TypeSignature::Class(self.erasure(signature)),
            _ => signature.clone(),
        }
    }

    /// Rebuilds `signature` through the normalizing constructors.
    #[must_use]
    pub fn canonicalize(&self, signature: &TypeSignature) -> TypeSignature {
        match signature {
            TypeSignature::Class(_) | TypeSignature::Variable(_) => signature.clone(),
            TypeSignature::Parameterized(p) => TypeSignature::parameterized_with_owner(
                p.owner().map(|owner| self.canonicalize(owner)),
                p.raw().clone(),
                p.args().iter().map(|arg| self.canonicalize(arg)).collect(),
            ),
            TypeSignature::Wildcard(w) => match w.lower() {
                Some(lower) => TypeSignature::supertype_of(self.canonicalize(lower)),
                None => TypeSignature::subtype_of(self.canonicalize(w.upper())),
            },
        }
    }

    /// Returns `true` if `from` is `to` or one of its subtypes.
    #[must_use]
    pub fn is_assignable(&self, from: &ClassRef, to: &ClassRef) -> bool {
        self.catalog.is_assignable(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassDescriptor;

    fn var(name: &str, declared_by: &str) -> TypeSignature {
        TypeSignature::variable(name, declared_by)
    }

    fn chain_catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register(ClassDescriptor::builder("Base").type_param("T").build());
        catalog.register(
            ClassDescriptor::builder("Mid")
                .type_param("U")
                .extends(TypeSignature::parameterized(
                    "Base",
                    vec![TypeSignature::list_of(var("U", "Mid"))],
                ))
                .build(),
        );
        catalog.register(
            ClassDescriptor::builder("Leaf")
                .extends(TypeSignature::parameterized("Mid", vec![TypeSignature::string()]))
                .build(),
        );
        catalog
    }

    #[test]
    fn test_resolves_through_superclass_chain() {
        let catalog = chain_catalog();
        let resolver = Resolver::new(&catalog);
        let resolved = resolver
            .resolve(&TypeSignature::class("Leaf"), &var("T", "Base"))
            .unwrap();
        assert_eq!(resolved, TypeSignature::list_of(TypeSignature::string()));
    }

    #[test]
    fn test_unbound_variable_is_kept() {
        let catalog = chain_catalog();
        let resolver = Resolver::new(&catalog);
        let resolved = resolver.resolve(&TypeSignature::class("Base"), &var("T", "Base")).unwrap();
        assert_eq!(resolved, var("T", "Base"));
    }

    #[test]
    fn test_wildcards_resolve_and_normalize() {
        let catalog = chain_catalog();
        let resolver = Resolver::new(&catalog);
        let context = TypeSignature::parameterized("Base", vec![TypeSignature::subtype_of(TypeSignature::string())]);
        let resolved = resolver
            .resolve(&context, &TypeSignature::supertype_of(var("T", "Base")))
            .unwrap();
        assert_eq!(resolved, TypeSignature::unbounded());

        let resolved = resolver
            .resolve(&context, &TypeSignature::subtype_of(var("T", "Base")))
            .unwrap();
        assert_eq!(resolved, TypeSignature::subtype_of(TypeSignature::string()));
    }

    #[test]
    fn test_cyclic_bindings_terminate_at_declared_bound() {
        let mut catalog = TypeCatalog::new();
        catalog.register(
            ClassDescriptor::builder("Pair")
                .bounded_type_param("A", TypeSignature::class("Number"))
                .type_param("B")
                .build(),
        );
        let resolver = Resolver::new(&catalog);
        let swapped = TypeSignature::parameterized("Pair", vec![var("B", "Pair"), var("A", "Pair")]);
        let resolved = resolver.resolve(&swapped, &var("A", "Pair")).unwrap();
        assert_eq!(resolved, TypeSignature::class("Number"));
    }

    #[test]
    fn test_undeclared_variable_fails() {
        let catalog = chain_catalog();
        let resolver = Resolver::new(&catalog);
        let err = resolver
            .resolve(&TypeSignature::class("Leaf"), &var("Q", "Missing"))
            .unwrap_err();
        assert!(matches!(err, Error::TypeResolution { ref declared_by, .. } if declared_by == "Missing"));
        assert!(resolver.resolve(&TypeSignature::class("Leaf"), &var("Z", "Base")).is_err());
    }

    #[test]
    fn test_erasure_and_adapter_key() {
        let mut catalog = TypeCatalog::new();
        catalog.register(
            ClassDescriptor::builder("Holder")
                .bounded_type_param("N", TypeSignature::class("Number"))
                .build(),
        );
        let resolver = Resolver::new(&catalog);
        let n = var("N", "Holder");
        assert_eq!(resolver.erasure(&n).name(), "Number");
        assert_eq!(
            resolver.erasure(&TypeSignature::list_of(n.clone())).name(),
            "List"
        );
        assert_eq!(resolver.adapter_key(&n), TypeSignature::class("Number"));
        assert_eq!(
            resolver.adapter_key(&TypeSignature::supertype_of(TypeSignature::string())),
            TypeSignature::object()
        );
        assert_eq!(resolver.erasure(&var("X", "Nowhere")), ClassRef::object());
    }

    #[test]
    fn test_generic_supertype_through_interface() {
        let mut catalog = TypeCatalog::new();
        catalog.register(
            ClassDescriptor::builder("Names")
                .implements(TypeSignature::list_of(TypeSignature::string()))
                .build(),
        );
        let resolver = Resolver::new(&catalog);
        let list = ClassRef::from("List");
        assert_eq!(
            resolver.generic_supertype(&TypeSignature::class("Names"), &list),
            Some(TypeSignature::list_of(TypeSignature::string()))
        );
        let resolved = resolver
            .resolve(&TypeSignature::class("Names"), &var("E", "List"))
            .unwrap();
        assert_eq!(resolved, TypeSignature::string());
    }
}
