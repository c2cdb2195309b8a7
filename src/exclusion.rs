//! Class and member exclusion.
//!
//! An [`ExclusionPolicy`] decides, per direction, whether a class or member
//! takes part in binding. Every combinator adds a constraint; none removes
//! one, so a policy only ever excludes more as it is extended.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{ExclusionPolicy, MemberDecl, Modifiers, TypeSignature};
//!
//! let host = TypeSignature::class("Account");
//! let secret = MemberDecl::field("secret", TypeSignature::string(), |s: &String| s, |s: &mut String, v| *s = v)
//!     .with_modifiers(Modifiers::TRANSIENT)
//!     .descriptor(&host);
//!
//! let policy = ExclusionPolicy::new();
//! assert!(policy.excludes_member(&secret, false));
//! assert!(!ExclusionPolicy::empty().excludes_member(&secret, false));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::catalog::{ClassDescriptor, MemberDescriptor, Modifiers, Nesting};
use crate::signature::ClassRef;

/// Which direction of binding a custom strategy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Serialize,
    Deserialize,
    Both,
}

impl Direction {
    #[inline]
    #[must_use]
    pub const fn applies(self, deserialize: bool) -> bool {
        match self {
            Direction::Serialize => !deserialize,
            Direction::Deserialize => deserialize,
            Direction::Both => true,
        }
    }
}

/// A user-supplied exclusion rule.
pub trait ExclusionStrategy: Send + Sync {
    fn should_skip_member(&self, member: &MemberDescriptor) -> bool;
    fn should_skip_class(&self, class: &ClassRef) -> bool;
}

/// Composable exclusion rules.
#[derive(Clone)]
pub struct ExclusionPolicy {
    versions: Vec<f64>,
    modifiers: Modifiers,
    serialize_inner_classes: bool,
    require_expose_serialize: bool,
    require_expose_deserialize: bool,
    strategies: Vec<(Arc<dyn ExclusionStrategy>, Direction)>,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionPolicy {
    /// Excludes static and transient members, nothing else.
    #[must_use]
    pub fn new() -> Self {
        ExclusionPolicy {
            modifiers: Modifiers::TRANSIENT | Modifiers::STATIC,
            ..Self::empty()
        }
    }

    /// Excludes nothing at all.
    #[must_use]
    pub fn empty() -> Self {
        ExclusionPolicy {
            versions: Vec::new(),
            modifiers: Modifiers::NONE,
            serialize_inner_classes: true,
            require_expose_serialize: false,
            require_expose_deserialize: false,
            strategies: Vec::new(),
        }
    }

    /// Excludes classes and members not valid in `version`. Applying several
    /// versions requires validity in each of them.
    #[must_use]
    pub fn with_version(mut self, version: f64) -> Self {
        self.versions.push(version);
        self
    }

    /// Adds `modifiers` to the excluded modifier set.
    #[must_use]
    pub fn excluding_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Excludes classes bound to an enclosing instance.
    #[must_use]
    pub fn without_inner_classes(mut self) -> Self {
        self.serialize_inner_classes = false;
        self
    }

    /// Requires the expose marker on every member, in both directions.
    #[must_use]
    pub fn requiring_expose(self) -> Self {
        self.requiring_expose_for(Direction::Both)
    }

    #[must_use]
    pub fn requiring_expose_for(mut self, direction: Direction) -> Self {
        self.require_expose_serialize |= direction.applies(false);
        self.require_expose_deserialize |= direction.applies(true);
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ExclusionStrategy>, direction: Direction) -> Self {
        self.strategies.push((strategy, direction));
        self
    }

    /// Replaces the excluded modifier set. Unlike the combinators this can
    /// exclude less than before.
    pub(crate) fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Replaces the configured versions with a single one.
    pub(crate) fn set_version(&mut self, version: f64) {
        self.versions = vec![version];
    }

    /// Returns `true` if no instance of `class` is bound in this direction.
    #[must_use]
    pub fn excludes_class(&self, class: &ClassDescriptor, deserialize: bool) -> bool {
        let version = class.version();
        if self.versions.iter().any(|&v| !version.is_valid(v)) {
            return true;
        }
        if !self.serialize_inner_classes && class.nesting() == Nesting::Inner {
            return true;
        }
        self.strategies
            .iter()
            .filter(|(_, direction)| direction.applies(deserialize))
            .any(|(strategy, _)| strategy.should_skip_class(class.name()))
    }

    /// Returns `true` if `member` is skipped in this direction. The class of
    /// the member's declared type is checked separately through
    /// [`excludes_class`](Self::excludes_class).
    #[must_use]
    pub fn excludes_member(&self, member: &MemberDescriptor, deserialize: bool) -> bool {
        if self.versions.iter().any(|&v| !member.version.is_valid(v)) {
            return true;
        }
        if member.modifiers.intersects(self.modifiers) || member.has_modifier(Modifiers::SYNTHETIC) {
            return true;
        }
        let require_expose = if deserialize {
            self.require_expose_deserialize
        } else {
            self.require_expose_serialize
        };
        if require_expose {
            match member.expose {
                None => return true,
                Some(expose) if deserialize && !expose.deserialize => return true,
                Some(expose) if !deserialize && !expose.serialize => return true,
                Some(_) => {}
            }
        }
        self.strategies
            .iter()
            .filter(|(_, direction)| direction.applies(deserialize))
            .any(|(strategy, _)| strategy.should_skip_member(member))
    }

    /// Returns `true` if the policy can never exclude a class, which lets the
    /// class-exclusion factory step aside.
    #[must_use]
    pub fn never_excludes_classes(&self) -> bool {
        self.versions.is_empty() && self.serialize_inner_classes && self.strategies.is_empty()
    }
}

impl fmt::Debug for ExclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusionPolicy")
            .field("versions", &self.versions)
            .field("modifiers", &self.modifiers)
            .field("serialize_inner_classes", &self.serialize_inner_classes)
            .field("require_expose_serialize", &self.require_expose_serialize)
            .field("require_expose_deserialize", &self.require_expose_deserialize)
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemberDecl;
    use crate::signature::TypeSignature;

    struct SkipNamed(&'static str);

    impl ExclusionStrategy for SkipNamed {
        fn should_skip_member(&self, member: &MemberDescriptor) -> bool {
            member.name == self.0
        }

        fn should_skip_class(&self, class: &ClassRef) -> bool {
            class.name() == self.0
        }
    }

    #[derive(Default)]
    struct Host {
        value: i32,
    }

    fn member(name: &str) -> MemberDecl {
        MemberDecl::field(name, TypeSignature::class("i32"), |h: &Host| &h.value, |h: &mut Host, v| h.value = v)
    }

    fn describe(decl: MemberDecl) -> MemberDescriptor {
        decl.descriptor(&TypeSignature::class("Host"))
    }

    #[test]
    fn test_versions() {
        let policy = ExclusionPolicy::empty().with_version(1.5);
        assert!(!policy.excludes_member(&describe(member("a").since(1.0)), false));
        assert!(policy.excludes_member(&describe(member("a").since(2.0)), false));
        assert!(policy.excludes_member(&describe(member("a").until(1.5)), true));
        assert!(!policy.excludes_member(&describe(member("a").until(1.6)), true));
    }

    #[test]
    fn test_expose_per_direction() {
        let policy = ExclusionPolicy::empty().requiring_expose();
        let plain = describe(member("plain"));
        let write_off = describe(member("write_off").with_expose(false, true));
        assert!(policy.excludes_member(&plain, false));
        assert!(policy.excludes_member(&plain, true));
        assert!(policy.excludes_member(&write_off, false));
        assert!(!policy.excludes_member(&write_off, true));
    }

    #[test]
    fn test_inner_classes() {
        let inner = ClassDescriptor::builder("Outer$Inner").inner().build();
        let nested = ClassDescriptor::builder("Outer$Nested").static_nested().build();
        let policy = ExclusionPolicy::new().without_inner_classes();
        assert!(policy.excludes_class(&inner, false));
        assert!(!policy.excludes_class(&nested, false));
        assert!(!ExclusionPolicy::new().excludes_class(&inner, false));
    }

    #[test]
    fn test_strategy_direction() {
        let policy = ExclusionPolicy::empty().with_strategy(Arc::new(SkipNamed("x")), Direction::Deserialize);
        let x = describe(member("x"));
        assert!(!policy.excludes_member(&x, false));
        assert!(policy.excludes_member(&x, true));
    }

    #[test]
    fn test_combinators_are_monotonic() {
        let members = [
            describe(member("a")),
            describe(member("b").with_modifiers(Modifiers::TRANSIENT)),
            describe(member("c").since(3.0)),
            describe(member("d").with_expose(true, false)),
        ];
        let steps: Vec<fn(ExclusionPolicy) -> ExclusionPolicy> = vec![
            |p| p.excluding_modifiers(Modifiers::FINAL),
            |p| p.with_version(2.0),
            |p| p.requiring_expose_for(Direction::Deserialize),
            |p| p.with_strategy(Arc::new(SkipNamed("a")), Direction::Both),
            |p| p.without_inner_classes(),
        ];
        let mut policy = ExclusionPolicy::new();
        for step in steps {
            let next = step(policy.clone());
            for m in &members {
                for deserialize in [false, true] {
                    if policy.excludes_member(m, deserialize) {
                        assert!(next.excludes_member(m, deserialize), "{} un-excluded", m.name);
                    }
                }
            }
            policy = next;
        }
    }
}
