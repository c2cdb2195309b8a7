//! The reflective adapter factory.
//!
//! Record-like classes described in the [`TypeCatalog`](crate::TypeCatalog)
//! are bound member by member. For each signature the factory walks the
//! class and its superclass chain once, resolving every member's declared
//! type against the signature's type arguments, filtering members through
//! the exclusion policy and naming them. The result is an immutable table of
//! bound fields, keyed by external name in declaration order, ancestors
//! first.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{Binder, ClassDescriptor, TypeSignature};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     label: Option<String>,
//! }
//!
//! let binder = Binder::builder()
//!     .register_class(
//!         ClassDescriptor::builder("Point")
//!             .constructor(Point::default)
//!             .field("x", TypeSignature::class("i32"), |p: &Point| &p.x, |p: &mut Point, v| p.x = v)
//!             .optional_field("label", TypeSignature::string(), |p: &Point| p.label.as_ref(), |p: &mut Point, v| p.label = v)
//!             .build(),
//!     )
//!     .build();
//!
//! let point = TypeSignature::class("Point");
//! let json = binder.to_json(Some(&Point { x: 3, label: None }), &point).unwrap();
//! assert_eq!(json, r#"{"x":3}"#);
//!
//! let back: Option<Point> = binder.from_json_as(r#"{"x":4,"label":"a","extra":[1]}"#, &point).unwrap();
//! assert_eq!(back, Some(Point { x: 4, label: Some("a".into()) }));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::adapter::{AdapterFactory, NullSafe, TypeAdapter};
use crate::catalog::{AnyValue, ClassDescriptor, Constructor, MemberDecl};
use crate::error::{Error, Result};
use crate::map::OrderedMap;
use crate::registry::{FactoryContext, Registry};
use crate::signature::{ClassRef, TypeSignature};
use crate::stream::{TokenReader, TokenWriter};

/// Bounds the superclass walk on cyclic catalogs.
const MAX_SUPERCLASS_DEPTH: usize = 64;

/// Binds catalog classes member by member. Always the last factory in the
/// chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectiveFactory;

impl AdapterFactory for ReflectiveFactory {
    fn create(&self, signature: &TypeSignature, context: &FactoryContext<'_>) -> Result<Option<Arc<dyn TypeAdapter>>> {
        let Some(raw) = signature.raw_class() else {
            return Ok(None);
        };
        let Some(descriptor) = context.catalog().get(raw) else {
            return Ok(None);
        };

        let fields = bind_fields(signature, descriptor, context)?;
        let constructor = context
            .instance_creator(raw)
            .or_else(|| descriptor.constructor().filter(|_| !descriptor.is_abstract()))
            .cloned()
            .ok_or_else(|| Error::NoInstantiationStrategy {
                type_name: signature.to_string(),
            });
        debug!(
            %signature,
            fields = fields.len(),
            instantiable = constructor.is_ok(),
            "bound reflective fields"
        );

        let adapter = ReflectiveAdapter {
            type_name: signature.to_string(),
            type_id: descriptor.rust_type_id(),
            fields,
            constructor,
            registry: context.registry(),
        };
        Ok(Some(NullSafe::wrap(Arc::new(adapter))))
    }
}

/// A member paired with its adapter and external name.
struct BoundField {
    name: String,
    alternates: Vec<String>,
    member: MemberDecl,
    declared_class: ClassRef,
    adapter: Arc<dyn TypeAdapter>,
    serialized: bool,
    deserialized: bool,
}

/// `signature` and its resolved superclasses, most derived first.
fn class_levels(
    signature: &TypeSignature,
    descriptor: &Arc<ClassDescriptor>,
    context: &FactoryContext<'_>,
) -> Result<Vec<(TypeSignature, Arc<ClassDescriptor>)>> {
    let resolver = context.resolver();
    let mut levels = vec![(signature.clone(), descriptor.clone())];
    while levels.len() < MAX_SUPERCLASS_DEPTH {
        let Some((current, class)) = levels.last() else {
            break;
        };
        let Some(superclass) = class.superclass() else {
            break;
        };
        let resolved = resolver.resolve(current, superclass)?;
        let Some(next) = resolved.raw_class().and_then(|raw| context.catalog().get(raw)) else {
            break;
        };
        if next.name().is_object() {
            break;
        }
        let next = next.clone();
        levels.push((resolved, next));
    }
    Ok(levels)
}

fn bind_fields(
    signature: &TypeSignature,
    descriptor: &Arc<ClassDescriptor>,
    context: &FactoryContext<'_>,
) -> Result<OrderedMap<String, Arc<BoundField>>> {
    let resolver = context.resolver();
    let policy = context.policy();
    let levels = class_levels(signature, descriptor, context)?;

    // Most derived declaration of each name wins.
    let mut seen = HashSet::new();
    let visible: Vec<Vec<&MemberDecl>> = levels
        .iter()
        .map(|(_, class)| {
            class
                .members()
                .iter()
                .filter(|member| seen.insert(member.name().to_string()))
                .collect()
        })
        .collect();

    let mut fields: OrderedMap<String, Arc<BoundField>> = OrderedMap::new();
    let mut input_names = HashSet::new();
    for ((declaring, _), members) in levels.iter().zip(&visible).rev() {
        for &member in members {
            let snapshot = member.descriptor(declaring);
            let declared = resolver.resolve(declaring, member.declared())?;
            let declared_class = resolver.erasure(&declared);
            let class_excluded = |deserialize| {
                context
                    .catalog()
                    .get(&declared_class)
                    .is_some_and(|class| policy.excludes_class(class, deserialize))
            };
            let serialized = !policy.excludes_member(&snapshot, false) && !class_excluded(false);
            let deserialized = !policy.excludes_member(&snapshot, true) && !class_excluded(true);
            if !serialized && !deserialized {
                trace!(member = %snapshot.name, declaring = %declaring, "member excluded");
                continue;
            }

            let (name, alternates) = match &snapshot.serialized_name {
                Some(marker) => (marker.value.clone(), marker.alternates.clone()),
                None => (context.naming().translate_name(&snapshot), Vec::new()),
            };
            for input in std::iter::once(&name).chain(&alternates) {
                if !input_names.insert(input.clone()) {
                    return Err(Error::DuplicateMember {
                        type_name: signature.to_string(),
                        name: input.clone(),
                    });
                }
            }

            let adapter = context.adapter(&declared)?;
            fields.insert(
                name.clone(),
                Arc::new(BoundField {
                    name,
                    alternates,
                    member: member.clone(),
                    declared_class,
                    adapter,
                    serialized,
                    deserialized,
                }),
            );
        }
    }
    Ok(fields)
}

struct ReflectiveAdapter {
    type_name: String,
    type_id: Option<TypeId>,
    fields: OrderedMap<String, Arc<BoundField>>,
    constructor: Result<Constructor>,
    registry: Weak<Registry>,
}

impl ReflectiveAdapter {
    fn field_named(&self, name: &str) -> Option<&Arc<BoundField>> {
        self.fields
            .get(name)
            .or_else(|| self.fields.values().find(|field| field.alternates.iter().any(|a| a == name)))
    }

    /// Picks the adapter for a member value whose runtime class may be more
    /// specific than the declared one.
    fn runtime_adapter(&self, field: &BoundField, value: &dyn Any) -> Result<Arc<dyn TypeAdapter>> {
        let Some(registry) = self.registry.upgrade() else {
            return Ok(field.adapter.clone());
        };
        let runtime = match registry.catalog().class_of_value(value) {
            Some(class) if *class != field.declared_class => class.clone(),
            _ => return Ok(field.adapter.clone()),
        };
        let runtime_adapter = registry.get(&TypeSignature::Class(runtime))?;
        if !runtime_adapter.is_reflective() || field.adapter.is_reflective() {
            Ok(runtime_adapter)
        } else {
            Ok(field.adapter.clone())
        }
    }
}

impl TypeAdapter for ReflectiveAdapter {
    fn write(&self, out: &mut dyn TokenWriter, value: Option<&dyn Any>) -> Result<()> {
        let Some(host) = value else {
            return out.null_value();
        };
        if self.type_id.is_some_and(|id| id != host.type_id()) {
            return Err(Error::malformed(&self.type_name, "a value of another type", "$"));
        }
        out.begin_object()?;
        for field in self.fields.values().filter(|field| field.serialized) {
            out.name(&field.name)?;
            match field.member.get(host) {
                Some(member) => self.runtime_adapter(field, member)?.write(out, Some(member))?,
                None => field.adapter.write(out, None)?,
            }
        }
        out.end_object()
    }

    fn read(&self, reader: &mut dyn TokenReader) -> Result<Option<AnyValue>> {
        let constructor = self.constructor.as_ref().map_err(Clone::clone)?;
        let mut instance = constructor();
        reader.begin_object()?;
        while reader.has_next()? {
            let name = reader.next_name()?;
            match self.field_named(&name) {
                Some(field) if field.deserialized => {
                    let value = field.adapter.read(reader)?;
                    field.member.set(instance.as_mut(), value)?;
                }
                _ => reader.skip_value()?,
            }
        }
        reader.end_object()?;
        Ok(Some(instance))
    }

    fn is_reflective(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{ClassDescriptor, MemberDecl, Modifiers};
    use crate::{Binder, Error, FieldNamingPolicy, TypeSignature};

    #[derive(Debug, Default, PartialEq)]
    struct Base {
        id: i64,
        note: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Derived {
        base: Base,
        note: String,
        secret: String,
    }

    fn binder() -> Binder {
        Binder::builder()
            .register_class(
                ClassDescriptor::builder("Base")
                    .constructor(Base::default)
                    .field("id", TypeSignature::class("i64"), |b: &Base| &b.id, |b: &mut Base, v| b.id = v)
                    .field("note", TypeSignature::string(), |b: &Base| &b.note, |b: &mut Base, v| b.note = v)
                    .build(),
            )
            .register_class(
                ClassDescriptor::builder("Derived")
                    .extends(TypeSignature::class("Base"))
                    .constructor(Derived::default)
                    .field("id", TypeSignature::class("i64"), |d: &Derived| &d.base.id, |d: &mut Derived, v| d.base.id = v)
                    .field("note", TypeSignature::string(), |d: &Derived| &d.note, |d: &mut Derived, v| d.note = v)
                    .member(
                        MemberDecl::field("secret", TypeSignature::string(), |d: &Derived| &d.secret, |d: &mut Derived, v| d.secret = v)
                            .with_modifiers(Modifiers::TRANSIENT),
                    )
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_shadowing_keeps_most_derived() {
        let binder = binder();
        let value = Derived {
            base: Base { id: 1, note: "base".into() },
            note: "derived".into(),
            secret: "hidden".into(),
        };
        let json = binder.to_json(Some(&value), &TypeSignature::class("Derived")).unwrap();
        assert_eq!(json, r#"{"id":1,"note":"derived"}"#);
    }

    #[test]
    fn test_read_ignores_transient_and_unknown() {
        let binder = binder();
        let back: Option<Derived> = binder
            .from_json_as(r#"{"secret":"x","note":"n","other":{"deep":[1]}}"#, &TypeSignature::class("Derived"))
            .unwrap();
        let back = back.unwrap();
        assert_eq!(back.note, "n");
        assert_eq!(back.secret, "");
    }

    #[test]
    fn test_duplicate_external_names() {
        #[derive(Default)]
        struct Clash {
            a: i32,
            b: i32,
        }
        let binder = Binder::builder()
            .register_class(
                ClassDescriptor::builder("Clash")
                    .constructor(Clash::default)
                    .member(
                        MemberDecl::field("a", TypeSignature::class("i32"), |c: &Clash| &c.a, |c: &mut Clash, v| c.a = v)
                            .with_serialized_name("x"),
                    )
                    .member(
                        MemberDecl::field("b", TypeSignature::class("i32"), |c: &Clash| &c.b, |c: &mut Clash, v| c.b = v)
                            .with_serialized_name("x"),
                    )
                    .build(),
            )
            .build();
        let err = binder.adapter(&TypeSignature::class("Clash")).err().unwrap();
        assert!(matches!(err, Error::DuplicateMember { ref name, .. } if name == "x"));
        let again = binder.adapter(&TypeSignature::class("Clash")).err().unwrap();
        assert_eq!(again, err);
    }

    #[test]
    fn test_naming_policy_and_alternates() {
        #[derive(Default, Debug, PartialEq)]
        struct Person {
            first_name: String,
            age: i32,
        }
        let binder = Binder::builder()
            .field_naming_policy(FieldNamingPolicy::LowerCaseWithUnderscores)
            .register_class(
                ClassDescriptor::builder("Person")
                    .constructor(Person::default)
                    .field("firstName", TypeSignature::string(), |p: &Person| &p.first_name, |p: &mut Person, v| p.first_name = v)
                    .member(
                        MemberDecl::field("age", TypeSignature::class("i32"), |p: &Person| &p.age, |p: &mut Person, v| p.age = v)
                            .with_serialized_name("years")
                            .with_alternate("yrs"),
                    )
                    .build(),
            )
            .build();
        let person = TypeSignature::class("Person");
        let json = binder
            .to_json(Some(&Person { first_name: "Ada".into(), age: 36 }), &person)
            .unwrap();
        assert_eq!(json, r#"{"first_name":"Ada","years":36}"#);

        let back: Option<Person> = binder.from_json_as(r#"{"yrs":40}"#, &person).unwrap();
        assert_eq!(back.map(|p| p.age), Some(40));
    }

    #[test]
    fn test_abstract_class_reads_fail_but_writes_work() {
        #[derive(Default)]
        struct Shape {
            sides: i32,
        }
        let binder = Binder::builder()
            .register_class(
                ClassDescriptor::builder("Shape")
                    .abstract_class()
                    .rust_type::<Shape>()
                    .field("sides", TypeSignature::class("i32"), |s: &Shape| &s.sides, |s: &mut Shape, v| s.sides = v)
                    .build(),
            )
            .build();
        let shape = TypeSignature::class("Shape");
        assert_eq!(binder.to_json(Some(&Shape { sides: 3 }), &shape).unwrap(), r#"{"sides":3}"#);
        let err = binder.from_json(r#"{"sides":3}"#, &shape).err().unwrap();
        assert!(matches!(err, Error::NoInstantiationStrategy { .. }));
    }

    #[test]
    fn test_unknown_class_has_no_adapter() {
        let err = Binder::new().adapter(&TypeSignature::class("Missing")).err().unwrap();
        assert!(matches!(err, Error::NoAdapter { .. }));
    }
}
