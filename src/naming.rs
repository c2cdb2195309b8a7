//! External member names.
//!
//! A member marked with a serialized name always uses it; every other member
//! is named by the binder's [`FieldNamingStrategy`], by default
//! [`FieldNamingPolicy::Identity`].

use crate::catalog::MemberDescriptor;

/// Maps a member to its external JSON name.
pub trait FieldNamingStrategy: Send + Sync {
    fn translate_name(&self, member: &MemberDescriptor) -> String;
}

impl<F> FieldNamingStrategy for F
where
    F: Fn(&MemberDescriptor) -> String + Send + Sync,
{
    fn translate_name(&self, member: &MemberDescriptor) -> String {
        self(member)
    }
}

/// Built-in naming conventions, applied to camel-case member names.
///
/// # Examples
///
/// ```rust
/// use jsonbind::FieldNamingPolicy;
///
/// assert_eq!(FieldNamingPolicy::UpperCamelCase.apply("someFieldName"), "SomeFieldName");
/// assert_eq!(FieldNamingPolicy::LowerCaseWithUnderscores.apply("someFieldName"), "some_field_name");
/// assert_eq!(FieldNamingPolicy::UpperCamelCaseWithSpaces.apply("someFieldName"), "Some Field Name");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNamingPolicy {
    /// The member name unchanged.
    #[default]
    Identity,
    /// `someFieldName` becomes `SomeFieldName`.
    UpperCamelCase,
    /// `someFieldName` becomes `Some Field Name`.
    UpperCamelCaseWithSpaces,
    /// `someFieldName` becomes `SOME_FIELD_NAME`.
    UpperCaseWithUnderscores,
    /// `someFieldName` becomes `some_field_name`.
    LowerCaseWithUnderscores,
    /// `someFieldName` becomes `some-field-name`.
    LowerCaseWithDashes,
    /// `someFieldName` becomes `some.field.name`.
    LowerCaseWithDots,
}

impl FieldNamingPolicy {
    /// Applies the convention to a raw member name.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            FieldNamingPolicy::Identity => name.to_string(),
            FieldNamingPolicy::UpperCamelCase => upper_case_first_letter(name),
            FieldNamingPolicy::UpperCamelCaseWithSpaces => {
                upper_case_first_letter(&separate_camel_case(name, ' '))
            }
            FieldNamingPolicy::UpperCaseWithUnderscores => separate_camel_case(name, '_').to_uppercase(),
            FieldNamingPolicy::LowerCaseWithUnderscores => separate_camel_case(name, '_').to_lowercase(),
            FieldNamingPolicy::LowerCaseWithDashes => separate_camel_case(name, '-').to_lowercase(),
            FieldNamingPolicy::LowerCaseWithDots => separate_camel_case(name, '.').to_lowercase(),
        }
    }
}

impl FieldNamingStrategy for FieldNamingPolicy {
    fn translate_name(&self, member: &MemberDescriptor) -> String {
        self.apply(&member.name)
    }
}

fn separate_camel_case(name: &str, separator: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() && !out.is_empty() {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Upper-cases the first letter, leaving any leading non-letters in place.
fn upper_case_first_letter(name: &str) -> String {
    match name.char_indices().find(|(_, ch)| ch.is_alphabetic()) {
        Some((index, ch)) if !ch.is_uppercase() => {
            let mut out = String::with_capacity(name.len());
            out.push_str(&name[..index]);
            out.extend(ch.to_uppercase());
            out.push_str(&name[index + ch.len_utf8()..]);
            out
        }
        _ => name.to_string(),
    }
}
