//! JSON text writer.

use crate::error::{Error, Result};
use crate::stream::TokenWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonEmptyDocument,
    EmptyArray,
    NonEmptyArray,
    EmptyObject,
    DanglingName,
    NonEmptyObject,
}

/// Formats a float the way the writer emits it: always with a fraction or
/// exponent, and `NaN`, `Infinity`, `-Infinity` for the special values.
#[must_use]
pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value:?}")
    }
}

/// Appends `value` to `out` as a quoted, escaped JSON string.
pub fn write_escaped(out: &mut String, value: &str) {
    escape_into(out, value, false);
}

fn escape_into(out: &mut String, value: &str, html_safe: bool) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '<' | '>' | '&' | '=' | '\'' if html_safe => out.push_str(&format!("\\u{:04x}", ch as u32)),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Writes JSON text into an in-memory buffer.
///
/// # Examples
///
/// ```rust
/// use jsonbind::stream::{JsonWriter, TokenWriter};
///
/// let mut writer = JsonWriter::pretty("  ");
/// writer.begin_object().unwrap();
/// writer.name("a").unwrap();
/// writer.i64_value(1).unwrap();
/// writer.name("skipped").unwrap();
/// writer.null_value().unwrap();
/// writer.end_object().unwrap();
/// assert_eq!(writer.finish().unwrap(), "{\n  \"a\": 1\n}");
/// ```
#[derive(Debug, Clone)]
pub struct JsonWriter {
    out: String,
    stack: Vec<Scope>,
    deferred_name: Option<String>,
    indent: Option<String>,
    lenient: bool,
    serialize_nulls: bool,
    html_safe: bool,
}

impl JsonWriter {
    /// Creates a compact writer.
    #[must_use]
    pub fn new() -> Self {
        JsonWriter {
            out: String::new(),
            stack: vec![Scope::EmptyDocument],
            deferred_name: None,
            indent: None,
            lenient: false,
            serialize_nulls: false,
            html_safe: false,
        }
    }

    /// Creates a writer that puts each element on its own line.
    #[must_use]
    pub fn pretty(indent: impl Into<String>) -> Self {
        JsonWriter {
            indent: Some(indent.into()),
            ..JsonWriter::new()
        }
    }

    #[must_use]
    pub fn is_html_safe(&self) -> bool {
        self.html_safe
    }

    /// Escapes `<`, `>`, `&`, `=` and `'` as `\uXXXX` so the output can be
    /// embedded in HTML.
    pub fn set_html_safe(&mut self, html_safe: bool) {
        self.html_safe = html_safe;
    }

    /// Returns the text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Returns the document, failing if it is incomplete.
    pub fn finish(self) -> Result<String> {
        if self.stack.len() != 1 || self.stack[0] != Scope::NonEmptyDocument {
            return Err(Error::custom("Incomplete document"));
        }
        Ok(self.out)
    }

    fn top(&self) -> Result<Scope> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| Error::custom("JsonWriter is closed"))
    }

    fn replace_top(&mut self, scope: Scope) {
        if let Some(top) = self.stack.last_mut() {
            *top = scope;
        }
    }

    fn newline(&mut self) {
        if let Some(indent) = &self.indent {
            self.out.push('\n');
            for _ in 1..self.stack.len() {
                self.out.push_str(indent);
            }
        }
    }

    fn write_deferred_name(&mut self) -> Result<()> {
        if let Some(name) = self.deferred_name.take() {
            match self.top()? {
                Scope::NonEmptyObject => self.out.push(','),
                Scope::EmptyObject => {}
                _ => return Err(Error::custom("Nesting problem: name outside of an object")),
            }
            self.newline();
            self.replace_top(Scope::DanglingName);
            escape_into(&mut self.out, &name, self.html_safe);
        }
        Ok(())
    }

    fn before_value(&mut self) -> Result<()> {
        match self.top()? {
            Scope::NonEmptyDocument => {
                if !self.lenient {
                    return Err(Error::custom("JSON must have only one top-level value"));
                }
            }
            Scope::EmptyDocument => self.replace_top(Scope::NonEmptyDocument),
            Scope::EmptyArray => {
                self.replace_top(Scope::NonEmptyArray);
                self.newline();
            }
            Scope::NonEmptyArray => {
                self.out.push(',');
                self.newline();
            }
            Scope::DanglingName => {
                self.out.push_str(if self.indent.is_some() { ": " } else { ":" });
                self.replace_top(Scope::NonEmptyObject);
            }
            Scope::EmptyObject | Scope::NonEmptyObject => {
                return Err(Error::custom("Nesting problem: value without a name"));
            }
        }
        Ok(())
    }

    fn open(&mut self, empty: Scope, bracket: char) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        self.stack.push(empty);
        self.out.push(bracket);
        Ok(())
    }

    fn close(&mut self, empty: Scope, non_empty: Scope, bracket: char) -> Result<()> {
        let context = self.top()?;
        if context != empty && context != non_empty {
            return Err(Error::custom("Nesting problem: mismatched close"));
        }
        if let Some(name) = &self.deferred_name {
            return Err(Error::custom(format!("Dangling name: {name}")));
        }
        self.stack.pop();
        if context == non_empty {
            self.newline();
        }
        self.out.push(bracket);
        Ok(())
    }

    fn raw_value(&mut self, text: &str) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        self.out.push_str(text);
        Ok(())
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenWriter for JsonWriter {
    fn begin_array(&mut self) -> Result<()> {
        self.open(Scope::EmptyArray, '[')
    }

    fn end_array(&mut self) -> Result<()> {
        self.close(Scope::EmptyArray, Scope::NonEmptyArray, ']')
    }

    fn begin_object(&mut self) -> Result<()> {
        self.open(Scope::EmptyObject, '{')
    }

    fn end_object(&mut self) -> Result<()> {
        self.close(Scope::EmptyObject, Scope::NonEmptyObject, '}')
    }

    fn name(&mut self, name: &str) -> Result<()> {
        if self.deferred_name.is_some() {
            return Err(Error::custom("Already wrote a name, expecting a value"));
        }
        match self.top()? {
            Scope::EmptyObject | Scope::NonEmptyObject => {
                self.deferred_name = Some(name.to_string());
                Ok(())
            }
            _ => Err(Error::custom("Please begin an object before writing a name")),
        }
    }

    fn string_value(&mut self, value: &str) -> Result<()> {
        self.write_deferred_name()?;
        self.before_value()?;
        escape_into(&mut self.out, value, self.html_safe);
        Ok(())
    }

    fn bool_value(&mut self, value: bool) -> Result<()> {
        self.raw_value(if value { "true" } else { "false" })
    }

    fn null_value(&mut self) -> Result<()> {
        if self.deferred_name.is_some() && !self.serialize_nulls {
            self.deferred_name = None;
            return Ok(());
        }
        self.raw_value("null")
    }

    fn i64_value(&mut self, value: i64) -> Result<()> {
        self.raw_value(&value.to_string())
    }

    fn u64_value(&mut self, value: u64) -> Result<()> {
        self.raw_value(&value.to_string())
    }

    fn f64_value(&mut self, value: f64) -> Result<()> {
        if !self.lenient && !value.is_finite() {
            return Err(Error::numeric_range(&format_f64(value), "JSON number"));
        }
        self.raw_value(&format_f64(value))
    }

    fn is_lenient(&self) -> bool {
        self.lenient
    }

    fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    fn serialize_nulls(&self) -> bool {
        self.serialize_nulls
    }

    fn set_serialize_nulls(&mut self, serialize_nulls: bool) {
        self.serialize_nulls = serialize_nulls;
    }
}
