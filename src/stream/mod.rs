//! Token-level JSON streams.
//!
//! Adapters never see text or trees directly. They drive a [`TokenWriter`] or
//! pull from a [`TokenReader`], so one adapter serves both representations:
//!
//! - [`JsonReader`] / [`JsonWriter`] tokenize and emit JSON text
//! - [`TreeReader`] / [`TreeWriter`] walk and build a [`JsonValue`] tree
//! - [`JsonDocuments`] splits a stream of several documents
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::stream::{JsonReader, JsonWriter, Token, TokenReader, TokenWriter};
//!
//! let mut reader = JsonReader::new(r#"{"a": [1, true]}"#);
//! reader.begin_object().unwrap();
//! assert_eq!(reader.next_name().unwrap(), "a");
//! reader.begin_array().unwrap();
//! assert_eq!(reader.next_number().unwrap(), "1");
//! assert_eq!(reader.peek().unwrap(), Token::Bool);
//! assert_eq!(reader.path(), "$.a[1]");
//!
//! let mut writer = JsonWriter::new();
//! writer.begin_array().unwrap();
//! writer.string_value("x").unwrap();
//! writer.end_array().unwrap();
//! assert_eq!(writer.finish().unwrap(), r#"["x"]"#);
//! ```

pub mod documents;
pub mod reader;
pub mod tree;
pub mod writer;

pub use documents::JsonDocuments;
pub use reader::{JsonReader, DEFAULT_NESTING_LIMIT};
pub use tree::{TreeReader, TreeWriter};
pub use writer::JsonWriter;

use std::fmt;

use crate::error::{Error, Result};
use crate::value::{JsonValue, Number};

/// The kind of the next token in a [`TokenReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name,
    String,
    Number,
    Bool,
    Null,
    EndDocument,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Token::BeginArray => "BEGIN_ARRAY",
            Token::EndArray => "END_ARRAY",
            Token::BeginObject => "BEGIN_OBJECT",
            Token::EndObject => "END_OBJECT",
            Token::Name => "NAME",
            Token::String => "STRING",
            Token::Number => "NUMBER",
            Token::Bool => "BOOLEAN",
            Token::Null => "NULL",
            Token::EndDocument => "END_DOCUMENT",
        })
    }
}

/// A pull-based source of JSON tokens.
pub trait TokenReader {
    /// Returns the kind of the next token without consuming it.
    fn peek(&mut self) -> Result<Token>;
    fn begin_array(&mut self) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;
    fn begin_object(&mut self) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;
    /// Returns `true` if the current array or object has another element.
    fn has_next(&mut self) -> Result<bool>;
    fn next_name(&mut self) -> Result<String>;
    /// Consumes a string, or a number as its literal text.
    fn next_string(&mut self) -> Result<String>;
    /// Consumes a number and returns its literal text. A string holding a
    /// number literal is accepted as well.
    fn next_number(&mut self) -> Result<String>;
    fn next_bool(&mut self) -> Result<bool>;
    fn next_null(&mut self) -> Result<()>;
    /// The `$.a[0]`-style location of the reader.
    fn path(&self) -> String;
    fn is_lenient(&self) -> bool;
    fn set_lenient(&mut self, lenient: bool);

    /// Consumes the next value, recursively for arrays and objects. On a
    /// name, only the name is consumed.
    fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                Token::BeginArray => {
                    self.begin_array()?;
                    depth += 1;
                }
                Token::BeginObject => {
                    self.begin_object()?;
                    depth += 1;
                }
                token @ (Token::EndArray | Token::EndObject) => {
                    if depth == 0 {
                        return Err(self.unexpected(&"a value", token));
                    }
                    if token == Token::EndArray {
                        self.end_array()?;
                    } else {
                        self.end_object()?;
                    }
                    depth -= 1;
                }
                Token::Name => {
                    self.next_name()?;
                }
                Token::String | Token::Number => {
                    self.next_string()?;
                }
                Token::Bool => {
                    self.next_bool()?;
                }
                Token::Null => self.next_null()?,
                Token::EndDocument => {
                    return Err(self.unexpected(&"a value", Token::EndDocument));
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Builds a [`Error::Malformed`] for the current position.
    fn unexpected(&self, expected: &dyn fmt::Display, found: Token) -> Error {
        Error::malformed(expected, found, &self.path())
    }
}

/// A push-based sink of JSON tokens.
///
/// A name followed by a null value is dropped entirely unless
/// [`serialize_nulls`](TokenWriter::serialize_nulls) is set.
pub trait TokenWriter {
    fn begin_array(&mut self) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;
    fn begin_object(&mut self) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;
    fn name(&mut self, name: &str) -> Result<()>;
    fn string_value(&mut self, value: &str) -> Result<()>;
    fn bool_value(&mut self, value: bool) -> Result<()>;
    fn null_value(&mut self) -> Result<()>;
    fn i64_value(&mut self, value: i64) -> Result<()>;
    fn u64_value(&mut self, value: u64) -> Result<()>;
    /// Writes a float. NaN and infinities require a lenient writer.
    fn f64_value(&mut self, value: f64) -> Result<()>;
    fn is_lenient(&self) -> bool;
    fn set_lenient(&mut self, lenient: bool);
    fn serialize_nulls(&self) -> bool;
    fn set_serialize_nulls(&mut self, serialize_nulls: bool);

    fn number_value(&mut self, number: &Number) -> Result<()> {
        match *number {
            Number::Integer(i) => self.i64_value(i),
            Number::Float(f) => self.f64_value(f),
        }
    }
}

/// Writes a whole [`JsonValue`] tree to `writer`.
pub fn write_tree(writer: &mut dyn TokenWriter, value: &JsonValue) -> Result<()> {
    match value {
        JsonValue::Null => writer.null_value(),
        JsonValue::Bool(b) => writer.bool_value(*b),
        JsonValue::Number(n) => writer.number_value(n),
        JsonValue::String(s) => writer.string_value(s),
        JsonValue::Array(items) => {
            writer.begin_array()?;
            for item in items {
                write_tree(writer, item)?;
            }
            writer.end_array()
        }
        JsonValue::Object(object) => {
            writer.begin_object()?;
            for (name, item) in object {
                writer.name(name)?;
                write_tree(writer, item)?;
            }
            writer.end_object()
        }
    }
}

/// Reads one whole value from `reader` into a [`JsonValue`] tree.
///
/// Integral number literals become [`Number::Integer`] when they fit an `i64`,
/// everything else becomes [`Number::Float`].
pub fn read_tree(reader: &mut dyn TokenReader) -> Result<JsonValue> {
    match reader.peek()? {
        Token::BeginArray => {
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(read_tree(reader)?);
            }
            reader.end_array()?;
            Ok(JsonValue::Array(items))
        }
        Token::BeginObject => {
            reader.begin_object()?;
            let mut object = crate::value::JsonObject::new();
            while reader.has_next()? {
                let name = reader.next_name()?;
                let value = read_tree(reader)?;
                object.insert(name, value);
            }
            reader.end_object()?;
            Ok(JsonValue::Object(object))
        }
        Token::String => reader.next_string().map(JsonValue::String),
        Token::Number => {
            let literal = reader.next_number()?;
            Number::parse(&literal)
                .map(JsonValue::Number)
                .ok_or_else(|| Error::numeric_range(&literal, "number"))
        }
        Token::Bool => reader.next_bool().map(JsonValue::Bool),
        Token::Null => reader.next_null().map(|()| JsonValue::Null),
        token => Err(reader.unexpected(&"a value", token)),
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Index(usize),
    Name(Option<String>),
}

/// Location bookkeeping shared by the readers.
#[derive(Debug, Clone, Default)]
pub(crate) struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub(crate) fn enter_array(&mut self) {
        self.segments.push(Segment::Index(0));
    }

    pub(crate) fn enter_object(&mut self) {
        self.segments.push(Segment::Name(None));
    }

    pub(crate) fn exit(&mut self) {
        self.segments.pop();
        self.value_consumed();
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        if let Some(Segment::Name(slot)) = self.segments.last_mut() {
            *slot = Some(name.to_string());
        }
    }

    pub(crate) fn value_consumed(&mut self) {
        if let Some(Segment::Index(index)) = self.segments.last_mut() {
            *index += 1;
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut path = String::from("$");
        for segment in &self.segments {
            match segment {
                Segment::Index(index) => path.push_str(&format!("[{index}]")),
                Segment::Name(Some(name)) => {
                    path.push('.');
                    path.push_str(name);
                }
                Segment::Name(None) => path.push('.'),
            }
        }
        path
    }
}
