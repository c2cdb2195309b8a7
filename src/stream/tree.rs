//! Token streams over [`JsonValue`] trees.

use std::vec;

use crate::error::{Error, Result};
use crate::stream::{JsonPath, Token, TokenReader, TokenWriter};
use crate::value::{JsonObject, JsonValue, Number};

enum WriteFrame {
    Array(Vec<JsonValue>),
    Object {
        object: JsonObject,
        pending: Option<String>,
    },
}

/// Builds a [`JsonValue`] from writer calls.
///
/// # Examples
///
/// ```rust
/// use jsonbind::json;
/// use jsonbind::stream::{TokenWriter, TreeWriter};
///
/// let mut writer = TreeWriter::new();
/// writer.begin_object().unwrap();
/// writer.name("n").unwrap();
/// writer.i64_value(3).unwrap();
/// writer.end_object().unwrap();
/// assert_eq!(writer.finish().unwrap(), json!({"n": 3}));
/// ```
#[derive(Default)]
pub struct TreeWriter {
    stack: Vec<WriteFrame>,
    product: Option<JsonValue>,
    lenient: bool,
    serialize_nulls: bool,
}

impl TreeWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finished tree, or [`JsonValue::Null`] if nothing was written.
    pub fn finish(self) -> Result<JsonValue> {
        if !self.stack.is_empty() {
            return Err(Error::custom("Incomplete document"));
        }
        Ok(self.product.unwrap_or(JsonValue::Null))
    }

    fn expect_value_position(&self) -> Result<()> {
        match self.stack.last() {
            Some(WriteFrame::Object { pending: None, .. }) => {
                Err(Error::custom("Nesting problem: value without a name"))
            }
            None if self.product.is_some() => {
                Err(Error::custom("JSON must have only one top-level value"))
            }
            _ => Ok(()),
        }
    }

    fn put(&mut self, value: JsonValue) -> Result<()> {
        self.expect_value_position()?;
        match self.stack.last_mut() {
            None => self.product = Some(value),
            Some(WriteFrame::Array(items)) => items.push(value),
            Some(WriteFrame::Object { object, pending }) => {
                if let Some(name) = pending.take() {
                    if !value.is_null() || self.serialize_nulls {
                        object.insert(name, value);
                    }
                }
            }
        }
        Ok(())
    }
}

impl TokenWriter for TreeWriter {
    fn begin_array(&mut self) -> Result<()> {
        self.expect_value_position()?;
        self.stack.push(WriteFrame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(WriteFrame::Array(items)) => self.put(JsonValue::Array(items)),
            _ => Err(Error::custom("Nesting problem: mismatched close")),
        }
    }

    fn begin_object(&mut self) -> Result<()> {
        self.expect_value_position()?;
        self.stack.push(WriteFrame::Object {
            object: JsonObject::new(),
            pending: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(WriteFrame::Object {
                object,
                pending: None,
            }) => self.put(JsonValue::Object(object)),
            Some(WriteFrame::Object {
                pending: Some(name),
                ..
            }) => Err(Error::custom(format!("Dangling name: {name}"))),
            _ => Err(Error::custom("Nesting problem: mismatched close")),
        }
    }

    fn name(&mut self, name: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(WriteFrame::Object { pending, .. }) if pending.is_none() => {
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(Error::custom("Please begin an object before writing a name")),
        }
    }

    fn string_value(&mut self, value: &str) -> Result<()> {
        self.put(JsonValue::String(value.to_string()))
    }

    fn bool_value(&mut self, value: bool) -> Result<()> {
        self.put(JsonValue::Bool(value))
    }

    fn null_value(&mut self) -> Result<()> {
        self.put(JsonValue::Null)
    }

    fn i64_value(&mut self, value: i64) -> Result<()> {
        self.put(JsonValue::Number(Number::Integer(value)))
    }

    fn u64_value(&mut self, value: u64) -> Result<()> {
        let number = i64::try_from(value).map_or(Number::Float(value as f64), Number::Integer);
        self.put(JsonValue::Number(number))
    }

    fn f64_value(&mut self, value: f64) -> Result<()> {
        if !self.lenient && !value.is_finite() {
            return Err(Error::numeric_range(&super::writer::format_f64(value), "JSON number"));
        }
        self.put(JsonValue::Number(Number::Float(value)))
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

enum ReadFrame {
    Value(JsonValue),
    Array(vec::IntoIter<JsonValue>),
    Object(vec::IntoIter<(String, JsonValue)>),
}

fn token_of(value: &JsonValue) -> Token {
    match value {
        JsonValue::Null => Token::Null,
        JsonValue::Bool(_) => Token::Bool,
        JsonValue::Number(_) => Token::Number,
        JsonValue::String(_) => Token::String,
        JsonValue::Array(_) => Token::BeginArray,
        JsonValue::Object(_) => Token::BeginObject,
    }
}

/// Walks a [`JsonValue`] tree as a token stream.
///
/// Numbers are handed out through their display form, so a float tree
/// value such as `1.0` reads as the literal `"1.0"`.
///
/// # Examples
///
/// ```rust
/// use jsonbind::json;
/// use jsonbind::stream::{Token, TokenReader, TreeReader};
///
/// let mut reader = TreeReader::new(json!({"a": [true]}));
/// reader.begin_object().unwrap();
/// assert_eq!(reader.next_name().unwrap(), "a");
/// reader.begin_array().unwrap();
/// assert!(reader.next_bool().unwrap());
/// assert_eq!(reader.peek().unwrap(), Token::EndArray);
/// ```
pub struct TreeReader {
    stack: Vec<ReadFrame>,
    path: JsonPath,
    lenient: bool,
}

impl TreeReader {
    #[must_use]
    pub fn new(root: JsonValue) -> Self {
        TreeReader {
            stack: vec![ReadFrame::Value(root)],
            path: JsonPath::default(),
            lenient: false,
        }
    }

    fn take_value(&mut self, expected: Token) -> Result<JsonValue> {
        let found = self.peek()?;
        if found != expected {
            return Err(self.unexpected(&expected, found));
        }
        let value = match self.stack.last_mut() {
            Some(ReadFrame::Array(items)) => items.next(),
            Some(ReadFrame::Value(_)) => match self.stack.pop() {
                Some(ReadFrame::Value(value)) => Some(value),
                _ => None,
            },
            _ => None,
        };
        value.ok_or_else(|| self.unexpected(&expected, found))
    }

    fn take_scalar(&mut self, expected: Token) -> Result<JsonValue> {
        let value = self.take_value(expected)?;
        self.path.value_consumed();
        Ok(value)
    }

    fn close(&mut self, expected: Token) -> Result<()> {
        let found = self.peek()?;
        if found != expected {
            return Err(self.unexpected(&expected, found));
        }
        self.stack.pop();
        self.path.exit();
        Ok(())
    }
}

impl TokenReader for TreeReader {
    fn peek(&mut self) -> Result<Token> {
        Ok(match self.stack.last() {
            None => Token::EndDocument,
            Some(ReadFrame::Value(value)) => token_of(value),
            Some(ReadFrame::Array(items)) => {
                items.as_slice().first().map_or(Token::EndArray, token_of)
            }
            Some(ReadFrame::Object(members)) => {
                if members.as_slice().is_empty() {
                    Token::EndObject
                } else {
                    Token::Name
                }
            }
        })
    }

    fn begin_array(&mut self) -> Result<()> {
        match self.take_value(Token::BeginArray)? {
            JsonValue::Array(items) => {
                self.stack.push(ReadFrame::Array(items.into_iter()));
                self.path.enter_array();
                Ok(())
            }
            other => Err(self.unexpected(&Token::BeginArray, token_of(&other))),
        }
    }

    fn end_array(&mut self) -> Result<()> {
        self.close(Token::EndArray)
    }

    fn begin_object(&mut self) -> Result<()> {
        match self.take_value(Token::BeginObject)? {
            JsonValue::Object(object) => {
                self.stack.push(ReadFrame::Object(object.into_iter()));
                self.path.enter_object();
                Ok(())
            }
            other => Err(self.unexpected(&Token::BeginObject, token_of(&other))),
        }
    }

    fn end_object(&mut self) -> Result<()> {
        self.close(Token::EndObject)
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(!matches!(
            self.peek()?,
            Token::EndArray | Token::EndObject | Token::EndDocument
        ))
    }

    fn next_name(&mut self) -> Result<String> {
        let found = self.peek()?;
        let member = match self.stack.last_mut() {
            Some(ReadFrame::Object(members)) => members.next(),
            _ => None,
        };
        match member {
            Some((name, value)) => {
                self.path.set_name(&name);
                self.stack.push(ReadFrame::Value(value));
                Ok(name)
            }
            None => Err(self.unexpected(&Token::Name, found)),
        }
    }

    fn next_string(&mut self) -> Result<String> {
        let expected = match self.peek()? {
            Token::Number => Token::Number,
            _ => Token::String,
        };
        match self.take_scalar(expected)? {
            JsonValue::String(s) => Ok(s),
            JsonValue::Number(n) => Ok(n.to_string()),
            other => Err(self.unexpected(&Token::String, token_of(&other))),
        }
    }

    fn next_number(&mut self) -> Result<String> {
        let found = self.peek()?;
        let numeric_string = match self.stack.last() {
            Some(ReadFrame::Value(JsonValue::String(s))) => Number::parse(s).is_some(),
            Some(ReadFrame::Array(items)) => matches!(
                items.as_slice().first(),
                Some(JsonValue::String(s)) if Number::parse(s).is_some()
            ),
            _ => false,
        };
        let expected = if numeric_string { Token::String } else { Token::Number };
        match self.take_scalar(expected)? {
            JsonValue::Number(n) => Ok(n.to_string()),
            JsonValue::String(s) => Ok(s),
            _ => Err(self.unexpected(&Token::Number, found)),
        }
    }

    fn next_bool(&mut self) -> Result<bool> {
        match self.take_scalar(Token::Bool)? {
            JsonValue::Bool(b) => Ok(b),
            other => Err(self.unexpected(&Token::Bool, token_of(&other))),
        }
    }

    fn next_null(&mut self) -> Result<()> {
        self.take_scalar(Token::Null).map(|_| ())
    }

    fn path(&self) -> String {
        self.path.render()
    }

    fn is_lenient(&self) -> bool {
        self.lenient
    }

    fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json;
    use crate::stream::{read_tree, write_tree};

    #[test]
    fn test_tree_round_trip() {
        let value = json!({"a": [1, 2.5, "s", null, {"b": false}], "c": {}});
        let mut reader = TreeReader::new(value.clone());
        let copy = read_tree(&mut reader).unwrap();
        assert_eq!(reader.peek().unwrap(), Token::EndDocument);
        assert_eq!(copy, value);

        let mut writer = TreeWriter::new();
        writer.set_serialize_nulls(true);
        write_tree(&mut writer, &value).unwrap();
        assert_eq!(writer.finish().unwrap(), value);
    }

    #[test]
    fn test_writer_drops_null_members() {
        let mut writer = TreeWriter::new();
        writer.begin_object().unwrap();
        writer.name("gone").unwrap();
        writer.null_value().unwrap();
        writer.name("kept").unwrap();
        writer.begin_array().unwrap();
        writer.null_value().unwrap();
        writer.end_array().unwrap();
        writer.end_object().unwrap();
        assert_eq!(writer.finish().unwrap(), json!({"kept": [null]}));
    }

    #[test]
    fn test_writer_empty_and_incomplete() {
        assert_eq!(TreeWriter::new().finish().unwrap(), JsonValue::Null);
        let mut writer = TreeWriter::new();
        writer.begin_array().unwrap();
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_float_reads_as_literal() {
        let mut reader = TreeReader::new(json!([1.0, "7"]));
        reader.begin_array().unwrap();
        assert_eq!(reader.next_number().unwrap(), "1.0");
        assert_eq!(reader.next_number().unwrap(), "7");
        assert_eq!(reader.path(), "$[2]");
    }

    #[test]
    fn test_skip_and_mismatch() {
        let mut reader = TreeReader::new(json!({"x": {"deep": [1]}, "y": 2}));
        reader.begin_object().unwrap();
        reader.next_name().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.next_name().unwrap(), "y");
        assert!(matches!(reader.next_bool(), Err(Error::Malformed { .. })));
    }
}
