//! Several JSON documents in one input.

use crate::error::Result;
use crate::stream::{read_tree, JsonReader, Token, TokenReader};
use crate::value::JsonValue;

/// Reads consecutive top-level values as [`JsonValue`] trees.
///
/// The underlying reader is always lenient, since more than one top-level
/// value is itself a lenient extension. Iteration stops after the first
/// error.
///
/// # Examples
///
/// ```rust
/// use jsonbind::json;
/// use jsonbind::stream::{JsonDocuments, JsonReader};
///
/// let mut documents = JsonDocuments::new(JsonReader::new("{\"a\":1}\n[2]"));
/// assert_eq!(documents.next(), Some(Ok(json!({"a": 1}))));
/// assert_eq!(documents.next(), Some(Ok(json!([2]))));
/// assert_eq!(documents.next(), None);
/// ```
#[derive(Debug)]
pub struct JsonDocuments<'a> {
    reader: JsonReader<'a>,
    done: bool,
}

impl<'a> JsonDocuments<'a> {
    #[must_use]
    pub fn new(mut reader: JsonReader<'a>) -> Self {
        reader.set_lenient(true);
        let done = reader.is_exhausted();
        JsonDocuments { reader, done }
    }

    /// Returns `true` if another document follows. Never consumes input
    /// beyond the next token.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        Ok(self.reader.peek()? != Token::EndDocument)
    }
}

impl Iterator for JsonDocuments<'_> {
    type Item = Result<JsonValue>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let value = read_tree(&mut self.reader);
                self.done = value.is_err();
                Some(value)
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
