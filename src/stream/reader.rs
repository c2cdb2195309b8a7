//! JSON text tokenizer.
//!
//! [`JsonReader`] is a pull parser with one token of lookahead. In strict
//! mode it accepts RFC 8259 JSON only. Lenient mode additionally accepts:
//!
//! - unquoted and single-quoted names and strings
//! - `;` between elements and `=` or `=>` between name and value
//! - `//`, `#` and `/* */` comments
//! - the `)]}'` non-execute prefix
//! - `NaN`, `Infinity` and `-Infinity` as unquoted values
//! - several top-level values, and `[1,,2]` style implicit nulls

use crate::error::{Error, Result};
use crate::stream::{JsonPath, Token, TokenReader};

const NON_EXECUTE_PREFIX: &str = ")]}'";

/// Arrays and objects nested deeper than this fail with a syntax error.
pub const DEFAULT_NESTING_LIMIT: usize = 255;

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

#[derive(Debug, Clone, PartialEq)]
enum Peeked {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name(String),
    String(String),
    Number(String),
    True,
    False,
    Null,
    EndDocument,
}

impl Peeked {
    fn token(&self) -> Token {
        match self {
            Peeked::BeginArray => Token::BeginArray,
            Peeked::EndArray => Token::EndArray,
            Peeked::BeginObject => Token::BeginObject,
            Peeked::EndObject => Token::EndObject,
            Peeked::Name(_) => Token::Name,
            Peeked::String(_) => Token::String,
            Peeked::Number(_) => Token::Number,
            Peeked::True | Peeked::False => Token::Bool,
            Peeked::Null => Token::Null,
            Peeked::EndDocument => Token::EndDocument,
        }
    }
}

/// Reads JSON tokens from a string slice.
///
/// # Examples
///
/// ```rust
/// use jsonbind::stream::{JsonReader, Token, TokenReader};
///
/// let mut reader = JsonReader::new("{name: 'ada', tags: [1,,2]}");
/// reader.set_lenient(true);
/// reader.begin_object().unwrap();
/// assert_eq!(reader.next_name().unwrap(), "name");
/// assert_eq!(reader.next_string().unwrap(), "ada");
/// assert_eq!(reader.next_name().unwrap(), "tags");
/// reader.begin_array().unwrap();
/// assert_eq!(reader.next_number().unwrap(), "1");
/// assert_eq!(reader.peek().unwrap(), Token::Null);
/// ```
#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    stack: Vec<Scope>,
    peeked: Option<Peeked>,
    path: JsonPath,
    lenient: bool,
    nesting_limit: usize,
}

impl<'a> JsonReader<'a> {
    /// Creates a strict reader over `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        JsonReader {
            input,
            position: 0,
            line: 1,
            column: 1,
            stack: vec![Scope::EmptyDocument],
            peeked: None,
            path: JsonPath::default(),
            lenient: false,
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }

    #[must_use]
    pub fn nesting_limit(&self) -> usize {
        self.nesting_limit
    }

    /// Caps how deeply arrays and objects may nest. Opening one more
    /// container than `limit` fails with [`Error::Syntax`].
    pub fn set_nesting_limit(&mut self, limit: usize) {
        self.nesting_limit = limit;
    }

    fn push(&mut self, scope: Scope) -> Result<()> {
        // The bottom of the stack is the document itself.
        if self.stack.len() > self.nesting_limit {
            return Err(self.syntax_error(&format!("Nesting limit {} reached", self.nesting_limit)));
        }
        self.stack.push(scope);
        Ok(())
    }

    /// Fails unless the whole input has been consumed.
    pub fn finish(&mut self) -> Result<()> {
        match self.peek()? {
            Token::EndDocument => Ok(()),
            _ => Err(self.syntax_error("JSON document was not fully consumed")),
        }
    }

    /// Returns `true` if nothing but whitespace is left and no token is
    /// buffered.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.peeked.is_none() && self.rest().trim().is_empty()
    }

    fn syntax_error(&self, msg: &str) -> Error {
        Error::syntax(self.line, self.column, &self.path.render(), msg)
    }

    fn check_lenient(&self) -> Result<()> {
        if self.lenient {
            Ok(())
        } else {
            Err(self.syntax_error("Use lenient mode to accept malformed JSON"))
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_to_end_of_line(&mut self) {
        while let Some(ch) = self.next_char() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skips whitespace and comments and returns the next significant
    /// character without consuming it.
    fn next_non_whitespace(&mut self) -> Result<Option<char>> {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\n' | '\r') => {
                    self.next_char();
                }
                Some('#') => {
                    self.check_lenient()?;
                    self.skip_to_end_of_line();
                }
                Some('/') if self.rest().starts_with("//") => {
                    self.check_lenient()?;
                    self.skip_to_end_of_line();
                }
                Some('/') if self.rest().starts_with("/*") => {
                    self.check_lenient()?;
                    self.next_char();
                    self.next_char();
                    loop {
                        if self.rest().starts_with("*/") {
                            self.next_char();
                            self.next_char();
                            break;
                        }
                        if self.next_char().is_none() {
                            return Err(self.syntax_error("Unterminated comment"));
                        }
                    }
                }
                other => return Ok(other),
            }
        }
    }

    fn replace_top(&mut self, scope: Scope) {
        if let Some(top) = self.stack.last_mut() {
            *top = scope;
        }
    }

    fn peeked(&mut self) -> Result<&Peeked> {
        if self.peeked.is_none() {
            let next = self.do_peek()?;
            self.peeked = Some(next);
        }
        match &self.peeked {
            Some(peeked) => Ok(peeked),
            None => Err(self.syntax_error("Reader has no lookahead")),
        }
    }

    fn take_peeked(&mut self) -> Result<Peeked> {
        self.peeked()?;
        self.peeked
            .take()
            .ok_or_else(|| self.syntax_error("Reader has no lookahead"))
    }

    fn do_peek(&mut self) -> Result<Peeked> {
        let top = *self
            .stack
            .last()
            .ok_or_else(|| self.syntax_error("JsonReader is closed"))?;
        match top {
            Scope::EmptyArray => self.replace_top(Scope::NonEmptyArray),
            Scope::NonEmptyArray => match self.next_non_whitespace()? {
                Some(']') => {
                    self.next_char();
                    return Ok(Peeked::EndArray);
                }
                Some(';') => {
                    self.check_lenient()?;
                    self.next_char();
                }
                Some(',') => {
                    self.next_char();
                }
                _ => return Err(self.syntax_error("Unterminated array")),
            },
            Scope::EmptyObject | Scope::NonEmptyObject => {
                self.replace_top(Scope::DanglingName);
                if top == Scope::NonEmptyObject {
                    match self.next_non_whitespace()? {
                        Some('}') => {
                            self.next_char();
                            return Ok(Peeked::EndObject);
                        }
                        Some(';') => {
                            self.check_lenient()?;
                            self.next_char();
                        }
                        Some(',') => {
                            self.next_char();
                        }
                        _ => return Err(self.syntax_error("Unterminated object")),
                    }
                }
                return match self.next_non_whitespace()? {
                    Some('"') => self.read_quoted('"').map(Peeked::Name),
                    Some('\'') => {
                        self.check_lenient()?;
                        self.read_quoted('\'').map(Peeked::Name)
                    }
                    Some('}') if top == Scope::EmptyObject => {
                        self.next_char();
                        Ok(Peeked::EndObject)
                    }
                    Some(ch) if is_literal(ch) => {
                        self.check_lenient()?;
                        Ok(Peeked::Name(self.read_literal()))
                    }
                    _ => Err(self.syntax_error("Expected name")),
                };
            }
            Scope::DanglingName => {
                self.replace_top(Scope::NonEmptyObject);
                match self.next_non_whitespace()? {
                    Some(':') => {
                        self.next_char();
                    }
                    Some('=') => {
                        self.check_lenient()?;
                        self.next_char();
                        if self.peek_char() == Some('>') {
                            self.next_char();
                        }
                    }
                    _ => return Err(self.syntax_error("Expected ':'")),
                }
            }
            Scope::EmptyDocument => {
                if self.lenient {
                    self.consume_non_execute_prefix()?;
                }
                self.replace_top(Scope::NonEmptyDocument);
            }
            Scope::NonEmptyDocument => match self.next_non_whitespace()? {
                None => return Ok(Peeked::EndDocument),
                Some(_) => self.check_lenient()?,
            },
        }

        let in_array = matches!(top, Scope::EmptyArray | Scope::NonEmptyArray);
        match self.next_non_whitespace()? {
            None => Err(self.syntax_error("End of input")),
            Some(']') if top == Scope::EmptyArray => {
                self.next_char();
                Ok(Peeked::EndArray)
            }
            Some(']' | ';' | ',') if in_array => {
                self.check_lenient()?;
                Ok(Peeked::Null)
            }
            Some('\'') => {
                self.check_lenient()?;
                self.read_quoted('\'').map(Peeked::String)
            }
            Some('"') => self.read_quoted('"').map(Peeked::String),
            Some('[') => {
                self.next_char();
                Ok(Peeked::BeginArray)
            }
            Some('{') => {
                self.next_char();
                Ok(Peeked::BeginObject)
            }
            Some(ch) if is_literal(ch) => self.classify_literal(),
            Some(_) => Err(self.syntax_error("Expected value")),
        }
    }

    fn consume_non_execute_prefix(&mut self) -> Result<()> {
        self.next_non_whitespace()?;
        if self.rest().starts_with(NON_EXECUTE_PREFIX) {
            for _ in 0..NON_EXECUTE_PREFIX.len() {
                self.next_char();
            }
            if self.peek_char() == Some('\n') {
                self.next_char();
            }
        }
        Ok(())
    }

    fn classify_literal(&mut self) -> Result<Peeked> {
        let literal = self.read_literal();
        match literal.as_str() {
            "true" => return Ok(Peeked::True),
            "false" => return Ok(Peeked::False),
            "null" => return Ok(Peeked::Null),
            _ => {}
        }
        if is_number_literal(&literal) {
            return Ok(Peeked::Number(literal));
        }
        self.check_lenient()?;
        if literal.eq_ignore_ascii_case("true") {
            Ok(Peeked::True)
        } else if literal.eq_ignore_ascii_case("false") {
            Ok(Peeked::False)
        } else if literal.eq_ignore_ascii_case("null") {
            Ok(Peeked::Null)
        } else {
            Ok(Peeked::String(literal))
        }
    }

    fn read_literal(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if !is_literal(ch) {
                break;
            }
            self.next_char();
        }
        self.input[start..self.position].to_string()
    }

    fn read_quoted(&mut self, quote: char) -> Result<String> {
        self.next_char();
        let mut result = String::new();
        while let Some(ch) = self.next_char() {
            match ch {
                c if c == quote => return Ok(result),
                '\\' => {
                    let escaped = self.read_escape()?;
                    result.push(escaped);
                }
                other => result.push(other),
            }
        }
        Err(self.syntax_error("Unterminated string"))
    }

    fn read_escape(&mut self) -> Result<char> {
        match self.next_char() {
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('\\') => Ok('\\'),
            Some('/') => Ok('/'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('b') => Ok('\u{0008}'),
            Some('f') => Ok('\u{000C}'),
            Some('u') => {
                let high = self.read_hex4()?;
                if !(0xD800..0xDC00).contains(&high) {
                    return char::from_u32(high)
                        .ok_or_else(|| self.syntax_error("Invalid unicode code point"));
                }
                if !self.rest().starts_with("\\u") {
                    return Err(self.syntax_error("Unpaired surrogate in unicode escape"));
                }
                self.next_char();
                self.next_char();
                let low = self.read_hex4()?;
                if !(0xDC00..0xE000).contains(&low) {
                    return Err(self.syntax_error("Unpaired surrogate in unicode escape"));
                }
                let code_point = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code_point)
                    .ok_or_else(|| self.syntax_error("Invalid unicode code point"))
            }
            Some(_) => Err(self.syntax_error("Invalid escape sequence")),
            None => Err(self.syntax_error("Unterminated escape sequence")),
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = self
                .next_char()
                .and_then(|ch| ch.to_digit(16))
                .ok_or_else(|| {
                    self.syntax_error("Invalid unicode escape sequence (expected 4 hex digits)")
                })?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn expect(&mut self, expected: Token) -> Result<Peeked> {
        let found = self.peeked()?.token();
        if found == expected {
            self.take_peeked()
        } else {
            Err(self.unexpected(&expected, found))
        }
    }
}

/// Characters that may appear in an unquoted literal.
fn is_literal(ch: char) -> bool {
    !matches!(
        ch,
        '/' | '\\'
            | ';'
            | '#'
            | '='
            | '{'
            | '}'
            | '['
            | ']'
            | ':'
            | ','
            | ' '
            | '\t'
            | '\u{000C}'
            | '\r'
            | '\n'
            | '"'
            | '\''
    )
}

/// Matches `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
fn is_number_literal(literal: &str) -> bool {
    let bytes = literal.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };

    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            digits(&mut i);
        }
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if digits(&mut i) == 0 {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}

impl TokenReader for JsonReader<'_> {
    fn peek(&mut self) -> Result<Token> {
        Ok(self.peeked()?.token())
    }

    fn begin_array(&mut self) -> Result<()> {
        self.expect(Token::BeginArray)?;
        self.push(Scope::EmptyArray)?;
        self.path.enter_array();
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.expect(Token::EndArray)?;
        self.stack.pop();
        self.path.exit();
        Ok(())
    }

    fn begin_object(&mut self) -> Result<()> {
        self.expect(Token::BeginObject)?;
        self.push(Scope::EmptyObject)?;
        self.path.enter_object();
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.expect(Token::EndObject)?;
        self.stack.pop();
        self.path.exit();
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(!matches!(
            self.peeked()?,
            Peeked::EndArray | Peeked::EndObject | Peeked::EndDocument
        ))
    }

    fn next_name(&mut self) -> Result<String> {
        match self.expect(Token::Name)? {
            Peeked::Name(name) => {
                self.path.set_name(&name);
                Ok(name)
            }
            other => Err(self.unexpected(&Token::Name, other.token())),
        }
    }

    fn next_string(&mut self) -> Result<String> {
        match self.peeked()?.token() {
            Token::String | Token::Number => match self.take_peeked()? {
                Peeked::String(s) | Peeked::Number(s) => {
                    self.path.value_consumed();
                    Ok(s)
                }
                other => Err(self.unexpected(&Token::String, other.token())),
            },
            found => Err(self.unexpected(&Token::String, found)),
        }
    }

    fn next_number(&mut self) -> Result<String> {
        let literal = match self.peeked()? {
            Peeked::Number(s) => s.clone(),
            Peeked::String(s) if crate::value::Number::parse(s).is_some() => s.clone(),
            other => {
                let found = other.token();
                return Err(self.unexpected(&Token::Number, found));
            }
        };
        self.peeked = None;
        self.path.value_consumed();
        Ok(literal)
    }

    fn next_bool(&mut self) -> Result<bool> {
        let value = match self.peeked()? {
            Peeked::True => true,
            Peeked::False => false,
            other => {
                let found = other.token();
                return Err(self.unexpected(&Token::Bool, found));
            }
        };
        self.peeked = None;
        self.path.value_consumed();
        Ok(value)
    }

    fn next_null(&mut self) -> Result<()> {
        self.expect(Token::Null)?;
        self.path.value_consumed();
        Ok(())
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
