//! Error types for binding, resolution and token-stream processing.
//!
//! Every failure the engine recognizes is reported through the single [`Error`]
//! enum. The enum is `Clone` because the adapter registry caches construction
//! failures and hands the same error back on every later lookup.
//!
//! ## Error Categories
//!
//! - **Construction errors**: [`Error::TypeResolution`], [`Error::NoInstantiationStrategy`],
//!   [`Error::DuplicateMember`], [`Error::NoAdapter`], [`Error::UnsupportedMapKey`]. These are
//!   cached and never retried.
//! - **Per-value errors**: [`Error::Malformed`], [`Error::NumericRange`], [`Error::Syntax`].
//!   These propagate to the caller of the read or write in progress.
//! - **Container errors**: [`Error::NotComparable`] from the ordered map.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{Binder, Error, TypeSignature};
//!
//! let binder = Binder::new();
//! let result = binder.from_json("[1, 2", &TypeSignature::object());
//! assert!(matches!(result, Err(Error::Syntax { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while binding values to and from JSON.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Text that cannot be tokenized
    #[error("Syntax error at line {line}, column {col} (path {path}): {msg}")]
    Syntax {
        line: usize,
        col: usize,
        msg: String,
        path: String,
    },

    /// Token stream shape differs from what the adapter expects
    #[error("Malformed input at {path}: expected {expected}, found {found}")]
    Malformed {
        expected: String,
        found: String,
        path: String,
    },

    /// Numeric literal not representable in the target type
    #[error("Numeric literal {literal} cannot be represented as {target}")]
    NumericRange { literal: String, target: String },

    /// A type variable with neither a binding nor a declaration
    #[error("Cannot resolve type variable {variable} declared by {declared_by}")]
    TypeResolution {
        variable: String,
        declared_by: String,
    },

    /// Ordered map key without a defined order
    #[error("Key {key} is not comparable under the map's ordering")]
    NotComparable { key: String },

    /// Abstract type with no constructor or instance creator
    #[error("Unable to create an instance of {type_name}: register an instance creator for this type")]
    NoInstantiationStrategy { type_name: String },

    /// Two bound members share one external name
    #[error("{type_name} declares multiple JSON fields named '{name}'")]
    DuplicateMember { type_name: String, name: String },

    /// No factory in the chain accepts the type
    #[error("No adapter can handle {type_name}")]
    NoAdapter { type_name: String },

    /// Map key type with no string form
    #[error("{type_name} cannot be bound: map keys must be strings, primitives or enums, not {key}")]
    UnsupportedMapKey { type_name: String, key: String },

    /// A forward reference used before its adapter finished building
    #[error("Adapter for {type_name} used before its construction completed")]
    IncompleteAdapter { type_name: String },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line, column and path information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonbind::Error;
    ///
    /// let err = Error::syntax(10, 5, "$.items[2]", "unterminated string");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, path: &str, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
            path: path.to_string(),
        }
    }

    /// Creates a malformed-input error carrying the expected and actual shapes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonbind::Error;
    ///
    /// let err = Error::malformed("BEGIN_OBJECT", "BEGIN_ARRAY", "$");
    /// assert!(err.to_string().contains("expected BEGIN_OBJECT"));
    /// ```
    pub fn malformed(expected: impl fmt::Display, found: impl fmt::Display, path: &str) -> Self {
        Error::Malformed {
            expected: expected.to_string(),
            found: found.to_string(),
            path: path.to_string(),
        }
    }

    /// Creates a numeric range error for a literal and its target type.
    pub fn numeric_range(literal: &str, target: &str) -> Self {
        Error::NumericRange {
            literal: literal.to_string(),
            target: target.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonbind::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for stream reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for failures raised while building an adapter rather than
    /// while processing a value.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::TypeResolution { .. }
                | Error::NoInstantiationStrategy { .. }
                | Error::DuplicateMember { .. }
                | Error::NoAdapter { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
