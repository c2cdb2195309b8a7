//! Output and input options for a [`Binder`](crate::Binder).
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::BindOptions;
//!
//! let options = BindOptions::pretty()
//!     .with_indent(4)
//!     .with_serialize_nulls(true);
//! assert_eq!(options.indent_string(), Some("    ".to_string()));
//! ```

use crate::stream::DEFAULT_NESTING_LIMIT;

/// The prefix that makes a JSON document unparseable as script.
pub const NON_EXECUTABLE_PREFIX: &str = ")]}'\n";

/// Formatting and leniency switches applied to every read and write.
///
/// # Examples
///
/// ```rust
/// use jsonbind::BindOptions;
///
/// let options = BindOptions::new();
/// assert!(!options.serialize_nulls);
/// assert!(!options.pretty);
/// assert!(options.lenient_reads);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BindOptions {
    /// Emit `null` for null members instead of dropping them.
    pub serialize_nulls: bool,
    /// Write with a lenient writer.
    pub lenient: bool,
    /// Read with a lenient reader.
    pub lenient_reads: bool,
    pub pretty: bool,
    /// Spaces per level when pretty printing.
    pub indent: usize,
    /// Allow NaN and infinities in output.
    pub serialize_special_floats: bool,
    /// Prefix output with [`NON_EXECUTABLE_PREFIX`].
    pub non_executable_prefix: bool,
    /// Escape `<`, `>`, `&`, `=` and `'` in output strings.
    pub html_safe: bool,
    /// Deepest array and object nesting accepted on input.
    pub nesting_limit: usize,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            serialize_nulls: false,
            lenient: false,
            lenient_reads: true,
            pretty: false,
            indent: 2,
            serialize_special_floats: false,
            non_executable_prefix: false,
            html_safe: false,
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }
}

impl BindOptions {
    /// Compact output, nulls dropped, lenient reads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`new`](Self::new) but pretty printed with a 2-space indent.
    #[must_use]
    pub fn pretty() -> Self {
        BindOptions {
            pretty: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.serialize_nulls = serialize_nulls;
        self
    }

    #[must_use]
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Chooses between lenient (the default) and strict reads.
    #[must_use]
    pub fn with_lenient_reads(mut self, lenient: bool) -> Self {
        self.lenient_reads = lenient;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the indentation size. Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_special_floats(mut self, allow: bool) -> Self {
        self.serialize_special_floats = allow;
        self
    }

    #[must_use]
    pub fn with_non_executable_prefix(mut self, prefix: bool) -> Self {
        self.non_executable_prefix = prefix;
        self
    }

    #[must_use]
    pub fn with_html_safe(mut self, html_safe: bool) -> Self {
        self.html_safe = html_safe;
        self
    }

    #[must_use]
    pub fn with_nesting_limit(mut self, limit: usize) -> Self {
        self.nesting_limit = limit;
        self
    }

    /// The indent unit for pretty output, `None` when compact.
    #[must_use]
    pub fn indent_string(&self) -> Option<String> {
        self.pretty.then(|| " ".repeat(self.indent))
    }
}
