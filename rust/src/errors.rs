//! Errors generated by the catalog parser, the rule DSL parser and
//! the text-transformation utilities.
//!
//! # Complete example
//!
//! ## Read a PO file with a syntax error
//!
//! ```rust
//! use pocheck::{pofile, errors::CatalogSyntaxError};
//!
//! let content = r#"#
//! msgid "Hello"
//! msgstr "Ho"la"
//!"#;
//!
//! let file = pofile(content);
//! assert!(matches!(
//!     file,
//!     Err(CatalogSyntaxError::UnescapedDoubleQuoteFound { .. }),
//! ));
//! ```
//!
//! ## Expand a variable directive referring to an unknown name
//!
//! ```rust
//! use pocheck::text::expand_vars;
//! use pocheck::errors::NameError;
//! use std::collections::HashMap;
//!
//! let varmap = HashMap::new();
//! assert_eq!(
//!     expand_vars("hello %unknown", &varmap, '%'),
//!     Err(NameError::UnknownVariable { name: "unknown".to_string() }),
//! );
//! ```
use std::fmt;

use snafu::prelude::*;

/// A struct to represent a path to a file or a file content, used to
/// prefix diagnostic messages with " in file <path>" only when the
/// error originates from an actual file rather than an in-memory string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeFilename {
    filename: String,
    filename_is_path: bool,
}

impl MaybeFilename {
    pub fn new(filename: &str, filename_is_path: bool) -> Self {
        Self {
            filename: filename.to_string(),
            filename_is_path,
        }
    }
}

impl fmt::Display for MaybeFilename {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.filename_is_path {
            write!(f, " in file {}", self.filename)
        } else {
            Ok(())
        }
    }
}

/// Syntax errors generated when the PO catalog parser can't parse some
/// content, or when the in-memory model would violate one of its
/// invariants (a catalog without a header, a duplicate key, ...).
///
/// # Examples
///
/// ## Unescaped double quote found
///
/// ```rust
/// use pocheck::{pofile, errors::{CatalogSyntaxError, MaybeFilename}};
///
/// let content = r#"#
/// msgid "Hello"
/// msgstr "Ho"la"
///"#;
///
/// assert_eq!(
///     pofile(content),
///     Err(CatalogSyntaxError::UnescapedDoubleQuoteFound {
///         maybe_filename: MaybeFilename::new(content, false),
///         line: 3,
///         index: 11,
///     }),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CatalogSyntaxError {
    /// An unescaped double quote has been found in a quoted field string.
    ///
    /// Happens mainly when a file is edited by hand and the translator
    /// forgets to escape an embedded double quote.
    #[snafu(display("Syntax error found{maybe_filename} at line {line} (index {index}): unescaped double quote found"))]
    UnescapedDoubleQuoteFound {
        maybe_filename: MaybeFilename,
        line: usize,
        index: usize,
    },

    /// The byte stream could not be decoded with the encoding declared
    /// (or assumed) for the catalog.
    #[snafu(display("Syntax error found{maybe_filename} at line {line} (column {column}): could not decode with encoding {encoding}"))]
    DecodeError {
        maybe_filename: MaybeFilename,
        line: usize,
        column: usize,
        encoding: String,
    },

    /// A non-header entry has both an empty `msgid` and no `msgctxt`.
    #[snafu(display("Syntax error found{maybe_filename} at line {line}: empty key in non-header entry"))]
    EmptyKey {
        maybe_filename: MaybeFilename,
        line: usize,
    },

    /// An `msgstr[N]` field index could not be parsed as an integer.
    #[snafu(display("Syntax error found{maybe_filename} at line {line} (index {index}): malformed msgstr index"))]
    MalformedMsgstrIndex {
        maybe_filename: MaybeFilename,
        line: usize,
        index: usize,
    },

    /// A field started (e.g. `msgid "..."`) but no quoted string
    /// continuation followed where one was expected.
    #[snafu(display("Syntax error found{maybe_filename} at line {line}: expected string continuation"))]
    ExpectedContinuation {
        maybe_filename: MaybeFilename,
        line: usize,
    },

    /// The catalog does not start with a header entry
    /// (empty `msgctxt` and empty `msgid`).
    #[snafu(display("Syntax error found{maybe_filename}: catalog has no header entry"))]
    MissingHeader { maybe_filename: MaybeFilename },

    /// Two entries in the same catalog resolved to the same key.
    #[snafu(display("Syntax error found{maybe_filename}: duplicate key for msgctxt {msgctxt:?}, msgid {msgid:?}"))]
    DuplicateKey {
        maybe_filename: MaybeFilename,
        msgctxt: Option<String>,
        msgid: String,
    },

    /// A generic syntax error that includes a message about what
    /// went wrong.
    #[snafu(display("Syntax error found{maybe_filename} at line {line} (index {index}): {message}"))]
    Custom {
        maybe_filename: MaybeFilename,
        line: usize,
        index: usize,
        message: String,
    },

    /// A generic syntax error without information about the line or
    /// the index.
    #[snafu(display("Syntax error found{maybe_filename}: {message}"))]
    BasicCustom {
        maybe_filename: MaybeFilename,
        message: String,
    },
}

/// Raised when the catalog header cannot be parsed into field/value
/// pairs, or when a caller asks for a header-derived accessor that
/// requires a well-formed header.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum InvalidHeader {
    #[snafu(display("Invalid header{maybe_filename}: {message}"))]
    Malformed {
        maybe_filename: MaybeFilename,
        message: String,
    },

    #[snafu(display("Invalid header: Plural-Forms field could not be parsed: {expression}"))]
    MalformedPluralForms { expression: String },
}

/// Raised by [`crate::text::expand_vars`] when a `%NAME` or `%{NAME}`
/// directive is unterminated or refers to a name not present in the
/// variable map.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum NameError {
    #[snafu(display("unknown variable '{name}'"))]
    UnknownVariable { name: String },

    #[snafu(display("unterminated variable directive in '{text}'"))]
    UnterminatedDirective { text: String },
}

/// Raised while parsing a rule file (`.rules`): unbalanced trigger
/// brackets, unknown directive keywords, duplicate fields within an
/// entry, or a filter directive naming an unknown filter type.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum RuleSyntaxError {
    #[snafu(display("{maybe_filename} at line {line}: unbalanced brackets in trigger pattern"))]
    UnbalancedBrackets {
        maybe_filename: MaybeFilename,
        line: usize,
    },

    #[snafu(display("{maybe_filename} at line {line}: unknown directive '{keyword}'"))]
    UnknownDirective {
        maybe_filename: MaybeFilename,
        line: usize,
        keyword: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: unknown message part '{part}'"))]
    UnknownMessagePart {
        maybe_filename: MaybeFilename,
        line: usize,
        part: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: duplicate field '{field}'"))]
    DuplicateField {
        maybe_filename: MaybeFilename,
        line: usize,
        field: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: unknown filter type '{filter_type}'"))]
    UnknownFilterType {
        maybe_filename: MaybeFilename,
        line: usize,
        filter_type: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: unterminated quoted value"))]
    UnterminatedQuote {
        maybe_filename: MaybeFilename,
        line: usize,
    },

    #[snafu(display("{maybe_filename} at line {line}: reference to undefined group '{name}'"))]
    UndefinedGroup {
        maybe_filename: MaybeFilename,
        line: usize,
        name: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: invalid hook request '{request}': {message}"))]
    InvalidHookRequest {
        maybe_filename: MaybeFilename,
        line: usize,
        request: String,
        message: String,
    },

    #[snafu(display("{maybe_filename} at line {line}: invalid regex in {field}: {message}"))]
    InvalidRegex {
        maybe_filename: MaybeFilename,
        line: usize,
        field: String,
        message: String,
    },

    /// A generic directive-construction error (malformed filter
    /// fields, missing mandatory fields, duplicate fields) that
    /// doesn't fit one of the more specific variants above.
    #[snafu(display("{maybe_filename} at line {line}: {message}"))]
    Custom {
        maybe_filename: MaybeFilename,
        line: usize,
        message: String,
    },
}

/// Raised when two rules declare the same `id` within the same
/// effective environment.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("{maybe_filename} at line {line}: duplicate rule id '{id}', previously declared at line {prev_line}"))]
pub struct IdentError {
    pub maybe_filename: MaybeFilename,
    pub id: String,
    pub line: usize,
    pub prev_line: usize,
}

/// Errors raised by filesystem operations performed while loading or
/// syncing a catalog or a rule file.
#[derive(Debug, Snafu)]
pub enum IOError {
    #[snafu(display("I/O error reading {path}: {source}"))]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("I/O error writing {path}: {source}"))]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("I/O error renaming {from} to {to}: {source}"))]
    Rename {
        from: String,
        to: String,
        source: std::io::Error,
    },
}

impl PartialEq for IOError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// Raised by [`crate::text::resolve_alternatives`] on a malformed
/// alternatives directive. Unlike the other error kinds, this one is
/// non-fatal: the utility that raises it always also returns the
/// original text unchanged, so callers may choose to ignore it and
/// keep the returned text as-is.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("malformed alternatives directive in '{text}': {message}"))]
pub struct MalformedDirective {
    pub text: String,
    pub message: String,
}

/// Escaping errors generated by the C-style string escaping/unescaping
/// functions used by the PO parser and serializer.
///
/// These are not generated by the catalog parser itself (which maps
/// them onto [`CatalogSyntaxError`]); they are exposed for callers
/// using the escaping functions directly.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum EscapingError {
    #[snafu(display("escape sequence found at end of string '{text}'"))]
    EscapeAtEndOfString { text: String },

    #[snafu(display(
        "invalid escaped character '{character}' found in '{text}'"
    ))]
    InvalidEscapedCharacter { text: String, character: char },
}
