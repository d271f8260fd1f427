//! The public error taxonomy. Each variant is produced at exactly one architectural layer; see
//! `SPEC_FULL.md` §7 for the full error handling design.

use std::fmt;

/// Errors from the header reader (component A).
#[derive(Debug)]
pub enum HeaderError {
    /// The source yielded no non-empty line at all.
    EmptySource,
    /// The first line was neither an `OFXHEADER:` line nor an `<?xml` declaration, or a header
    /// line did not match its expected `KEY:VALUE` shape. Carries the offending line.
    MalformedHeader(String),
    /// `DATA` or `VERSION` was outside the accepted set. Carries the offending `KEY=VALUE` pair.
    UnsupportedVersion(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::EmptySource => write!(f, "source contains no data"),
            HeaderError::MalformedHeader(line) => write!(f, "malformed header line: {line:?}"),
            HeaderError::UnsupportedVersion(v) => write!(f, "unsupported OFX header value: {v}"),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Errors from the element flattener and validator registry (component C/D).
#[derive(Debug)]
pub enum SchemaError {
    /// Two children of the same aggregate mapped to the same flattened key. Carries the tag path
    /// and the colliding key.
    DuplicateKey { tag: String, key: String },
    /// A required field was absent from an aggregate. Carries the tag path and the missing key.
    MissingField { tag: String, key: String },
    /// An aggregate contained a leaf the registry has no schema entry for. Carries the tag path
    /// and the unknown key.
    UnknownField { tag: String, key: String },
    /// A leaf's text could not be coerced to the type its schema entry demands.
    InvalidValue { tag: String, key: String, reason: String },
    /// A tag name could not be coerced to one of the four tag-derived enum domains (transaction
    /// kind, security-info kind, position kind).
    UnknownTransactionType(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateKey { tag, key } => write!(f, "{tag}: duplicate key {key:?}"),
            SchemaError::MissingField { tag, key } => write!(f, "{tag}: missing required field {key:?}"),
            SchemaError::UnknownField { tag, key } => write!(f, "{tag}: unknown field {key:?}"),
            SchemaError::InvalidValue { tag, key, reason } => write!(f, "{tag}.{key}: {reason}"),
            SchemaError::UnknownTransactionType(tag) => write!(f, "unrecognized tag {tag:?}"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Error from the investment statement handler (component E) when a `SECID` does not resolve.
#[derive(Debug)]
pub struct ReferenceError {
    pub uniqueidtype: String,
    pub uniqueid: String,
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved security reference ({}, {})", self.uniqueidtype, self.uniqueid)
    }
}

impl std::error::Error for ReferenceError {}

/// The top-level error type the facade's public API returns.
#[derive(Debug)]
pub enum OfxError {
    /// The source could not be read at all (e.g. the path doesn't exist).
    Io(String),
    Header(HeaderError),
    /// The document could not be parsed by either tree-building back-end.
    Tree(String),
    Schema(SchemaError),
    Reference(ReferenceError),
}

impl fmt::Display for OfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfxError::Io(msg) => write!(f, "could not read source: {msg}"),
            OfxError::Header(e) => write!(f, "header error: {e}"),
            OfxError::Tree(msg) => write!(f, "document could not be parsed: {msg}"),
            OfxError::Schema(e) => write!(f, "schema error: {e}"),
            OfxError::Reference(e) => write!(f, "reference error: {e}"),
        }
    }
}

impl std::error::Error for OfxError {}

impl From<HeaderError> for OfxError {
    fn from(e: HeaderError) -> Self {
        OfxError::Header(e)
    }
}

impl From<SchemaError> for OfxError {
    fn from(e: SchemaError) -> Self {
        OfxError::Schema(e)
    }
}

impl From<ReferenceError> for OfxError {
    fn from(e: ReferenceError) -> Self {
        OfxError::Reference(e)
    }
}
