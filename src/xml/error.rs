//! Errors internal to tree building.
//!
//! [`TreeError`] never escapes the crate's public API: a [`TreeError`] from the strict back-end
//! triggers the lenient fallback, and a [`TreeError`] from the lenient back-end (which should only
//! happen on truly malformed input, since the lenient back-end tolerates unclosed leaves) is
//! reported to the caller wrapped in [`crate::error::OfxError::Tree`].

use std::fmt;

#[derive(Debug)]
pub(crate) enum TreeError {
    /// Error surfaced by the `quick_xml` strict back-end.
    QuickXml(quick_xml::Error),
    /// The document body contained bytes that are not valid UTF-8.
    InvalidUtf8,
    /// An end tag did not match any open element.
    UnmatchedEndTag(String),
    /// The document body contained no top-level element at all.
    Empty,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::QuickXml(e) => write!(f, "XML syntax error: {e}"),
            TreeError::InvalidUtf8 => write!(f, "document body is not valid UTF-8"),
            TreeError::UnmatchedEndTag(tag) => write!(f, "end tag </{tag}> does not match any open element"),
            TreeError::Empty => write!(f, "document body contains no elements"),
        }
    }
}

impl std::error::Error for TreeError {}

impl From<quick_xml::Error> for TreeError {
    fn from(e: quick_xml::Error) -> Self {
        TreeError::QuickXml(e)
    }
}
