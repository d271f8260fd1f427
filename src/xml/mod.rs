//! Tree building: turning a document body into a normalized [`Element`] tree.
//!
//! Two back-ends share the [`Element`] type: [`strict::build_strict`] (well-formed XML, tried
//! first) and [`lenient::build_lenient`] (hand-rolled SGML, tolerant of OFX v1's unclosed leaves,
//! used as a fallback or when the caller asks for it up front).

pub(crate) mod element;
mod error;
mod lenient;
mod strict;

pub(crate) use element::Element;
pub(crate) use error::TreeError;

/// Build the element tree for `body`, trying the strict back-end first unless `prefer_lenient` is
/// set, in which case only the lenient back-end is attempted.
pub(crate) fn build_tree(body: &[u8], prefer_lenient: bool) -> Result<Element, TreeError> {
    if prefer_lenient {
        return lenient::build_lenient(body);
    }
    match strict::build_strict(body) {
        Ok(elem) => Ok(elem),
        Err(_) => {
            log::debug!("strict tree build failed, falling back to lenient SGML parsing");
            lenient::build_lenient(body)
        }
    }
}
