//! Strict tree-building back-end: a well-formed-XML reader built on `quick_xml`.
//!
//! Used first by the facade for every document, v1 or v2 alike. Most real-world OFX v1 bodies are
//! well-formed enough (or close enough) that this succeeds; when it doesn't, `quick_xml` reports a
//! [`TreeError`] and the facade retries with [`super::lenient::build_lenient`].

use crate::xml::element::Element;
use crate::xml::error::TreeError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse `body` as well-formed XML and return its single top-level element.
pub(crate) fn build_strict(body: &[u8]) -> Result<Element, TreeError> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => return parse_element(&mut reader, start),
            Event::Empty(start) => {
                return Ok(Element::new(uppercase_tag(&start)));
            }
            Event::Eof => return Err(TreeError::Empty),
            _ => {}
        }
        buf.clear();
    }
}

fn uppercase_tag(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_uppercase()
}

fn parse_element<R: std::io::BufRead>(reader: &mut Reader<R>, start: BytesStart) -> Result<Element, TreeError> {
    let tag = uppercase_tag(&start);
    let mut elem = Element::new(tag);

    for attr in start.attributes().filter_map(|a| a.ok()) {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_uppercase();
        let value = attr.unescape_value().unwrap_or_default().into_owned();
        elem.attributes.insert(key, value);
    }

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(child_start) => {
                let child = parse_element(reader, child_start)?;
                elem.children.push(child);
            }
            Event::Empty(child_start) => {
                elem.children.push(Element::new(uppercase_tag(&child_start)));
            }
            Event::Text(t) => {
                let text = t.unescape().unwrap_or_default();
                elem.text.push_str(text.as_ref());
            }
            Event::End(e) if e.name() == start.name() => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(elem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_document_and_uppercases_tags() {
        let body = b"<ofx><stmtrs><curdef>USD</curdef><bankid>123</bankid></stmtrs></ofx>";
        let root = build_strict(body).unwrap();
        assert_eq!(root.tag, "OFX");
        let stmtrs = root.find_child("STMTRS").unwrap();
        assert_eq!(stmtrs.find_child("CURDEF").unwrap().text_trimmed(), "USD");
    }

    #[test]
    fn unclosed_leaf_is_a_syntax_error() {
        let body = b"<OFX><STMTRS><CURDEF>USD<BANKID>123</STMTRS></OFX>";
        assert!(build_strict(body).is_err());
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(matches!(build_strict(b""), Err(TreeError::Empty)));
    }
}
