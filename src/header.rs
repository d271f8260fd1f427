//! Component A: the header reader. Detects the v1/v2 dialect, parses header fields, and reports
//! the byte offset at which the document body begins.

use crate::error::HeaderError;
use crate::registry::ValidatorRegistry;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Header {
    pub(crate) fields: HashMap<String, String>,
}

impl Header {
    pub(crate) fn version(&self) -> Option<&str> {
        self.fields.get("VERSION").map(String::as_str)
    }
}

/// Read the header from `source` and return it along with the byte offset of the first body byte.
/// The field list and accepted version sets are sourced from `registry`, not hardcoded here, so a
/// caller can substitute a stricter or broader header schema (§10.3).
pub(crate) fn read_header(source: &[u8], registry: &dyn ValidatorRegistry) -> Result<(Header, usize), HeaderError> {
    let mut offset = 0usize;
    let first_line = next_nonempty_line(source, &mut offset).ok_or(HeaderError::EmptySource)?;

    if let Some(rest) = first_line.strip_prefix("OFXHEADER:") {
        read_v1_header(rest.trim(), source, &mut offset, registry)
    } else if first_line.trim_start().starts_with("<?xml") {
        read_v2_header(source, &mut offset, registry)
    } else {
        Err(HeaderError::MalformedHeader(first_line.to_string()))
    }
}

fn read_v1_header(header_version: &str, source: &[u8], offset: &mut usize, registry: &dyn ValidatorRegistry) -> Result<(Header, usize), HeaderError> {
    let mut fields = HashMap::new();
    fields.insert("OFXHEADER".to_string(), header_version.to_string());

    for &expected_key in registry.v1_header_fields() {
        let mark = *offset;
        match next_nonempty_line(source, offset) {
            Some(line) => {
                let (key, value) = split_header_line(line).ok_or_else(|| HeaderError::MalformedHeader(line.to_string()))?;
                if key != expected_key {
                    // Not every implementation emits every optional field; if the line doesn't
                    // match, treat it as the start of the body instead of a hard failure, unless
                    // it's one of the two required keys.
                    if expected_key == "DATA" || expected_key == "VERSION" {
                        return Err(HeaderError::MalformedHeader(line.to_string()));
                    }
                    *offset = mark;
                    continue;
                }
                fields.insert(key.to_string(), value.to_string());
            }
            None => break,
        }
    }

    let header = Header { fields };
    match header.fields.get("DATA").map(String::as_str) {
        Some("OFXSGML") => {}
        other => return Err(HeaderError::UnsupportedVersion(format!("DATA={:?}", other))),
    }
    match header.version() {
        Some(v) if registry.accepted_v1_versions().contains(&v) => {}
        other => return Err(HeaderError::UnsupportedVersion(format!("VERSION={:?}", other))),
    }

    Ok((header, *offset))
}

fn read_v2_header(source: &[u8], offset: &mut usize, registry: &dyn ValidatorRegistry) -> Result<(Header, usize), HeaderError> {
    let pi_line = next_nonempty_line(source, offset).ok_or(HeaderError::EmptySource)?;
    let inner = pi_line
        .trim()
        .strip_prefix("<?OFX")
        .and_then(|s| s.strip_suffix("?>"))
        .ok_or_else(|| HeaderError::MalformedHeader(pi_line.to_string()))?;

    let mut fields = HashMap::new();
    for pair in inner.split_whitespace() {
        let (key, value) = pair.split_once('=').ok_or_else(|| HeaderError::MalformedHeader(pi_line.to_string()))?;
        let value = value.trim_matches('"');
        fields.insert(key.to_string(), value.to_string());
    }

    let header = Header { fields };
    match header.version() {
        Some(v) if registry.accepted_v2_versions().contains(&v) => {}
        other => return Err(HeaderError::UnsupportedVersion(format!("VERSION={:?}", other))),
    }

    Ok((header, *offset))
}

fn split_header_line(line: &str) -> Option<(&str, &str)> {
    line.split_once(':')
}


/// Advance `offset` past the next non-empty, trimmed line in `source`, returning it. `offset` is
/// left pointing at the first byte after the returned line.
fn next_nonempty_line<'a>(source: &'a [u8], offset: &mut usize) -> Option<&'a str> {
    loop {
        if *offset >= source.len() {
            return None;
        }
        let rest = &source[*offset..];
        let line_end = rest.iter().position(|&b| b == b'\n').map(|p| p + 1).unwrap_or(rest.len());
        let raw_line = &rest[..line_end];
        *offset += line_end;
        let line = std::str::from_utf8(raw_line).ok()?.trim();
        if !line.is_empty() {
            return Some(line);
        }
    }
}
