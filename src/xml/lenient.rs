//! Lenient tree-building back-end: a hand-rolled SGML scanner tolerant of OFX v1's unclosed leaf
//! elements.
//!
//! The core rule, carried over from the original parser this crate replaces: a leaf element in
//! OFX v1 is written `<TAG>value` with no closing tag at all — the next start-tag or end-tag ends
//! it. The scanner below is a stack machine rather than the original's recursive-descent one, but
//! implements exactly that rule.

use crate::xml::element::Element;
use crate::xml::error::TreeError;
use log::trace;

enum Token<'a> {
    Start(&'a str),
    End(&'a str),
    Text(&'a str),
}

/// Split `input` into a flat stream of tag/text tokens. Attributes on start tags (rare in OFX) are
/// discarded along with the tag's trailing `/` if present, since every practical OFX aggregate and
/// leaf is identified by name alone.
fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0usize;
    while pos < bytes.len() {
        match input[pos..].find('<') {
            None => {
                if pos < input.len() {
                    tokens.push(Token::Text(&input[pos..]));
                }
                break;
            }
            Some(rel_lt) => {
                let lt = pos + rel_lt;
                if lt > pos {
                    tokens.push(Token::Text(&input[pos..lt]));
                }
                match input[lt..].find('>') {
                    None => break,
                    Some(rel_gt) => {
                        let gt = lt + rel_gt;
                        let inner = &input[lt + 1..gt];
                        if let Some(name) = inner.strip_prefix('/') {
                            tokens.push(Token::End(name.split_whitespace().next().unwrap_or("").trim()));
                        } else {
                            let name = inner.split_whitespace().next().unwrap_or("").trim_end_matches('/');
                            tokens.push(Token::Start(name));
                        }
                        pos = gt + 1;
                    }
                }
            }
        }
    }
    tokens
}

fn strip_control_whitespace(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\x0c' | '\n' | '\r' | '\t' | '\x0b')).collect()
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(finished) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(finished);
        } else {
            stack.push(finished);
        }
    }
}

/// Parse `body` under the lenient SGML rules and return its single top-level element.
pub(crate) fn build_lenient(body: &[u8]) -> Result<Element, TreeError> {
    let text = std::str::from_utf8(body).map_err(|_| TreeError::InvalidUtf8)?;

    #[derive(PartialEq)]
    enum State {
        Idle,
        InData,
    }

    let mut stack = vec![Element::new("#ROOT")];
    let mut state = State::Idle;

    for token in tokenize(text) {
        match token {
            Token::Start(name) => {
                if state == State::InData {
                    trace!("lenient: synthesizing close for unclosed leaf <{}>", stack.last().unwrap().tag);
                    close_top(&mut stack);
                }
                let tag = name.to_uppercase();
                trace!("lenient: open <{tag}>");
                stack.push(Element::new(tag));
                state = State::Idle;
            }
            Token::End(name) => {
                if state == State::InData {
                    trace!("lenient: synthesizing close for unclosed leaf <{}>", stack.last().unwrap().tag);
                    close_top(&mut stack);
                }
                let tag = name.to_uppercase();
                if stack.len() <= 1 {
                    return Err(TreeError::UnmatchedEndTag(tag));
                }
                if stack.last().unwrap().tag == tag {
                    trace!("lenient: explicit close </{tag}>");
                    close_top(&mut stack);
                } else {
                    // The element we expect to close was already synthetically closed as a leaf;
                    // walk up and close any ancestors down to (and including) the matching tag.
                    while stack.len() > 1 && stack.last().unwrap().tag != tag {
                        close_top(&mut stack);
                    }
                    if stack.len() > 1 {
                        trace!("lenient: explicit close </{tag}> (after synthetic closes)");
                        close_top(&mut stack);
                    }
                }
                state = State::Idle;
            }
            Token::Text(raw) => {
                let cleaned = strip_control_whitespace(raw);
                if !cleaned.is_empty() {
                    stack.last_mut().unwrap().text.push_str(&cleaned);
                    state = State::InData;
                }
            }
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }

    let mut root = stack.pop().ok_or(TreeError::Empty)?;
    if root.children.is_empty() {
        return Err(TreeError::Empty);
    }
    Ok(root.children.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_leaves_are_closed_by_the_next_tag() {
        let body = b"<OFX><STMTRS><CURDEF>USD<BANKID>123</STMTRS></OFX>";
        let root = build_lenient(body).unwrap();
        assert_eq!(root.tag, "OFX");
        let stmtrs = root.find_child("STMTRS").unwrap();
        assert_eq!(stmtrs.find_child("CURDEF").unwrap().text_trimmed(), "USD");
        assert_eq!(stmtrs.find_child("BANKID").unwrap().text_trimmed(), "123");
    }

    #[test]
    fn leaf_text_preserves_internal_spaces_but_strips_control_whitespace() {
        let body = b"<OFX><MEMO>Gas station\n\tpurchase</OFX>";
        let root = build_lenient(body).unwrap();
        assert_eq!(root.find_child("MEMO").unwrap().text_trimmed(), "Gas stationpurchase");
    }

    #[test]
    fn explicit_close_after_synthetic_leaf_close_closes_the_enclosing_aggregate() {
        let body = b"<OFX><BANKACCTFROM><BANKID>123456789</BANKACCTFROM></OFX>";
        let root = build_lenient(body).unwrap();
        let acctfrom = root.find_child("BANKACCTFROM").unwrap();
        assert_eq!(acctfrom.children.len(), 1);
        assert_eq!(acctfrom.find_child("BANKID").unwrap().text_trimmed(), "123456789");
    }

    #[test]
    fn tags_are_uppercased() {
        let body = b"<ofx><stmtrs><curdef>usd</stmtrs></ofx>";
        let root = build_lenient(body).unwrap();
        assert_eq!(root.tag, "OFX");
        assert_eq!(root.find_child("STMTRS").unwrap().tag, "STMTRS");
    }
}
