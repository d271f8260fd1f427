//! Component E: the statement handlers. Shared extraction helpers, plus per-kind modules for bank
//! (and credit-card, which differs only in account shape) and investment statements.

pub(crate) mod bank;
pub(crate) mod investment;

use crate::error::SchemaError;
use crate::flatten::{flatten, AggregateHandler, Field};
use crate::model::NamedBalance;
use crate::registry::{Value, ValidatorRegistry};
use crate::xml::Element;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub(crate) fn take_str(fields: &mut HashMap<String, Field>, key: &str) -> Option<String> {
    match fields.remove(key)?.into_leaf()? {
        Value::Str(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn take_decimal(fields: &mut HashMap<String, Field>, key: &str) -> Option<Decimal> {
    fields.remove(key)?.into_leaf()?.as_decimal()
}

pub(crate) fn take_datetime(fields: &mut HashMap<String, Field>, key: &str) -> Option<DateTime<Utc>> {
    fields.remove(key)?.into_leaf()?.as_datetime()
}

/// Pull an unresolved `(uniqueidtype, uniqueid)` reference left by `handle_SECID` out of a
/// flattened field map. Resolution against the document's security map is the caller's job.
pub(crate) fn take_secid_ref(fields: &mut HashMap<String, Field>, key: &str) -> Option<(String, String)> {
    fields.remove(key)?.into_secid_ref()
}

fn required_field(tag: &str, key: &str) -> SchemaError {
    SchemaError::MissingField { tag: tag.to_string(), key: key.to_string() }
}

/// Flatten `list_node`'s `DTSTART`/`DTEND` preamble (without descending into its item children),
/// then build one `T` per item via `build_item`, skipping any direct child whose tag is in
/// `skip_tags` (the preamble fields themselves, which are leaves and so never reach `build_item`,
/// plus any other non-transaction aggregate the list may carry).
pub(crate) fn handle_tranlist<T, E: From<SchemaError>>(
    list_node: &Element,
    registry: &dyn ValidatorRegistry,
    handlers: &HashMap<&str, &AggregateHandler>,
    skip_tags: &[&str],
    mut build_item: impl FnMut(&Element, HashMap<String, Field>) -> Result<T, E>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>, Vec<T>), E> {
    let mut preamble = flatten(list_node, registry, false, handlers)?;
    let start = take_datetime(&mut preamble, "dtstart");
    let end = take_datetime(&mut preamble, "dtend");

    let mut items = Vec::new();
    for child in list_node.iter_children() {
        if skip_tags.contains(&child.tag.as_str()) {
            continue;
        }
        let fields = flatten(child, registry, true, handlers)?;
        items.push(build_item(child, fields)?);
    }
    Ok((start, end, items))
}

/// Log a warning for each tag in `tags` that appears as a direct child of `node` and is about to
/// be dropped unread, rather than failing the parse outright (§10.1).
pub(crate) fn warn_unsupported_sections(node: &Element, tags: &[&str]) {
    for &tag in tags {
        if node.find_child(tag).is_some() {
            log::warn!("dropping unsupported {tag} aggregate under {}", node.tag);
        }
    }
}

/// Flatten each `BAL` child of `list_node` into a `name -> NamedBalance` map.
pub(crate) fn handle_ballist(
    list_node: &Element,
    registry: &dyn ValidatorRegistry,
) -> Result<HashMap<String, NamedBalance>, SchemaError> {
    let handlers: HashMap<&str, &AggregateHandler> = HashMap::new();
    let mut out = HashMap::new();
    for bal in list_node.find_children("BAL") {
        let mut fields = flatten(bal, registry, true, &handlers)?;
        let name = take_str(&mut fields, "name").ok_or_else(|| required_field("BAL", "name"))?;
        let desc = take_str(&mut fields, "desc").ok_or_else(|| required_field("BAL", "desc"))?;
        let baltype = take_str(&mut fields, "baltype").ok_or_else(|| required_field("BAL", "baltype"))?;
        let value = take_decimal(&mut fields, "value").ok_or_else(|| required_field("BAL", "value"))?;
        let dtasof = take_datetime(&mut fields, "dtasof");
        out.insert(name, NamedBalance { desc, baltype, value, dtasof });
    }
    Ok(out)
}
