//! Component D: the element flattener. Recursively reduces an [`Element`] subtree to a flat
//! `key -> value` map, validating leaves through the registry and dispatching aggregates to
//! per-tag handlers where one is registered.

use crate::error::SchemaError;
use crate::registry::{Value, ValidatorRegistry};
use crate::xml::Element;
use std::collections::HashMap;

/// A flattened field: either a validated leaf value, or an unresolved security reference produced
/// by the investment handler's `handle_SECID`. Resolution against the document's security map
/// happens one layer up, in the investment statement handler — a `SECID` that doesn't resolve is
/// a [`crate::error::ReferenceError`], a different failure mode than a schema violation, so the
/// flattener itself never attempts the lookup.
pub(crate) enum Field {
    Leaf(Value),
    SecIdRef { uniqueidtype: String, uniqueid: String },
}

impl Field {
    pub(crate) fn into_leaf(self) -> Option<Value> {
        match self {
            Field::Leaf(v) => Some(v),
            Field::SecIdRef { .. } => None,
        }
    }

    pub(crate) fn into_secid_ref(self) -> Option<(String, String)> {
        match self {
            Field::SecIdRef { uniqueidtype, uniqueid } => Some((uniqueidtype, uniqueid)),
            Field::Leaf(_) => None,
        }
    }
}

pub(crate) type AggregateHandler<'a> = dyn Fn(&Element) -> Result<HashMap<String, Field>, SchemaError> + 'a;

/// Flatten `node`'s children into a `key -> Field` map.
///
/// Leaves become validated, typed values under their lowercased tag name. Aggregates are either
/// dispatched to a registered handler (keyed by the aggregate's own tag) or recursively flattened
/// and hoisted into the same map — an unhandled aggregate contributes its own children's fields
/// directly to the parent, not nested under its own tag. Any key collision, whether between two
/// leaves, two aggregates, or a leaf and an aggregate, is a fatal [`SchemaError::DuplicateKey`].
///
/// When `recurse` is false, aggregate children are skipped entirely; this is used to peek at a
/// transaction list's `DTSTART`/`DTEND` preamble without descending into every transaction.
///
/// Children whose tag appears in `skip` are ignored outright (neither flattened as a leaf nor
/// descended into) — used by statement handlers to exclude an aggregate they've already consumed
/// through a dedicated step (e.g. `LEDGERBAL`) from the generic residual-field flattening pass.
pub(crate) fn flatten(node: &Element, registry: &dyn ValidatorRegistry, recurse: bool, handlers: &HashMap<&str, &AggregateHandler>) -> Result<HashMap<String, Field>, SchemaError> {
    flatten_skipping(node, registry, recurse, handlers, &[])
}

pub(crate) fn flatten_skipping(
    node: &Element,
    registry: &dyn ValidatorRegistry,
    recurse: bool,
    handlers: &HashMap<&str, &AggregateHandler>,
    skip: &[&str],
) -> Result<HashMap<String, Field>, SchemaError> {
    let mut leaves_raw: HashMap<String, String> = HashMap::new();
    let mut aggregates: HashMap<String, Field> = HashMap::new();

    for child in node.iter_children() {
        if skip.contains(&child.tag.as_str()) {
            continue;
        }
        if child.is_leaf() {
            let key = child.tag.to_lowercase();
            if leaves_raw.insert(key.clone(), child.text_trimmed().to_string()).is_some() {
                return Err(SchemaError::DuplicateKey { tag: node.tag.clone(), key });
            }
        } else if recurse {
            let produced = match handlers.get(child.tag.as_str()) {
                Some(handler) => handler(child)?,
                None => flatten(child, registry, recurse, handlers)?,
            };
            for (key, value) in produced {
                if aggregates.insert(key.clone(), value).is_some() {
                    return Err(SchemaError::DuplicateKey { tag: node.tag.clone(), key });
                }
            }
        }
    }

    let typed_leaves = registry.validate_leaves(&node.tag, &leaves_raw)?;
    let mut out: HashMap<String, Field> = typed_leaves.into_iter().map(|(k, v)| (k, Field::Leaf(v))).collect();
    for (key, value) in aggregates {
        if out.insert(key.clone(), value).is_some() {
            return Err(SchemaError::DuplicateKey { tag: node.tag.clone(), key });
        }
    }
    Ok(out)
}
