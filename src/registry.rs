//! Component C: the validator registry. An opaque, injectable external collaborator supplying
//! per-tag field schemas and transaction-kind coercion. The core treats this as a plugin — see
//! `SPEC_FULL.md` §4.C and §10.3 — with [`DefaultRegistry`] as the crate's built-in configuration.

use crate::categories::{InvTranType, PositionType, SecInfoType, TranType};
use crate::error::SchemaError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// A single coerced leaf value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Str(String),
    Decimal(Decimal),
    DateTime(DateTime<Utc>),
    Bool(bool),
}

impl Value {
    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub(crate) fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    Str,
    Decimal,
    DateTime,
    Bool,
}

impl Kind {
    fn coerce(self, tag: &str, key: &str, raw: &str) -> Result<Value, SchemaError> {
        let err = |reason: String| SchemaError::InvalidValue { tag: tag.to_string(), key: key.to_string(), reason };
        match self {
            Kind::Str => Ok(Value::Str(raw.to_string())),
            Kind::Decimal => Decimal::from_str(raw).map(Value::Decimal).map_err(|e| err(e.to_string())),
            Kind::DateTime => parse_ofx_datetime(raw).map(Value::DateTime).map_err(err),
            Kind::Bool => match raw.to_ascii_uppercase().as_str() {
                "Y" | "TRUE" | "1" => Ok(Value::Bool(true)),
                "N" | "FALSE" | "0" => Ok(Value::Bool(false)),
                other => Err(err(format!("{other:?} is not a recognized boolean"))),
            },
        }
    }
}

/// Parse an OFX `DTposted`-style timestamp: `YYYYMMDD[HHMMSS[.XXX[[offset:TZ]]]]`. Lenient about
/// the optional time and fractional-second parts; the timezone offset, when present, is applied
/// before converting to UTC, and otherwise the value is assumed to already be UTC.
pub(crate) fn parse_ofx_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if raw.len() < 8 {
        return Err(format!("{raw:?} is too short to be an OFX date"));
    }
    let (date_part, rest) = raw.split_at(8);
    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|e| e.to_string())?;

    // Strip a bracketed timezone offset, e.g. "[-5:EST]", if present, before reading the time.
    let (time_and_frac, offset_hours) = match rest.find('[') {
        Some(start) => {
            let end = rest.find(']').ok_or_else(|| format!("{raw:?} has an unterminated timezone bracket"))?;
            let bracket = &rest[start + 1..end];
            let offset_str = bracket.split(':').next().unwrap_or("0");
            let offset: f64 = offset_str.trim().parse().map_err(|_| format!("{offset_str:?} is not a valid UTC offset"))?;
            (&rest[..start], offset)
        }
        None => (rest, 0.0),
    };

    let time_only = time_and_frac.split('.').next().unwrap_or("");
    let naive = if time_only.is_empty() {
        date.and_hms_opt(0, 0, 0).ok_or_else(|| format!("{raw:?} has an invalid time of day"))?
    } else if time_only.len() == 6 {
        NaiveDateTime::parse_from_str(&format!("{date_part}{time_only}"), "%Y%m%d%H%M%S").map_err(|e| e.to_string())?
    } else {
        return Err(format!("{raw:?} has a malformed time-of-day component"));
    };

    let offset_seconds = (offset_hours * 3600.0).round() as i64;
    let utc_naive = naive - chrono::Duration::seconds(offset_seconds);
    Ok(Utc.from_utc_datetime(&utc_naive))
}

struct TagSchema {
    required: &'static [(&'static str, Kind)],
    optional: &'static [(&'static str, Kind)],
}

/// Coerces a map of `child_name_lower -> raw_text` into a map of `child_name_lower -> Value`,
/// validating against the per-tag schema, and exposes enum coercion for all four tag-derived
/// domains (§4.C), plus the header field/version configuration (§10.3) that the header reader
/// (component A) has no business hardcoding itself.
pub(crate) trait ValidatorRegistry: Send + Sync {
    fn validate_leaves(&self, tag: &str, leaves: &HashMap<String, String>) -> Result<HashMap<String, Value>, SchemaError>;
    fn bank_tran_type(&self, raw: &str) -> Result<TranType, SchemaError>;
    fn inv_tran_type(&self, tag: &str) -> Result<InvTranType, SchemaError>;
    fn security_info_type(&self, tag: &str) -> Result<SecInfoType, SchemaError>;
    fn position_type(&self, tag: &str) -> Result<PositionType, SchemaError>;

    /// The ordered v1 header field list (e.g. `DATA`, `VERSION`, `SECURITY`, ...).
    fn v1_header_fields(&self) -> &'static [&'static str];
    /// The accepted v1 `VERSION` values.
    fn accepted_v1_versions(&self) -> &'static [&'static str];
    /// The accepted v2 `VERSION` values.
    fn accepted_v2_versions(&self) -> &'static [&'static str];
}

/// The crate's built-in, fixed-dictionary registry, covering the tags named in this crate's data
/// model. A caller with a broader or stricter schema can implement [`ValidatorRegistry`] directly.
pub(crate) struct DefaultRegistry {
    schemas: HashMap<&'static str, TagSchema>,
}

const V1_HEADER_FIELDS: &[&str] = &["DATA", "VERSION", "SECURITY", "ENCODING", "CHARSET", "COMPRESSION", "OLDFILEUID", "NEWFILEUID"];
const ACCEPTED_V1_VERSIONS: &[&str] = &["102", "103", "151", "160"];
const ACCEPTED_V2_VERSIONS: &[&str] = &["200", "201", "202", "203", "210", "211", "220"];

macro_rules! schema_map {
    ($( $tag:literal => { required: [$($rk:literal: $rkind:expr),* $(,)?], optional: [$($ok:literal: $okind:expr),* $(,)?] } ),* $(,)?) => {{
        let mut m: HashMap<&'static str, TagSchema> = HashMap::new();
        $(
            m.insert($tag, TagSchema {
                required: &[$(($rk, $rkind)),*],
                optional: &[$(($ok, $okind)),*],
            });
        )*
        m
    }};
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        use Kind::*;
        let schemas = schema_map! {
            "BANKACCTFROM" => {
                required: ["bankid": Str, "acctid": Str, "accttype": Str],
                optional: ["branchid": Str],
            },
            "CCACCTFROM" => {
                required: ["acctid": Str],
                optional: [],
            },
            "INVACCTFROM" => {
                required: ["brokerid": Str, "acctid": Str],
                optional: [],
            },
            "STMTTRN" => {
                required: ["trntype": Str, "dtposted": DateTime, "trnamt": Decimal, "fitid": Str],
                optional: ["name": Str, "memo": Str, "checknum": Str, "refnum": Str, "payee": Str],
            },
            "LEDGERBAL" => {
                required: ["balamt": Decimal, "dtasof": DateTime],
                optional: [],
            },
            "AVAILBAL" => {
                required: ["balamt": Decimal, "dtasof": DateTime],
                optional: [],
            },
            "BAL" => {
                required: ["name": Str, "desc": Str, "baltype": Str, "value": Decimal],
                optional: ["dtasof": DateTime, "curdef": Str],
            },
            "SECID" => {
                required: ["uniqueid": Str, "uniqueidtype": Str],
                optional: [],
            },
            "SECINFO" => {
                required: [],
                optional: ["ticker": Str, "secname": Str, "fiid": Str, "rating": Str, "unitprice": Decimal, "dtasof": DateTime, "memo": Str],
            },
            "INVTRAN" => {
                required: ["fitid": Str, "dttrade": DateTime],
                optional: ["dtsettle": DateTime, "memo": Str],
            },
            "INVBUY" => {
                required: ["units": Decimal, "unitprice": Decimal, "total": Decimal],
                optional: ["commission": Decimal, "fees": Decimal, "taxes": Decimal, "subacctsec": Str, "subacctfund": Str],
            },
            "INVSELL" => {
                required: ["units": Decimal, "unitprice": Decimal, "total": Decimal],
                optional: ["commission": Decimal, "fees": Decimal, "taxes": Decimal, "subacctsec": Str, "subacctfund": Str],
            },
            "INVPOS" => {
                required: ["heldinacct": Str, "postype": Str, "units": Decimal, "unitprice": Decimal, "mktval": Decimal, "dtpriceasof": DateTime],
                optional: ["memo": Str],
            },
            "INVBAL" => {
                required: [],
                optional: ["availcash": Decimal, "marginbalance": Decimal, "shortbalance": Decimal, "buypower": Decimal, "dtasof": DateTime],
            },
            "INCOME" => {
                required: ["incometype": Str, "total": Decimal, "subacctsec": Str, "subacctfund": Str],
                optional: ["taxexempt": Bool, "withholding": Decimal],
            },
        };
        DefaultRegistry { schemas }
    }
}

impl ValidatorRegistry for DefaultRegistry {
    fn validate_leaves(&self, tag: &str, leaves: &HashMap<String, String>) -> Result<HashMap<String, Value>, SchemaError> {
        let schema = match self.schemas.get(tag) {
            Some(s) => s,
            // No schema entry: pass every leaf through as a string. This lets the crate flatten
            // tags outside its named data model (e.g. nested INVTRAN-derived aggregates it
            // doesn't specifically validate) without treating them as a hard failure.
            None => return Ok(leaves.iter().map(|(k, v)| (k.clone(), Value::Str(v.clone()))).collect()),
        };

        let mut remaining = leaves.clone();
        let mut out = HashMap::new();

        for &(key, kind) in schema.required {
            let raw = remaining
                .remove(key)
                .ok_or_else(|| SchemaError::MissingField { tag: tag.to_string(), key: key.to_string() })?;
            out.insert(key.to_string(), kind.coerce(tag, key, &raw)?);
        }
        for &(key, kind) in schema.optional {
            if let Some(raw) = remaining.remove(key) {
                out.insert(key.to_string(), kind.coerce(tag, key, &raw)?);
            }
        }
        if let Some((key, _)) = remaining.into_iter().next() {
            return Err(SchemaError::UnknownField { tag: tag.to_string(), key });
        }
        Ok(out)
    }

    fn bank_tran_type(&self, raw: &str) -> Result<TranType, SchemaError> {
        raw.parse().map_err(|_| SchemaError::UnknownTransactionType(raw.to_string()))
    }

    fn inv_tran_type(&self, tag: &str) -> Result<InvTranType, SchemaError> {
        tag.parse().map_err(|_| SchemaError::UnknownTransactionType(tag.to_string()))
    }

    fn security_info_type(&self, tag: &str) -> Result<SecInfoType, SchemaError> {
        tag.parse().map_err(|_| SchemaError::UnknownTransactionType(tag.to_string()))
    }

    fn position_type(&self, tag: &str) -> Result<PositionType, SchemaError> {
        tag.parse().map_err(|_| SchemaError::UnknownTransactionType(tag.to_string()))
    }

    fn v1_header_fields(&self) -> &'static [&'static str] {
        V1_HEADER_FIELDS
    }

    fn accepted_v1_versions(&self) -> &'static [&'static str] {
        ACCEPTED_V1_VERSIONS
    }

    fn accepted_v2_versions(&self) -> &'static [&'static str] {
        ACCEPTED_V2_VERSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_only_timestamp() {
        let dt = parse_ofx_datetime("20230131").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-01-31 00:00:00");
    }

    #[test]
    fn parses_full_timestamp_with_offset() {
        let dt = parse_ofx_datetime("20230115120000[-5:EST]").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-01-15 17:00:00");
    }

    #[test]
    fn default_registry_rejects_unknown_field() {
        let registry = DefaultRegistry::default();
        let mut leaves = HashMap::new();
        leaves.insert("bankid".to_string(), "123".to_string());
        leaves.insert("acctid".to_string(), "456".to_string());
        leaves.insert("accttype".to_string(), "CHECKING".to_string());
        leaves.insert("bogus".to_string(), "x".to_string());
        let err = registry.validate_leaves("BANKACCTFROM", &leaves).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { .. }));
    }

    #[test]
    fn default_registry_requires_required_fields() {
        let registry = DefaultRegistry::default();
        let leaves = HashMap::new();
        let err = registry.validate_leaves("LEDGERBAL", &leaves).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { .. }));
    }
}
