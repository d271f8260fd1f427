//! Investment statement handler. The most involved of the three: it builds the document's
//! security map up front from `SECLIST`, registers `handle_SECID` so every subsequent transaction
//! and position resolves its security reference through that map, and splits each position's
//! transient price observation into the statement's separate `prices` collection.

use super::{handle_ballist, handle_tranlist, take_decimal, take_secid_ref, take_str, take_datetime, warn_unsupported_sections};
use crate::error::{ReferenceError, SchemaError};
use crate::flatten::{flatten_skipping, AggregateHandler, Field};
use crate::model::{Account, InvTransaction, InvestmentStatement, Position, Price, Security};
use crate::registry::{Value, ValidatorRegistry};
use crate::xml::Element;
use std::collections::HashMap;
use std::sync::Arc;

fn missing(tag: &str, key: &str) -> SchemaError {
    SchemaError::MissingField { tag: tag.to_string(), key: key.to_string() }
}

/// Build the document's `(uniqueidtype, uniqueid) -> Security` map from `SECLIST`. Each `SECID`
/// subtree is walked manually, not through the generic flattener, so that the dedicated
/// `handle_SECID` dispatch (registered only for the transaction/position pass that follows) can't
/// accidentally fire while securities are still being built.
fn build_securities(seclist: &Element, registry: &dyn ValidatorRegistry) -> Result<HashMap<(String, String), Arc<Security>>, SchemaError> {
    let mut out = HashMap::new();
    let handlers: HashMap<&str, &AggregateHandler> = HashMap::new();

    for wrapper in seclist.iter_children() {
        let kind = registry.security_info_type(&wrapper.tag)?;
        let secinfo = wrapper.find_child("SECINFO").unwrap_or(wrapper);
        let secid_node = secinfo.find_child("SECID").ok_or_else(|| missing(&secinfo.tag, "SECID"))?;

        let mut secid_leaves = HashMap::new();
        for leaf in secid_node.iter_children().filter(|c| c.is_leaf()) {
            secid_leaves.insert(leaf.tag.to_lowercase(), leaf.text_trimmed().to_string());
        }
        let typed = registry.validate_leaves("SECID", &secid_leaves)?;
        let uniqueidtype = typed.get("uniqueidtype").and_then(Value::as_str).map(str::to_string).ok_or_else(|| missing("SECID", "uniqueidtype"))?;
        let uniqueid = typed.get("uniqueid").and_then(Value::as_str).map(str::to_string).ok_or_else(|| missing("SECID", "uniqueid"))?;

        let mut fields = flatten_skipping(secinfo, registry, true, &handlers, &["SECID"])?;
        let ticker = take_str(&mut fields, "ticker");
        let secname = take_str(&mut fields, "secname");

        let key = (uniqueidtype.clone(), uniqueid.clone());
        out.insert(key, Arc::new(Security { kind, uniqueidtype, uniqueid, ticker, secname }));
    }
    Ok(out)
}

/// The aggregate handler registered for `SECID` once securities have been built: it leaves
/// resolution to the caller (see [`take_secid_ref`]) rather than resolving eagerly, so an
/// unresolved reference surfaces as [`ReferenceError`] from this module instead of a
/// [`SchemaError`] from the flattener.
fn handle_secid(registry: &dyn ValidatorRegistry, elem: &Element) -> Result<HashMap<String, Field>, SchemaError> {
    let mut leaves = HashMap::new();
    for leaf in elem.iter_children().filter(|c| c.is_leaf()) {
        leaves.insert(leaf.tag.to_lowercase(), leaf.text_trimmed().to_string());
    }
    let typed = registry.validate_leaves("SECID", &leaves)?;
    let uniqueidtype = typed.get("uniqueidtype").and_then(Value::as_str).map(str::to_string).ok_or_else(|| missing("SECID", "uniqueidtype"))?;
    let uniqueid = typed.get("uniqueid").and_then(Value::as_str).map(str::to_string).ok_or_else(|| missing("SECID", "uniqueid"))?;
    let mut out = HashMap::new();
    out.insert("secid".to_string(), Field::SecIdRef { uniqueidtype, uniqueid });
    Ok(out)
}

fn resolve(securities: &HashMap<(String, String), Arc<Security>>, reference: (String, String)) -> Result<Arc<Security>, ReferenceError> {
    securities
        .get(&reference)
        .cloned()
        .ok_or_else(|| ReferenceError { uniqueidtype: reference.0, uniqueid: reference.1 })
}

pub(crate) fn build_investment_statement(
    invstmtrs: &Element,
    seclist: Option<&Element>,
    registry: &dyn ValidatorRegistry,
) -> Result<InvestmentStatement, crate::error::OfxError> {
    let securities = match seclist {
        Some(s) => build_securities(s, registry)?,
        None => HashMap::new(),
    };

    let handle_secid_bound = |elem: &Element| handle_secid(registry, elem);
    let mut handlers: HashMap<&str, &AggregateHandler> = HashMap::new();
    handlers.insert("SECID", &handle_secid_bound);

    let acctfrom = invstmtrs.find_child("INVACCTFROM");

    let (start, end, transactions) = match invstmtrs.find_descendant("INVTRANLIST") {
        Some(tranlist) => {
            handle_tranlist(tranlist, registry, &handlers, &["DTSTART", "DTEND"], |item, mut fields| build_inv_transaction(registry, &securities, item, &mut fields))?
        }
        None => (None, None, Vec::new()),
    };

    let mut positions = Vec::new();
    let mut prices = Vec::new();
    if let Some(poslist) = invstmtrs.find_descendant("INVPOSLIST") {
        for pos_wrapper in poslist.iter_children() {
            let kind = registry.position_type(&pos_wrapper.tag)?;
            let invpos = pos_wrapper.find_child("INVPOS").unwrap_or(pos_wrapper);
            let mut fields = flatten_skipping(invpos, registry, true, &handlers, &[])?;
            let secid_ref = take_secid_ref(&mut fields, "secid").ok_or_else(|| missing(&invpos.tag, "SECID"))?;
            let security = resolve(&securities, secid_ref)?;

            let unitprice = take_decimal(&mut fields, "unitprice").ok_or_else(|| missing(&invpos.tag, "UNITPRICE"))?;
            let dtpriceasof = take_datetime(&mut fields, "dtpriceasof").ok_or_else(|| missing(&invpos.tag, "DTPRICEASOF"))?;
            prices.push(Price { secid: security.clone(), unitprice, dtpriceasof });

            positions.push(Position {
                kind,
                secid: security,
                heldinacct: take_str(&mut fields, "heldinacct").ok_or_else(|| missing(&invpos.tag, "HELDINACCT"))?,
                postype: take_str(&mut fields, "postype").ok_or_else(|| missing(&invpos.tag, "POSTYPE"))?,
                units: take_decimal(&mut fields, "units").ok_or_else(|| missing(&invpos.tag, "UNITS"))?,
                mktval: take_decimal(&mut fields, "mktval").ok_or_else(|| missing(&invpos.tag, "MKTVAL"))?,
            });
        }
    }

    let mut other_balances = HashMap::new();
    let mut availcash = None;
    let mut marginbalance = None;
    let mut shortbalance = None;
    let mut buypower = None;
    let mut dtasof = None;
    if let Some(invbal) = invstmtrs.find_child("INVBAL") {
        if let Some(ballist) = invbal.find_child("BALLIST") {
            other_balances = handle_ballist(ballist, registry)?;
        }
        let mut fields = flatten_skipping(invbal, registry, true, &handlers, &["BALLIST"])?;
        availcash = take_decimal(&mut fields, "availcash");
        marginbalance = take_decimal(&mut fields, "marginbalance");
        shortbalance = take_decimal(&mut fields, "shortbalance");
        buypower = take_decimal(&mut fields, "buypower");
        dtasof = take_datetime(&mut fields, "dtasof");
    }

    warn_unsupported_sections(invstmtrs, &["INVOOLIST", "INV401K", "INV401KBAL", "MKTGINFO"]);

    let skip: &[&str] = &["INVTRANLIST", "INVPOSLIST", "INVBAL", "INVOOLIST", "INV401K", "INV401KBAL", "MKTGINFO", "SECLIST", "INVACCTFROM"];
    let mut residual = flatten_skipping(invstmtrs, registry, true, &handlers, skip)?;
    let curdef = take_str(&mut residual, "curdef").ok_or_else(|| missing(&invstmtrs.tag, "CURDEF"))?;

    let acctfrom_node = acctfrom.ok_or_else(|| missing(&invstmtrs.tag, "INVACCTFROM"))?;
    let mut acct_fields = flatten_skipping(acctfrom_node, registry, true, &handlers, &[])?;
    let account = Account::Investment {
        brokerid: take_str(&mut acct_fields, "brokerid").ok_or_else(|| missing("INVACCTFROM", "BROKERID"))?,
        acctid: take_str(&mut acct_fields, "acctid").ok_or_else(|| missing("INVACCTFROM", "ACCTID"))?,
    };

    Ok(InvestmentStatement {
        account,
        curdef,
        start,
        end,
        transactions,
        positions,
        prices,
        securities,
        other_balances,
        availcash,
        marginbalance,
        shortbalance,
        buypower,
        dtasof,
    })
}

fn build_inv_transaction(
    registry: &dyn ValidatorRegistry,
    securities: &HashMap<(String, String), Arc<Security>>,
    item: &Element,
    fields: &mut HashMap<String, Field>,
) -> Result<InvTransaction, crate::error::OfxError> {
    let kind = registry.inv_tran_type(&item.tag)?;
    let secid = match take_secid_ref(fields, "secid") {
        Some(reference) => Some(resolve(securities, reference)?),
        None => None,
    };
    Ok(InvTransaction {
        kind,
        fitid: take_str(fields, "fitid").ok_or_else(|| missing(&item.tag, "FITID"))?,
        dttrade: take_datetime(fields, "dttrade").ok_or_else(|| missing(&item.tag, "DTTRADE"))?,
        dtsettle: take_datetime(fields, "dtsettle"),
        secid,
        units: take_decimal(fields, "units"),
        unitprice: take_decimal(fields, "unitprice"),
        total: take_decimal(fields, "total"),
        memo: take_str(fields, "memo"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DefaultRegistry;

    fn leaf(tag: &str, text: &str) -> Element {
        let mut e = Element::new(tag);
        e.text = text.to_string();
        e
    }

    #[test]
    fn resolves_secid_across_transaction_and_position() {
        let mut seclist = Element::new("SECLIST");
        let mut stockinfo = Element::new("STOCKINFO");
        let mut secinfo = Element::new("SECINFO");
        let mut secid = Element::new("SECID");
        secid.children.push(leaf("UNIQUEID", "X"));
        secid.children.push(leaf("UNIQUEIDTYPE", "CUSIP"));
        secinfo.children.push(secid);
        secinfo.children.push(leaf("TICKER", "ABC"));
        stockinfo.children.push(secinfo);
        seclist.children.push(stockinfo);

        let mut invstmtrs = Element::new("INVSTMTRS");
        invstmtrs.children.push(leaf("CURDEF", "USD"));
        let mut acctfrom = Element::new("INVACCTFROM");
        acctfrom.children.push(leaf("BROKERID", "broker1"));
        acctfrom.children.push(leaf("ACCTID", "acct1"));
        invstmtrs.children.push(acctfrom);

        let mut invtranlist = Element::new("INVTRANLIST");
        invtranlist.children.push(leaf("DTSTART", "20230101"));
        invtranlist.children.push(leaf("DTEND", "20230131"));
        let mut buystock = Element::new("BUYSTOCK");
        let mut inner_secid = Element::new("SECID");
        inner_secid.children.push(leaf("UNIQUEID", "X"));
        inner_secid.children.push(leaf("UNIQUEIDTYPE", "CUSIP"));
        buystock.children.push(inner_secid);
        buystock.children.push(leaf("FITID", "T1"));
        buystock.children.push(leaf("DTTRADE", "20230110"));
        buystock.children.push(leaf("UNITS", "10"));
        buystock.children.push(leaf("UNITPRICE", "5.00"));
        buystock.children.push(leaf("TOTAL", "-50.00"));
        invtranlist.children.push(buystock);
        invstmtrs.children.push(invtranlist);

        let mut invposlist = Element::new("INVPOSLIST");
        let mut posstock = Element::new("POSSTOCK");
        let mut invpos = Element::new("INVPOS");
        let mut pos_secid = Element::new("SECID");
        pos_secid.children.push(leaf("UNIQUEID", "X"));
        pos_secid.children.push(leaf("UNIQUEIDTYPE", "CUSIP"));
        invpos.children.push(pos_secid);
        invpos.children.push(leaf("HELDINACCT", "CASH"));
        invpos.children.push(leaf("POSTYPE", "LONG"));
        invpos.children.push(leaf("UNITS", "10"));
        invpos.children.push(leaf("UNITPRICE", "5.50"));
        invpos.children.push(leaf("MKTVAL", "55.00"));
        invpos.children.push(leaf("DTPRICEASOF", "20230131"));
        posstock.children.push(invpos);
        invposlist.children.push(posstock);
        invstmtrs.children.push(invposlist);

        let registry = DefaultRegistry::default();
        let statement = build_investment_statement(&invstmtrs, Some(&seclist), &registry).unwrap();

        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.positions.len(), 1);
        assert_eq!(statement.prices.len(), 1);
        let security = statement.transactions[0].secid.as_ref().unwrap();
        assert!(Arc::ptr_eq(security, &statement.positions[0].secid));
        assert_eq!(statement.prices[0].unitprice.to_string(), "5.50");
        assert_eq!(security.kind, crate::categories::SecInfoType::Stock);
        assert_eq!(statement.positions[0].kind, crate::categories::PositionType::Stock);
    }

    #[test]
    fn unresolved_secid_is_a_reference_error() {
        let mut invstmtrs = Element::new("INVSTMTRS");
        invstmtrs.children.push(leaf("CURDEF", "USD"));
        let mut acctfrom = Element::new("INVACCTFROM");
        acctfrom.children.push(leaf("BROKERID", "broker1"));
        acctfrom.children.push(leaf("ACCTID", "acct1"));
        invstmtrs.children.push(acctfrom);

        let mut invposlist = Element::new("INVPOSLIST");
        let mut posstock = Element::new("POSSTOCK");
        let mut invpos = Element::new("INVPOS");
        let mut pos_secid = Element::new("SECID");
        pos_secid.children.push(leaf("UNIQUEID", "UNKNOWN"));
        pos_secid.children.push(leaf("UNIQUEIDTYPE", "CUSIP"));
        invpos.children.push(pos_secid);
        invpos.children.push(leaf("HELDINACCT", "CASH"));
        invpos.children.push(leaf("POSTYPE", "LONG"));
        invpos.children.push(leaf("UNITS", "10"));
        invpos.children.push(leaf("UNITPRICE", "5.50"));
        invpos.children.push(leaf("MKTVAL", "55.00"));
        invpos.children.push(leaf("DTPRICEASOF", "20230131"));
        posstock.children.push(invpos);
        invposlist.children.push(posstock);
        invstmtrs.children.push(invposlist);

        let registry = DefaultRegistry::default();
        let err = build_investment_statement(&invstmtrs, None, &registry).unwrap_err();
        assert!(matches!(err, crate::error::OfxError::Reference(_)));
    }

    #[test]
    fn invbal_ballist_is_extracted_and_residual_fields_survive() {
        let mut invstmtrs = Element::new("INVSTMTRS");
        invstmtrs.children.push(leaf("CURDEF", "USD"));
        let mut acctfrom = Element::new("INVACCTFROM");
        acctfrom.children.push(leaf("BROKERID", "broker1"));
        acctfrom.children.push(leaf("ACCTID", "acct1"));
        invstmtrs.children.push(acctfrom);

        let mut invbal = Element::new("INVBAL");
        invbal.children.push(leaf("AVAILCASH", "123.45"));

        let mut ballist = Element::new("BALLIST");
        let mut bal1 = Element::new("BAL");
        bal1.children.push(leaf("NAME", "NETWORTH"));
        bal1.children.push(leaf("DESC", "Net worth"));
        bal1.children.push(leaf("BALTYPE", "DOLLAR"));
        bal1.children.push(leaf("VALUE", "1000.00"));
        let mut bal2 = Element::new("BAL");
        bal2.children.push(leaf("NAME", "ACCRUEDINT"));
        bal2.children.push(leaf("DESC", "Accrued interest"));
        bal2.children.push(leaf("BALTYPE", "DOLLAR"));
        bal2.children.push(leaf("VALUE", "5.00"));
        ballist.children.push(bal1);
        ballist.children.push(bal2);
        invbal.children.push(ballist);
        invstmtrs.children.push(invbal);

        let registry = DefaultRegistry::default();
        let statement = build_investment_statement(&invstmtrs, None, &registry).unwrap();

        assert_eq!(statement.other_balances.len(), 2);
        assert!(statement.other_balances.contains_key("NETWORTH"));
        assert!(statement.other_balances.contains_key("ACCRUEDINT"));
        assert_eq!(statement.availcash.unwrap().to_string(), "123.45");
    }
}
