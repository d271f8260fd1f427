//! Bank and credit-card statement handlers. Credit-card statements share every step with bank
//! statements except the shape of their account aggregate (`CCACCTFROM` vs `BANKACCTFROM`), so a
//! single [`AccountKind`]-parameterized builder serves both.

use super::{handle_ballist, handle_tranlist, take_decimal, take_datetime, take_str, warn_unsupported_sections};
use crate::error::SchemaError;
use crate::flatten::{flatten_skipping, AggregateHandler, Field};
use crate::model::{Account, Balance, BankStatement, Transaction};
use crate::registry::ValidatorRegistry;
use crate::xml::Element;
use std::collections::HashMap;

pub(crate) enum AccountKind {
    Bank,
    CreditCard,
}

fn missing(tag: &str, key: &str) -> SchemaError {
    SchemaError::MissingField { tag: tag.to_string(), key: key.to_string() }
}

pub(crate) fn build_bank_statement(stmtrs: &Element, registry: &dyn ValidatorRegistry) -> Result<BankStatement, SchemaError> {
    build(stmtrs, registry, AccountKind::Bank)
}

pub(crate) fn build_creditcard_statement(ccstmtrs: &Element, registry: &dyn ValidatorRegistry) -> Result<BankStatement, SchemaError> {
    build(ccstmtrs, registry, AccountKind::CreditCard)
}

fn build(stmtrs: &Element, registry: &dyn ValidatorRegistry, kind: AccountKind) -> Result<BankStatement, SchemaError> {
    let handlers: HashMap<&str, &AggregateHandler> = HashMap::new();

    let (start, end, transactions) = match stmtrs.find_child("BANKTRANLIST") {
        Some(tranlist) => handle_tranlist(tranlist, registry, &handlers, &["DTSTART", "DTEND"], |_item, mut fields| build_transaction(registry, &mut fields))?,
        None => (None, None, Vec::new()),
    };

    let ledgerbal_node = stmtrs.find_child("LEDGERBAL").ok_or_else(|| missing(&stmtrs.tag, "LEDGERBAL"))?;
    let ledger_balance = build_balance(ledgerbal_node, registry)?;

    let available_balance = match stmtrs.find_child("AVAILBAL") {
        Some(n) => Some(build_balance(n, registry)?),
        None => None,
    };

    let other_balances = match stmtrs.find_child("BALLIST") {
        Some(n) => handle_ballist(n, registry)?,
        None => HashMap::new(),
    };

    warn_unsupported_sections(stmtrs, &["MKTGINFO"]);

    let skip: &[&str] = &["BANKTRANLIST", "LEDGERBAL", "AVAILBAL", "BALLIST", "MKTGINFO"];
    let mut residual = flatten_skipping(stmtrs, registry, true, &handlers, skip)?;

    let curdef = take_str(&mut residual, "curdef").ok_or_else(|| missing(&stmtrs.tag, "CURDEF"))?;

    let account = match kind {
        AccountKind::Bank => Account::Bank {
            bankid: take_str(&mut residual, "bankid").ok_or_else(|| missing(&stmtrs.tag, "BANKID"))?,
            branchid: take_str(&mut residual, "branchid"),
            acctid: take_str(&mut residual, "acctid").ok_or_else(|| missing(&stmtrs.tag, "ACCTID"))?,
            accttype: take_str(&mut residual, "accttype").ok_or_else(|| missing(&stmtrs.tag, "ACCTTYPE"))?,
        },
        AccountKind::CreditCard => {
            Account::CreditCard { acctid: take_str(&mut residual, "acctid").ok_or_else(|| missing(&stmtrs.tag, "ACCTID"))? }
        }
    };

    Ok(BankStatement { account, curdef, start, end, transactions, ledger_balance, available_balance, other_balances })
}

fn build_transaction(registry: &dyn ValidatorRegistry, fields: &mut HashMap<String, Field>) -> Result<Transaction, SchemaError> {
    let trntype = take_str(fields, "trntype").ok_or_else(|| missing("STMTTRN", "TRNTYPE"))?;
    Ok(Transaction {
        kind: registry.bank_tran_type(&trntype)?,
        fitid: take_str(fields, "fitid").ok_or_else(|| missing("STMTTRN", "FITID"))?,
        dtposted: take_datetime(fields, "dtposted").ok_or_else(|| missing("STMTTRN", "DTPOSTED"))?,
        trnamt: take_decimal(fields, "trnamt").ok_or_else(|| missing("STMTTRN", "TRNAMT"))?,
        name: take_str(fields, "name"),
        memo: take_str(fields, "memo"),
        checknum: take_str(fields, "checknum"),
        refnum: take_str(fields, "refnum"),
        payee: take_str(fields, "payee"),
    })
}

fn build_balance(node: &Element, registry: &dyn ValidatorRegistry) -> Result<Balance, SchemaError> {
    let handlers: HashMap<&str, &AggregateHandler> = HashMap::new();
    let mut fields = flatten_skipping(node, registry, true, &handlers, &[])?;
    Ok(Balance {
        amount: take_decimal(&mut fields, "balamt").ok_or_else(|| missing(&node.tag, "BALAMT"))?,
        dtasof: take_datetime(&mut fields, "dtasof").ok_or_else(|| missing(&node.tag, "DTASOF"))?,
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
    fn builds_minimal_bank_statement() {
        let mut stmtrs = Element::new("STMTRS");
        stmtrs.children.push(leaf("CURDEF", "USD"));

        let mut acctfrom = Element::new("BANKACCTFROM");
        acctfrom.children.push(leaf("BANKID", "123456789"));
        acctfrom.children.push(leaf("ACCTID", "000111"));
        acctfrom.children.push(leaf("ACCTTYPE", "CHECKING"));
        stmtrs.children.push(acctfrom);

        let mut tranlist = Element::new("BANKTRANLIST");
        tranlist.children.push(leaf("DTSTART", "20230101"));
        tranlist.children.push(leaf("DTEND", "20230131"));
        let mut trn = Element::new("STMTTRN");
        trn.children.push(leaf("TRNTYPE", "DEBIT"));
        trn.children.push(leaf("DTPOSTED", "20230115"));
        trn.children.push(leaf("TRNAMT", "-42.50"));
        trn.children.push(leaf("FITID", "1001"));
        trn.children.push(leaf("NAME", "Gas station"));
        tranlist.children.push(trn);
        stmtrs.children.push(tranlist);

        let mut ledgerbal = Element::new("LEDGERBAL");
        ledgerbal.children.push(leaf("BALAMT", "100.00"));
        ledgerbal.children.push(leaf("DTASOF", "20230131"));
        stmtrs.children.push(ledgerbal);

        let registry = DefaultRegistry::default();
        let statement = build_bank_statement(&stmtrs, &registry).unwrap();

        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].name.as_deref(), Some("Gas station"));
        assert!(statement.available_balance.is_none());
        match statement.account {
            Account::Bank { bankid, .. } => assert_eq!(bankid, "123456789"),
            _ => panic!("expected bank account"),
        }
    }
}
