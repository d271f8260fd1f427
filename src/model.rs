//! The typed records produced by the statement handlers (component E). See `SPEC_FULL.md` §3.

use crate::categories::{InvTranType, PositionType, SecInfoType, TranType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// An account, keyed by the statement kind that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    Bank { bankid: String, branchid: Option<String>, acctid: String, accttype: String },
    CreditCard { acctid: String },
    Investment { brokerid: String, acctid: String },
}

/// A bank or credit-card transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub kind: TranType,
    pub fitid: String,
    pub dtposted: DateTime<Utc>,
    pub trnamt: Decimal,
    pub name: Option<String>,
    pub memo: Option<String>,
    pub checknum: Option<String>,
    pub refnum: Option<String>,
    pub payee: Option<String>,
}

/// A security referenced from `SECLIST`, uniquely identified within a document by
/// `(uniqueidtype, uniqueid)`. `kind` is derived from the `SECLIST` wrapping tag (e.g.
/// `STOCKINFO`), not from any leaf of the security itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Security {
    pub kind: SecInfoType,
    pub uniqueidtype: String,
    pub uniqueid: String,
    pub ticker: Option<String>,
    pub secname: Option<String>,
}

/// An investment transaction. `secid` is `None` for investment transaction kinds that carry no
/// security reference (e.g. plain cash `INCOME`, `MARGININTEREST`).
#[derive(Debug, Clone, PartialEq)]
pub struct InvTransaction {
    pub kind: InvTranType,
    pub fitid: String,
    pub dttrade: DateTime<Utc>,
    pub dtsettle: Option<DateTime<Utc>>,
    pub secid: Option<Arc<Security>>,
    pub units: Option<Decimal>,
    pub unitprice: Option<Decimal>,
    pub total: Option<Decimal>,
    pub memo: Option<String>,
}

/// A holding within `INVPOSLIST`. The flattener surfaces a transient `unitprice`/`dtpriceasof`
/// pair on the raw aggregate; the investment handler splits that pair into the statement's
/// separate `prices` collection immediately after constructing this record, so by the time a
/// `Position` is exposed here it carries no price of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub kind: PositionType,
    pub secid: Arc<Security>,
    pub heldinacct: String,
    pub postype: String,
    pub units: Decimal,
    pub mktval: Decimal,
}

/// A price observation, extracted from a `Position` at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub secid: Arc<Security>,
    pub unitprice: Decimal,
    pub dtpriceasof: DateTime<Utc>,
}

/// A named balance, as found in `BALLIST`/`INVBAL/BALLIST`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedBalance {
    pub desc: String,
    pub baltype: String,
    pub value: Decimal,
    pub dtasof: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub amount: Decimal,
    pub dtasof: DateTime<Utc>,
}

/// A bank or credit-card statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BankStatement {
    pub account: Account,
    pub curdef: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub transactions: Vec<Transaction>,
    pub ledger_balance: Balance,
    pub available_balance: Option<Balance>,
    pub other_balances: HashMap<String, NamedBalance>,
}

/// An investment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentStatement {
    pub account: Account,
    pub curdef: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub transactions: Vec<InvTransaction>,
    pub positions: Vec<Position>,
    pub prices: Vec<Price>,
    pub securities: HashMap<(String, String), Arc<Security>>,
    pub other_balances: HashMap<String, NamedBalance>,
    pub availcash: Option<Decimal>,
    pub marginbalance: Option<Decimal>,
    pub shortbalance: Option<Decimal>,
    pub buypower: Option<Decimal>,
    pub dtasof: Option<DateTime<Utc>>,
}
