//! A permissive parser for Open Financial Exchange (OFX) bank, credit-card, and investment
//! statements, covering both the SGML-based v1 dialect and the well-formed-XML v2 dialect.
//!
//! The entry point is [`OfxParser`]; construct one, call [`OfxParser::parse`] with an
//! [`OfxSource`], and read off whichever of `bank_statement`, `creditcard_statement`, and
//! `investment_statement` the document populated.

mod categories;
mod error;
mod facade;
mod flatten;
mod header;
mod model;
mod registry;
mod statement;
mod xml;

pub use error::{HeaderError, OfxError, ReferenceError, SchemaError};
pub use facade::{OfxParser, OfxSource};
pub use model::{
    Account, Balance, BankStatement, InvTransaction, InvestmentStatement, NamedBalance, Position, Price, Security, Transaction,
};
