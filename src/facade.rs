//! Component F: the public facade. `OfxParser` drives the header reader, the tree builder, and
//! the statement handlers in sequence and exposes the (up to three) resulting statements.

use crate::error::OfxError;
use crate::header::read_header;
use crate::registry::{DefaultRegistry, ValidatorRegistry};
use crate::statement::{bank, investment};
use crate::xml;
use crate::{BankStatement, InvestmentStatement};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where an OFX document comes from. A path is read fully into memory before parsing; a byte
/// buffer is used as-is. Either way the parser owns a single, self-contained copy of the document
/// for the duration of `parse`, so the strict/lenient fallback in §4.B never needs to re-read or
/// seek an external resource.
pub enum OfxSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl OfxSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        OfxSource::Path(path.as_ref().to_path_buf())
    }

    fn into_bytes(self) -> Result<Vec<u8>, OfxError> {
        match self {
            OfxSource::Path(path) => std::fs::read(&path).map_err(|e| OfxError::Io(format!("{}: {e}", path.display()))),
            OfxSource::Bytes(bytes) => Ok(bytes),
        }
    }
}

/// The crate's entry point. One parser instance corresponds to one parsed document at a time;
/// call [`OfxParser::reset`] before reusing an instance for a different source.
pub struct OfxParser {
    registry: Arc<dyn ValidatorRegistry>,
    pub bank_statement: Option<BankStatement>,
    pub creditcard_statement: Option<BankStatement>,
    pub investment_statement: Option<InvestmentStatement>,
}

impl Default for OfxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OfxParser {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(DefaultRegistry::default()))
    }

    /// Construct a parser backed by a caller-supplied validator registry, in place of the
    /// crate's built-in schema.
    pub fn with_registry(registry: Arc<dyn ValidatorRegistry>) -> Self {
        OfxParser { registry, bank_statement: None, creditcard_statement: None, investment_statement: None }
    }

    /// Clear any statements from a previous parse. The registry is retained.
    pub fn reset(&mut self) {
        self.bank_statement = None;
        self.creditcard_statement = None;
        self.investment_statement = None;
    }

    /// Parse `source`, trying the strict XML back-end first and falling back to the lenient SGML
    /// back-end on a syntax error.
    pub fn parse(&mut self, source: OfxSource) -> Result<(), OfxError> {
        self.parse_with(source, false)
    }

    /// Parse `source` using only the lenient SGML back-end, skipping the strict attempt.
    pub fn parse_lenient(&mut self, source: OfxSource) -> Result<(), OfxError> {
        self.parse_with(source, true)
    }

    fn parse_with(&mut self, source: OfxSource, prefer_lenient: bool) -> Result<(), OfxError> {
        let bytes = source.into_bytes()?;
        let (_header, offset) = read_header(&bytes, self.registry.as_ref())?;
        let body = &bytes[offset..];

        let root = xml::build_tree(body, prefer_lenient).map_err(|e| OfxError::Tree(e.to_string()))?;

        if let Some(stmtrs) = root.find_descendant("STMTRS") {
            self.bank_statement = Some(bank::build_bank_statement(stmtrs, self.registry.as_ref())?);
        }
        if let Some(ccstmtrs) = root.find_descendant("CCSTMTRS") {
            self.creditcard_statement = Some(bank::build_creditcard_statement(ccstmtrs, self.registry.as_ref())?);
        }
        if let Some(invstmtrs) = root.find_descendant("INVSTMTRS") {
            let seclist = root.find_descendant("SECLIST");
            self.investment_statement = Some(investment::build_investment_statement(invstmtrs, seclist, self.registry.as_ref())?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_bank_document() -> Vec<u8> {
        concat!(
            "OFXHEADER:100\r\n",
            "DATA:OFXSGML\r\n",
            "VERSION:102\r\n",
            "SECURITY:NONE\r\n",
            "ENCODING:USASCII\r\n",
            "CHARSET:1252\r\n",
            "COMPRESSION:NONE\r\n",
            "OLDFILEUID:NONE\r\n",
            "NEWFILEUID:NONE\r\n",
            "\r\n",
            "<OFX>\n",
            "<BANKMSGSRSV1><STMTTRNRS><STMTRS>\n",
            "<CURDEF>USD\n",
            "<BANKACCTFROM>\n",
            "<BANKID>123456789\n",
            "<ACCTID>000111\n",
            "<ACCTTYPE>CHECKING\n",
            "</BANKACCTFROM>\n",
            "<BANKTRANLIST>\n",
            "<DTSTART>20230101\n",
            "<DTEND>20230131\n",
            "<STMTTRN>\n",
            "<TRNTYPE>DEBIT\n",
            "<DTPOSTED>20230115\n",
            "<TRNAMT>-42.50\n",
            "<FITID>1001\n",
            "<NAME>Gas station\n",
            "</STMTTRN>\n",
            "<STMTTRN>\n",
            "<TRNTYPE>CREDIT\n",
            "<DTPOSTED>20230120\n",
            "<TRNAMT>500.00\n",
            "<FITID>1002\n",
            "<NAME>Payroll\n",
            "</STMTTRN>\n",
            "</BANKTRANLIST>\n",
            "<LEDGERBAL>\n",
            "<BALAMT>100.00\n",
            "<DTASOF>20230131\n",
            "</LEDGERBAL>\n",
            "</STMTRS></STMTTRNRS></BANKMSGSRSV1>\n",
            "</OFX>\n",
        )
        .as_bytes()
        .to_vec()
    }

    #[test]
    fn parses_minimal_v1_bank_statement_end_to_end() {
        let mut parser = OfxParser::new();
        parser.parse(OfxSource::Bytes(v1_bank_document())).unwrap();

        let stmt = parser.bank_statement.expect("bank statement");
        assert_eq!(stmt.transactions.len(), 2);
        assert_eq!(stmt.ledger_balance.amount.to_string(), "100.00");
        match stmt.account {
            crate::Account::Bank { ref bankid, .. } => assert_eq!(bankid, "123456789"),
            _ => panic!("expected bank account"),
        }
    }

    #[test]
    fn unclosed_v1_leaves_parse_identically_via_lenient_fallback() {
        let mut strict_parser = OfxParser::new();
        strict_parser.parse(OfxSource::Bytes(v1_bank_document())).unwrap();

        let mut lenient_parser = OfxParser::new();
        lenient_parser.parse_lenient(OfxSource::Bytes(v1_bank_document())).unwrap();

        assert_eq!(strict_parser.bank_statement, lenient_parser.bank_statement);
    }

    #[test]
    fn reset_clears_prior_statements() {
        let mut parser = OfxParser::new();
        parser.parse(OfxSource::Bytes(v1_bank_document())).unwrap();
        assert!(parser.bank_statement.is_some());
        parser.reset();
        assert!(parser.bank_statement.is_none());
    }

    fn v2_credit_document() -> Vec<u8> {
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<?OFX OFXHEADER=\"200\" VERSION=\"211\" SECURITY=\"NONE\" OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>\n",
            "<OFX>\n",
            "<CREDITCARDMSGSRSV1><CCSTMTTRNRS><CCSTMTRS>\n",
            "<CURDEF>USD</CURDEF>\n",
            "<CCACCTFROM><ACCTID>4000111122223333</ACCTID></CCACCTFROM>\n",
            "<BANKTRANLIST>\n",
            "<DTSTART>20230101</DTSTART><DTEND>20230131</DTEND>\n",
            "<STMTTRN>\n",
            "<TRNTYPE>DEBIT</TRNTYPE>\n",
            "<DTPOSTED>20230110</DTPOSTED>\n",
            "<TRNAMT>-19.99</TRNAMT>\n",
            "<FITID>C1</FITID>\n",
            "<NAME>Coffee shop</NAME>\n",
            "</STMTTRN>\n",
            "</BANKTRANLIST>\n",
            "<LEDGERBAL><BALAMT>-19.99</BALAMT><DTASOF>20230131</DTASOF></LEDGERBAL>\n",
            "</CCSTMTRS></CCSTMTTRNRS></CREDITCARDMSGSRSV1>\n",
            "</OFX>\n",
        )
        .as_bytes()
        .to_vec()
    }

    #[test]
    fn parses_v2_credit_card_statement_with_no_availbal() {
        let mut parser = OfxParser::new();
        parser.parse(OfxSource::Bytes(v2_credit_document())).unwrap();

        let stmt = parser.creditcard_statement.expect("credit-card statement");
        assert_eq!(stmt.transactions.len(), 1);
        assert!(stmt.available_balance.is_none());
        match stmt.account {
            crate::Account::CreditCard { ref acctid } => assert_eq!(acctid, "4000111122223333"),
            _ => panic!("expected credit-card account"),
        }
    }

    #[test]
    fn v2_body_yields_the_same_statement_whether_strict_or_lenient() {
        let mut strict_parser = OfxParser::new();
        strict_parser.parse(OfxSource::Bytes(v2_credit_document())).unwrap();

        let mut lenient_parser = OfxParser::new();
        lenient_parser.parse_lenient(OfxSource::Bytes(v2_credit_document())).unwrap();

        assert_eq!(strict_parser.creditcard_statement, lenient_parser.creditcard_statement);
    }
}
