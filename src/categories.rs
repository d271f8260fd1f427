//! Transaction-kind enumerations used by the validator registry to coerce raw OFX strings into
//! typed values. Both enums derive `EnumString` so a schema entry can call `.parse()` directly.

use strum_macros::{Display, EnumString};

/// The `TRNTYPE` domain for bank and credit-card transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum TranType {
    #[strum(serialize = "CREDIT")]
    Credit,
    #[strum(serialize = "DEBIT")]
    Debit,
    #[strum(serialize = "INT")]
    Interest,
    #[strum(serialize = "DIV")]
    Dividend,
    #[strum(serialize = "FEE")]
    Fee,
    #[strum(serialize = "SRVCHG")]
    ServiceCharge,
    #[strum(serialize = "DEP")]
    Deposit,
    #[strum(serialize = "ATM")]
    Atm,
    #[strum(serialize = "POS")]
    PointOfSale,
    #[strum(serialize = "XFER")]
    Transfer,
    #[strum(serialize = "CHECK")]
    Check,
    #[strum(serialize = "PAYMENT")]
    Payment,
    #[strum(serialize = "CASH")]
    Cash,
    #[strum(serialize = "DIRECTDEP")]
    DirectDeposit,
    #[strum(serialize = "DIRECTDEBIT")]
    DirectDebit,
    #[strum(serialize = "REPEATPMT")]
    RepeatPayment,
    #[strum(serialize = "OTHER")]
    Other,
}

/// The investment transaction domain. Unlike bank transactions, which are uniformly tagged
/// `STMTTRN` with the kind carried in a `TRNTYPE` leaf, each investment transaction kind has its
/// own wrapping tag inside `INVTRANLIST`; this enum is coerced from that tag name directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum InvTranType {
    #[strum(serialize = "BUYDEBT")]
    BuyDebt,
    #[strum(serialize = "BUYMF")]
    BuyMutualFund,
    #[strum(serialize = "BUYOPT")]
    BuyOption,
    #[strum(serialize = "BUYOTHER")]
    BuyOther,
    #[strum(serialize = "BUYSTOCK")]
    BuyStock,
    #[strum(serialize = "CLOSUREOPT")]
    CloseOption,
    #[strum(serialize = "INCOME")]
    Income,
    #[strum(serialize = "INVEXPENSE")]
    InvestmentExpense,
    #[strum(serialize = "JRNLFUND")]
    JournalFund,
    #[strum(serialize = "JRNLSEC")]
    JournalSecurity,
    #[strum(serialize = "MARGININTEREST")]
    MarginInterest,
    #[strum(serialize = "REINVEST")]
    Reinvest,
    #[strum(serialize = "RETOFCAP")]
    ReturnOfCapital,
    #[strum(serialize = "SELLDEBT")]
    SellDebt,
    #[strum(serialize = "SELLMF")]
    SellMutualFund,
    #[strum(serialize = "SELLOPT")]
    SellOption,
    #[strum(serialize = "SELLOTHER")]
    SellOther,
    #[strum(serialize = "SELLSTOCK")]
    SellStock,
    #[strum(serialize = "SPLIT")]
    Split,
    #[strum(serialize = "TRANSFER")]
    Transfer,
}

/// The security-info domain: which `SECLIST` wrapping tag a security was declared under (e.g.
/// `STOCKINFO` for a common stock). Coerced from that wrapping tag's name, not from any leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum SecInfoType {
    #[strum(serialize = "DEBTINFO")]
    Debt,
    #[strum(serialize = "MFINFO")]
    MutualFund,
    #[strum(serialize = "OPTINFO")]
    Option,
    #[strum(serialize = "OTHERINFO")]
    Other,
    #[strum(serialize = "STOCKINFO")]
    Stock,
}

/// The position domain: which `INVPOSLIST` wrapping tag a position was declared under (e.g.
/// `POSSTOCK` for a stock holding). Coerced from that wrapping tag's name, not from any leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum PositionType {
    #[strum(serialize = "POSDEBT")]
    Debt,
    #[strum(serialize = "POSMF")]
    MutualFund,
    #[strum(serialize = "POSOPT")]
    Option,
    #[strum(serialize = "POSOTHER")]
    Other,
    #[strum(serialize = "POSSTOCK")]
    Stock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tran_type_parses_known_codes() {
        assert_eq!(TranType::from_str("DEBIT").unwrap(), TranType::Debit);
        assert_eq!(TranType::from_str("XFER").unwrap(), TranType::Transfer);
    }

    #[test]
    fn tran_type_rejects_unknown_codes() {
        assert!(TranType::from_str("NOTAREALTYPE").is_err());
    }

    #[test]
    fn inv_tran_type_parses_known_tags() {
        assert_eq!(InvTranType::from_str("BUYSTOCK").unwrap(), InvTranType::BuyStock);
        assert_eq!(InvTranType::from_str("INCOME").unwrap(), InvTranType::Income);
    }

    #[test]
    fn sec_info_type_parses_known_wrapping_tags() {
        assert_eq!(SecInfoType::from_str("STOCKINFO").unwrap(), SecInfoType::Stock);
        assert_eq!(SecInfoType::from_str("MFINFO").unwrap(), SecInfoType::MutualFund);
    }

    #[test]
    fn position_type_parses_known_wrapping_tags() {
        assert_eq!(PositionType::from_str("POSSTOCK").unwrap(), PositionType::Stock);
        assert_eq!(PositionType::from_str("POSDEBT").unwrap(), PositionType::Debt);
    }
}
