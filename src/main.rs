//! CLI front end (component outside the core's architectural scope, specified only for parity
//! with the original tool): parses one OFX file and reports which statements it found.

use clap::Parser;
use ofx_ingest::{OfxParser, OfxSource};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse an OFX (v1 SGML or v2 XML) bank/credit-card/investment statement file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The OFX file to parse.
    file: PathBuf,

    /// Try the lenient SGML back-end first instead of falling back to it on a strict-parse error.
    #[arg(short, long)]
    lenient: bool,

    /// Enable verbose parser tracing (logs every tree-builder state transition).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut parser = OfxParser::new();
    let source = OfxSource::from_path(&args.file);
    let result = if args.lenient { parser.parse_lenient(source) } else { parser.parse(source) };

    if let Err(e) = result {
        eprintln!("error parsing {}: {e}", args.file.display());
        return ExitCode::FAILURE;
    }

    if let Some(stmt) = &parser.bank_statement {
        println!("bank statement: {} transactions, ledger balance {}", stmt.transactions.len(), stmt.ledger_balance.amount);
    }
    if let Some(stmt) = &parser.creditcard_statement {
        println!("credit-card statement: {} transactions, ledger balance {}", stmt.transactions.len(), stmt.ledger_balance.amount);
    }
    if let Some(stmt) = &parser.investment_statement {
        println!(
            "investment statement: {} transactions, {} positions, {} securities",
            stmt.transactions.len(),
            stmt.positions.len(),
            stmt.securities.len()
        );
    }
    if parser.bank_statement.is_none() && parser.creditcard_statement.is_none() && parser.investment_statement.is_none() {
        println!("no recognized statement found in {}", args.file.display());
    }

    ExitCode::SUCCESS
}
