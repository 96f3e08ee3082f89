//! Ledger command - the derived table as CSV

use super::{load_ledger, LedgerArgs};
use clap::Args;
use std::io;

#[derive(Args, Debug)]
pub struct LedgerCommand {
    #[command(flatten)]
    ledger: LedgerArgs,
}

impl LedgerCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = load_ledger(&self.ledger.file)?;
        ledger.write_csv(io::stdout())?;
        Ok(())
    }
}
