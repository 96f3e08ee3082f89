//! Options command - selectable years, months and dimension values

use super::{load_ledger, LedgerArgs};
use clap::Args;
use pnlc::core::filter_options;

#[derive(Args, Debug)]
pub struct OptionsCommand {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl OptionsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = load_ledger(&self.ledger.file)?;
        let options = filter_options(&ledger);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&options)?);
            return Ok(());
        }

        println!("Rows: {}", ledger.rows().len());
        println!("Years: {}", options.years.join(", "));
        println!("Months: {}", options.months.join(", "));
        for (dimension, values) in &options.dimensions {
            println!("{} ({}): {}", dimension.column(), values.len(), values.join(", "));
        }
        Ok(())
    }
}
