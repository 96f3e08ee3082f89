//! Breakdown command - totals per organizational dimension with a grand total

use super::display::variance_table;
use super::records::write_breakdown;
use super::{AnalysisArgs, DimensionArg};
use clap::Args;
use pnlc::core::analyze;
use std::io;

#[derive(Args, Debug)]
pub struct BreakdownCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Dimension to break down by. 사업부 and 브랜드 also split by the levels below them
    #[arg(long, value_enum, default_value_t = DimensionArg::Campus)]
    by: DimensionArg,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

impl BreakdownCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self.analysis.request(&ledger).dimension(self.by.into());
        let report = analyze(&ledger, &request);

        if self.csv {
            return write_breakdown(&report, io::stdout());
        }

        let heading = report
            .breakdown_keys
            .iter()
            .map(|d| d.column())
            .collect::<Vec<_>>()
            .join(" / ");
        println!();
        println!("BREAKDOWN BY {} {}", heading, self.analysis.describe(&request));
        println!();
        if report.breakdown.is_empty() {
            println!("No rows match the selected period and filters.");
            return Ok(());
        }

        let rows = report
            .breakdown
            .rows
            .iter()
            .map(|row| (row.label.clone(), &row.variance))
            .chain(std::iter::once(("합계".to_string(), &report.breakdown_total)));
        println!(
            "{}",
            variance_table(rows, report.breakdown.has_comparison, self.analysis.unit)
        );
        Ok(())
    }
}
