//! Summary command - period totals, deltas and insights

use super::display::{format_currency, format_rate, DisplayUnit};
use super::insights::print_insights;
use super::AnalysisArgs;
use clap::Args;
use pnlc::core::{analyze, Insight, MetricsVariance, PeriodSelection, Variance, Warning};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData<'a> {
    target: &'a PeriodSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<&'a PeriodSelection>,
    has_comparison: bool,
    target_rows: usize,
    totals: &'a MetricsVariance,
    insights: &'a [Insight],
    warnings: &'a [Warning],
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self.analysis.request(&ledger);
        let report = analyze(&ledger, &request);

        if self.json {
            let data = SummaryData {
                target: &report.target,
                comparison: report.comparison.as_ref().filter(|_| report.has_comparison),
                has_comparison: report.has_comparison,
                target_rows: report.target_rows,
                totals: &report.totals,
                insights: &report.insights,
                warnings: &report.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!();
        println!("P&L SUMMARY {}", self.analysis.describe(&request));
        println!();
        if report.target_rows == 0 {
            println!("No rows match the selected period and filters.");
            println!();
            return Ok(());
        }

        let unit = self.analysis.unit;
        print_line("Revenue", &report.totals.revenue, report.has_comparison, unit);
        print_line("Total cost", &report.totals.total_cost, report.has_comparison, unit);
        print_line(
            "Operating profit",
            &report.totals.operating_profit,
            report.has_comparison,
            unit,
        );
        println!();

        print_insights(&report.insights);
        Ok(())
    }
}

fn print_line(name: &str, v: &Variance, has_comparison: bool, unit: DisplayUnit) {
    if has_comparison {
        println!(
            "  {:<17} {} (vs {}, {} / {})",
            format!("{}:", name),
            format_currency(v.target, unit),
            format_currency(v.comparison, unit),
            format_currency(v.delta, unit),
            format_rate(&v.rate)
        );
    } else {
        println!("  {:<17} {}", format!("{}:", name), format_currency(v.target, unit));
    }
}
