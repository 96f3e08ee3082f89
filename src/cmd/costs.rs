//! Costs command - cost item and category variance with the largest movers

use super::display::{format_currency, format_rate, render, DisplayUnit};
use super::records::write_costs;
use super::AnalysisArgs;
use clap::Args;
use pnlc::core::{analyze, CostItemVariance, Variance};
use std::io;
use tabled::{Table, Tabled};

#[derive(Args, Debug)]
pub struct CostsCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Include cost items that are 0 in both periods
    #[arg(long)]
    all: bool,

    /// Output as CSV instead of formatted tables
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Clone, Tabled)]
struct CostLine {
    #[tabled(rename = "")]
    name: String,
    #[tabled(rename = "대상기간")]
    target: String,
    #[tabled(rename = "비교기간")]
    comparison: String,
    #[tabled(rename = "증감액")]
    delta: String,
    #[tabled(rename = "증감률")]
    rate: String,
}

impl CostLine {
    fn new(name: String, v: &Variance, unit: DisplayUnit) -> Self {
        CostLine {
            name,
            target: format_currency(v.target, unit),
            comparison: format_currency(v.comparison, unit),
            delta: format_currency(v.delta, unit),
            rate: format_rate(&v.rate),
        }
    }
}

impl CostsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self.analysis.request(&ledger);
        let report = analyze(&ledger, &request);

        if self.csv {
            return write_costs(&report, io::stdout());
        }

        let unit = self.analysis.unit;
        println!();
        println!("COST ANALYSIS {}", self.analysis.describe(&request));
        println!();
        if report.target_rows == 0 {
            println!("No rows match the selected period and filters.");
            return Ok(());
        }

        println!("BY CATEGORY");
        let lines: Vec<_> = report
            .categories
            .iter()
            .map(|c| CostLine::new(c.category.label().to_string(), &c.variance, unit))
            .collect();
        println!("{}", render(&mut Table::new(lines)));
        println!();

        println!("BY ITEM");
        let lines: Vec<_> = report
            .cost_items
            .iter()
            .filter(|i| self.all || !(i.variance.target.is_zero() && i.variance.comparison.is_zero()))
            .map(|i| CostLine::new(format!("{} ({})", i.item, i.category), &i.variance, unit))
            .collect();
        println!("{}", render(&mut Table::new(lines)));

        if report.has_comparison {
            print_movers("TOP INCREASES", &report.top_increases, unit);
            print_movers("TOP DECREASES", &report.top_decreases, unit);
        }
        Ok(())
    }
}

fn print_movers(title: &str, items: &[CostItemVariance], unit: DisplayUnit) {
    println!();
    println!("{}", title);
    if items.is_empty() {
        println!("  (none)");
        return;
    }
    for (n, item) in items.iter().enumerate() {
        println!(
            "  {}. {} {} ({})",
            n + 1,
            item.item,
            format_currency(item.variance.delta, unit),
            format_rate(&item.variance.rate)
        );
    }
}
