//! Insights command - rule-based observations for the selected periods

use super::AnalysisArgs;
use clap::Args;
use pnlc::core::{analyze, Insight};

#[derive(Args, Debug)]
pub struct InsightsCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl InsightsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self.analysis.request(&ledger);
        let report = analyze(&ledger, &request);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.insights)?);
        } else {
            println!();
            println!("INSIGHTS {}", self.analysis.describe(&request));
            println!();
            print_insights(&report.insights);
        }
        Ok(())
    }
}

pub fn print_insights(insights: &[Insight]) {
    println!("INSIGHTS");
    for insight in insights {
        println!("  [{}] {}", insight.kind, insight.title);
        println!("      {}", insight.body);
    }
    println!();
}
