//! Trend command - monthly or quarterly series, optionally cumulative

use super::display::{format_currency, render, variance_table};
use super::records::write_trend;
use super::{AnalysisArgs, BucketArg, MetricArg};
use clap::Args;
use pnlc::core::{analyze, Metric, Quarter, QuarterSeries};
use std::io;
use tabled::builder::Builder;

#[derive(Args, Debug)]
pub struct TrendCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Time bucket
    #[arg(long, value_enum, default_value_t = BucketArg::Month)]
    bucket: BucketArg,

    /// Show running totals from the first bucket
    #[arg(long)]
    cumulative: bool,

    /// Show quarter totals per year side by side instead of the period trend
    #[arg(long)]
    yoy: bool,

    /// Metric for the year-over-year view
    #[arg(long, value_enum, default_value_t = MetricArg::Revenue)]
    metric: MetricArg,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

impl TrendCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self
            .analysis
            .request(&ledger)
            .bucket(self.bucket.into(), self.cumulative);
        let report = analyze(&ledger, &request);

        if self.yoy {
            println!();
            println!(
                "QUARTERLY {} BY YEAR{}",
                Metric::from(self.metric).column(),
                if self.cumulative { " (cumulative)" } else { "" }
            );
            println!();
            println!("{}", self.yoy_table(&report.quarterly));
            return Ok(());
        }

        if self.csv {
            return write_trend(&report.trend, io::stdout());
        }

        println!();
        println!(
            "TREND {}{}",
            self.analysis.describe(&request),
            if self.cumulative { " (cumulative)" } else { "" }
        );
        println!();
        if report.trend.is_empty() {
            println!("No rows match the selected period and filters.");
            return Ok(());
        }
        let rows = report
            .trend
            .rows
            .iter()
            .map(|row| (row.label.clone(), &row.variance));
        println!(
            "{}",
            variance_table(rows, report.trend.has_comparison, self.analysis.unit)
        );
        Ok(())
    }

    fn yoy_table(&self, series: &[QuarterSeries]) -> String {
        let metric: Metric = self.metric.into();
        let mut builder = Builder::default();
        let mut header = vec![String::new()];
        header.extend(series.iter().map(|s| s.year.clone()));
        builder.push_record(header);
        for quarter in [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4] {
            let mut record = vec![quarter.to_string()];
            record.extend(series.iter().map(|s| {
                s.points
                    .iter()
                    .find(|p| p.quarter == quarter)
                    .map(|p| format_currency(p.metrics.get(metric), self.analysis.unit))
                    .unwrap_or_default()
            }));
            builder.push_record(record);
        }
        render(&mut builder.build())
    }
}
