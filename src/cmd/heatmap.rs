//! Heatmap command - dimension by month matrix of one metric

use super::display::{format_number, render, DisplayUnit};
use super::{AnalysisArgs, DimensionArg, MetricArg};
use clap::Args;
use pnlc::core::{target_heatmap, Heatmap};
use tabled::builder::Builder;

#[derive(Args, Debug)]
pub struct HeatmapCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Row dimension
    #[arg(long, value_enum, default_value_t = DimensionArg::Campus)]
    by: DimensionArg,

    /// Metric in each cell
    #[arg(long, value_enum, default_value_t = MetricArg::Revenue)]
    metric: MetricArg,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl HeatmapCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self.analysis.request(&ledger);
        let map = target_heatmap(&ledger, &request, self.by.into(), self.metric.into());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&map)?);
            return Ok(());
        }

        println!();
        println!(
            "{} BY {} AND MONTH ({})",
            map.metric.column(),
            map.dimension.column(),
            self.analysis.unit.suffix().trim()
        );
        println!();
        if map.rows.is_empty() {
            println!("No rows match the selected period and filters.");
            return Ok(());
        }
        println!("{}", table(&map, self.analysis.unit));
        Ok(())
    }
}

fn table(map: &Heatmap, unit: DisplayUnit) -> String {
    let mut builder = Builder::default();
    let mut header = vec![map.dimension.column().to_string()];
    header.extend(map.months.iter().map(|m| format!("{}월", m.trim_start_matches('0'))));
    builder.push_record(header);
    for row in &map.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.values.iter().map(|v| {
            let decimals = if unit == DisplayUnit::Won { 0 } else { 1 };
            format_number(*v / unit.divisor(), decimals)
        }));
        builder.push_record(record);
    }
    render(&mut builder.build())
}
