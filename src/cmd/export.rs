//! Export command - breakdown, trend and cost tables plus the full report as files

use super::records::{write_breakdown, write_costs, write_trend};
use super::{AnalysisArgs, BucketArg, DimensionArg};
use anyhow::Context;
use clap::Args;
use pnlc::core::{analyze, PeriodSelection};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ExportCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Breakdown dimension
    #[arg(long, value_enum, default_value_t = DimensionArg::Campus)]
    by: DimensionArg,

    /// Trend bucket
    #[arg(long, value_enum, default_value_t = BucketArg::Month)]
    bucket: BucketArg,

    /// Export running totals for the trend
    #[arg(long)]
    cumulative: bool,

    /// Directory to write into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

/// File name prefix with the target years and a local timestamp.
pub fn file_prefix(target: &PeriodSelection, now: chrono::NaiveDateTime) -> String {
    format!(
        "손익분석_{}년_{}",
        target.years.join("-"),
        now.format("%Y%m%d_%H%M%S")
    )
}

impl ExportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self
            .analysis
            .request(&ledger)
            .dimension(self.by.into())
            .bucket(self.bucket.into(), self.cumulative);
        let report = analyze(&ledger, &request);

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create {}", self.output_dir.display())
        })?;
        let prefix = file_prefix(&report.target, chrono::Local::now().naive_local());

        let path = self.path(&prefix, "breakdown.csv");
        write_breakdown(&report, create(&path)?)?;
        println!("Wrote {}", path.display());

        let path = self.path(&prefix, "trend.csv");
        write_trend(&report.trend, create(&path)?)?;
        println!("Wrote {}", path.display());

        let path = self.path(&prefix, "costs.csv");
        write_costs(&report, create(&path)?)?;
        println!("Wrote {}", path.display());

        let path = self.path(&prefix, "report.json");
        serde_json::to_writer_pretty(create(&path)?, &report)?;
        println!("Wrote {}", path.display());

        Ok(())
    }

    fn path(&self, prefix: &str, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}", prefix, name))
    }
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
