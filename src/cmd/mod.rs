pub mod breakdown;
pub mod costs;
pub mod display;
pub mod export;
pub mod heatmap;
pub mod html_report;
pub mod insights;
pub mod ledger;
pub mod options;
pub mod records;
pub mod schema;
pub mod summary;
pub mod trend;

use anyhow::Context;
use clap::{Args, ValueEnum};
use display::DisplayUnit;
use pnlc::core::{
    AnalysisRequest, Dimension, DimensionFilters, Ledger, Metric, PeriodSelection, Session,
    TrendBucket,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load and derive a ledger file, reporting load warnings on stderr.
pub fn load_ledger(path: &Path) -> anyhow::Result<Arc<Ledger>> {
    let mut session = Session::new();
    let ledger = session
        .open(path)
        .with_context(|| format!("Failed to load ledger from {}", path.display()))?;
    for warning in ledger.warnings() {
        eprintln!("Warning: {}", warning);
    }
    Ok(ledger)
}

#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Ledger CSV file (one row per cost center and month)
    #[arg(short, long)]
    pub file: PathBuf,
}

/// Period, comparison and filter selection shared by the analysis commands.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Ledger CSV file (one row per cost center and month)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Target year(s). Defaults to the most recent year in the file
    #[arg(short, long, value_delimiter = ',')]
    pub year: Vec<String>,

    /// Target month(s), e.g. 4 or 04. Defaults to every month in the file
    #[arg(short, long, value_delimiter = ',')]
    pub month: Vec<String>,

    /// Comparison year
    #[arg(long)]
    pub compare_year: Option<String>,

    /// Comparison month(s). Defaults to the target months
    #[arg(long, value_delimiter = ',')]
    pub compare_month: Vec<String>,

    /// Only include these revenue codes (수익코드)
    #[arg(long, value_delimiter = ',')]
    pub revenue_code: Vec<String>,

    /// Only include these business units (사업부)
    #[arg(long, value_delimiter = ',')]
    pub business_unit: Vec<String>,

    /// Only include these brands (브랜드)
    #[arg(long, value_delimiter = ',')]
    pub brand: Vec<String>,

    /// Only include these campuses (캠퍼스)
    #[arg(long, value_delimiter = ',')]
    pub campus: Vec<String>,

    /// Unit amounts are displayed in
    #[arg(long, value_enum, default_value_t = DisplayUnit::Million)]
    pub unit: DisplayUnit,
}

impl AnalysisArgs {
    pub fn load(&self) -> anyhow::Result<Arc<Ledger>> {
        load_ledger(&self.file)
    }

    pub fn filters(&self) -> DimensionFilters {
        DimensionFilters::new()
            .with(Dimension::RevenueCode, self.revenue_code.iter().cloned())
            .with(Dimension::BusinessUnit, self.business_unit.iter().cloned())
            .with(Dimension::Brand, self.brand.iter().cloned())
            .with(Dimension::Campus, self.campus.iter().cloned())
    }

    pub fn target(&self, ledger: &Ledger) -> PeriodSelection {
        let years = if self.year.is_empty() {
            ledger.years().into_iter().take(1).collect()
        } else {
            self.year.clone()
        };
        let months = if self.month.is_empty() {
            ledger.months()
        } else {
            self.month.clone()
        };
        PeriodSelection::new(years, months)
    }

    pub fn comparison(&self, target: &PeriodSelection) -> Option<PeriodSelection> {
        let year = self.compare_year.as_ref()?;
        let months = if self.compare_month.is_empty() {
            target.months.clone()
        } else {
            self.compare_month.clone()
        };
        Some(PeriodSelection::new([year], months))
    }

    pub fn request(&self, ledger: &Ledger) -> AnalysisRequest {
        let target = self.target(ledger);
        let comparison = self.comparison(&target);
        let mut request = AnalysisRequest::new(target).filters(self.filters());
        request.comparison = comparison;
        log::debug!("Analysis request: {:?}", request);
        request
    }

    /// Heading describing the selected periods, e.g. `2024 (1, 2) vs 2023 (1, 2)`.
    pub fn describe(&self, request: &AnalysisRequest) -> String {
        let side = |p: &PeriodSelection| {
            format!("{} ({})", p.years.join(", "), p.display_months().join(", "))
        };
        match &request.comparison {
            Some(comparison) => format!("{} vs {}", side(&request.target), side(comparison)),
            None => side(&request.target),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DimensionArg {
    /// 수익코드
    RevenueCode,
    /// 사업부
    BusinessUnit,
    /// 브랜드
    Brand,
    /// 캠퍼스
    #[default]
    Campus,
}

impl From<DimensionArg> for Dimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::RevenueCode => Dimension::RevenueCode,
            DimensionArg::BusinessUnit => Dimension::BusinessUnit,
            DimensionArg::Brand => Dimension::Brand,
            DimensionArg::Campus => Dimension::Campus,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BucketArg {
    #[default]
    Month,
    Quarter,
}

impl From<BucketArg> for TrendBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Month => TrendBucket::Month,
            BucketArg::Quarter => TrendBucket::Quarter,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    /// 매출액
    #[default]
    Revenue,
    /// 영업이익
    OperatingProfit,
    /// 총비용
    TotalCost,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Revenue => Metric::Revenue,
            MetricArg::OperatingProfit => Metric::OperatingProfit,
            MetricArg::TotalCost => Metric::TotalCost,
        }
    }
}
