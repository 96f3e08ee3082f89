//! One full pass of the pipeline for a single set of user selections.

use super::aggregate::{
    aggregate_breakdown, aggregate_totals, aggregate_trend, heatmap, quarterly_by_year, Heatmap,
    Metric, QuarterSeries, TrendBucket,
};
use super::costs::{
    analyze_categories, analyze_cost_items, top_decreases, top_increases, CategoryVariance,
    CostItemVariance,
};
use super::filter::{select_range_to_date, DimensionFilters, PeriodSelection};
use super::insights::{generate_insights, Insight};
use super::ledger::{Ledger, LedgerRow};
use super::schema::Dimension;
use super::variance::{compute_variance, JoinOn, MetricsVariance, VarianceTable};
use super::warnings::Warning;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of cost items listed as the largest movers in each direction.
pub const TOP_MOVERS: usize = 5;

/// Breakdown keys for an analysis dimension, outermost first.
pub fn breakdown_keys(dimension: Dimension) -> &'static [Dimension] {
    match dimension {
        Dimension::RevenueCode => &[Dimension::RevenueCode],
        Dimension::BusinessUnit => &[Dimension::BusinessUnit, Dimension::Brand, Dimension::Campus],
        Dimension::Brand => &[Dimension::Brand, Dimension::Campus],
        Dimension::Campus => &[Dimension::Campus],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub target: PeriodSelection,
    /// A single comparison year with its months.
    pub comparison: Option<PeriodSelection>,
    pub filters: DimensionFilters,
    pub dimension: Dimension,
    pub bucket: TrendBucket,
    pub cumulative: bool,
}

impl AnalysisRequest {
    pub fn new(target: PeriodSelection) -> Self {
        AnalysisRequest {
            target,
            comparison: None,
            filters: DimensionFilters::new(),
            dimension: Dimension::Campus,
            bucket: TrendBucket::Month,
            cumulative: false,
        }
    }

    pub fn compare_with(mut self, comparison: PeriodSelection) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn filters(mut self, filters: DimensionFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn bucket(mut self, bucket: TrendBucket, cumulative: bool) -> Self {
        self.bucket = bucket;
        self.cumulative = cumulative;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct AnalysisReport {
    pub target: PeriodSelection,
    pub comparison: Option<PeriodSelection>,
    /// True only when a comparison was requested and it selected at least one row.
    pub has_comparison: bool,
    pub target_rows: usize,
    pub comparison_rows: usize,
    pub dimension: Dimension,
    pub breakdown_keys: Vec<Dimension>,
    pub bucket: TrendBucket,
    pub cumulative: bool,
    pub totals: MetricsVariance,
    pub breakdown: VarianceTable,
    pub breakdown_total: MetricsVariance,
    pub trend: VarianceTable,
    /// Quarter totals per year, for year-over-year overlays.
    pub quarterly: Vec<QuarterSeries>,
    pub cost_items: Vec<CostItemVariance>,
    pub categories: Vec<CategoryVariance>,
    pub top_increases: Vec<CostItemVariance>,
    pub top_decreases: Vec<CostItemVariance>,
    pub insights: Vec<Insight>,
    pub warnings: Vec<Warning>,
}

/// Run selection, aggregation, variance, cost analysis and insights for one request.
pub fn analyze(ledger: &Ledger, request: &AnalysisRequest) -> AnalysisReport {
    let rows = ledger.rows();
    let target = request.target.exact(rows, &request.filters);
    let comparison: Option<Vec<&LedgerRow>> = request
        .comparison
        .as_ref()
        .filter(|c| !c.is_empty())
        .map(|c| c.exact(rows, &request.filters))
        .filter(|selected| !selected.is_empty());
    let keys = breakdown_keys(request.dimension);

    let mut report = AnalysisReport {
        target: request.target.clone(),
        comparison: request.comparison.clone(),
        has_comparison: comparison.is_some(),
        target_rows: target.len(),
        comparison_rows: comparison.as_ref().map_or(0, Vec::len),
        dimension: request.dimension,
        breakdown_keys: keys.to_vec(),
        bucket: request.bucket,
        cumulative: request.cumulative,
        totals: MetricsVariance::target_only(&Default::default()),
        breakdown: VarianceTable {
            has_comparison: comparison.is_some(),
            rows: Vec::new(),
        },
        breakdown_total: MetricsVariance::target_only(&Default::default()),
        trend: VarianceTable {
            has_comparison: comparison.is_some(),
            rows: Vec::new(),
        },
        quarterly: Vec::new(),
        cost_items: Vec::new(),
        categories: Vec::new(),
        top_increases: Vec::new(),
        top_decreases: Vec::new(),
        insights: vec![Insight::no_data()],
        warnings: ledger.warnings().to_vec(),
    };

    if target.is_empty() {
        log::info!("No rows match the target selection");
        return report;
    }

    let target_totals = aggregate_totals(&target);
    let comparison_totals = comparison.as_deref().map(aggregate_totals);
    report.totals = match &comparison_totals {
        Some(c) => MetricsVariance::between(&target_totals, c),
        None => MetricsVariance::target_only(&target_totals),
    };

    let comparison_breakdown = comparison.as_deref().map(|c| aggregate_breakdown(c, keys));
    report.breakdown = compute_variance(
        &aggregate_breakdown(&target, keys),
        comparison_breakdown.as_deref(),
        JoinOn::Key,
    )
    .sorted_by_key();
    report.breakdown_total = report.breakdown.grand_total();

    let target_trend = aggregate_trend(
        &request.target.range_to_date(rows, &request.filters),
        request.bucket,
        request.cumulative,
    );
    let comparison_trend = match (&request.comparison, &comparison) {
        (Some(period), Some(_)) => Some(aggregate_trend(
            &period.range_to_date(rows, &request.filters),
            request.bucket,
            request.cumulative,
        )),
        _ => None,
    };
    report.trend = compute_variance(&target_trend, comparison_trend.as_deref(), JoinOn::Label);

    report.quarterly = quarterly_series(ledger, request, comparison.is_some());

    report.cost_items = analyze_cost_items(&target, comparison.as_deref(), ledger.cost_items());
    report.categories = analyze_categories(&report.cost_items, comparison.is_some());
    report.top_increases = top_increases(&report.cost_items, TOP_MOVERS)
        .into_iter()
        .cloned()
        .collect();
    report.top_decreases = top_decreases(&report.cost_items, TOP_MOVERS)
        .into_iter()
        .cloned()
        .collect();

    report.insights = generate_insights(
        &target_totals,
        comparison_totals.as_ref(),
        &report.cost_items,
        &report.categories,
    );
    log::debug!(
        "Analysis: {} target rows, {} comparison rows, {} insights",
        report.target_rows,
        report.comparison_rows,
        report.insights.len()
    );
    report
}

/// Years of the target (and active comparison) through the latest target month, by quarter.
fn quarterly_series(
    ledger: &Ledger,
    request: &AnalysisRequest,
    with_comparison: bool,
) -> Vec<QuarterSeries> {
    let Some(max_month) = request.target.max_month() else {
        return Vec::new();
    };
    let mut years = request.target.years.clone();
    if with_comparison {
        if let Some(comparison) = &request.comparison {
            years.extend(comparison.years.iter().cloned());
        }
    }
    let rows = select_range_to_date(ledger.rows(), &years, max_month, &request.filters);
    quarterly_by_year(&rows, request.cumulative)
}

/// Dimension by month pivot of the exact target selection.
pub fn target_heatmap(
    ledger: &Ledger,
    request: &AnalysisRequest,
    dimension: Dimension,
    metric: Metric,
) -> Heatmap {
    let rows = request.target.exact(ledger.rows(), &request.filters);
    heatmap(&rows, dimension, metric)
}

/// Values offered for each selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FilterOptions {
    /// Most recent first.
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub dimensions: BTreeMap<Dimension, Vec<String>>,
}

pub fn filter_options(ledger: &Ledger) -> FilterOptions {
    FilterOptions {
        years: ledger.years(),
        months: ledger.months(),
        dimensions: Dimension::ALL
            .iter()
            .map(|d| (*d, ledger.distinct(*d)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::insights::InsightKind;
    use crate::core::schema::{CostCategory, Quarter};
    use crate::core::testing::{ledger, Row};
    use crate::core::variance::{Presence, Rate};
    use rust_decimal_macros::dec;

    fn sample() -> Ledger {
        ledger(&[
            Row::new("202301")
                .dim(Dimension::Campus, "A")
                .revenue(800_000)
                .cost("관리자A", 500_000),
            Row::new("202302")
                .dim(Dimension::Campus, "A")
                .revenue(900_000)
                .cost("관리자A", 600_000),
            Row::new("202302")
                .dim(Dimension::Campus, "Gone")
                .revenue(100_000)
                .cost("임차A", 50_000),
            Row::new("202401")
                .dim(Dimension::Campus, "A")
                .revenue(1_000_000)
                .cost("관리자A", 600_000),
            Row::new("202402")
                .dim(Dimension::Campus, "A")
                .revenue(1_200_000)
                .cost("관리자A", 700_000),
            Row::new("202402")
                .dim(Dimension::Campus, "New")
                .revenue(300_000)
                .cost("셔틀", 150_000),
        ])
    }

    #[test]
    fn target_only_report() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["1", "2"]))
            .filters(DimensionFilters::new().with(Dimension::Campus, ["A"]));
        let report = analyze(&ledger, &request);

        assert!(!report.has_comparison);
        assert_eq!(report.totals.revenue.target, dec!(2200000));
        assert_eq!(report.totals.total_cost.target, dec!(1300000));
        assert_eq!(report.totals.operating_profit.target, dec!(900000));
        assert_eq!(report.totals.revenue.rate, Rate::NotApplicable);

        let labels: Vec<_> = report.trend.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2"]);
        assert_eq!(
            report.trend.rows[1].variance.operating_profit.target,
            dec!(500000)
        );
        let kinds: Vec<_> = report.insights.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::Neutral, InsightKind::Positive]);
    }

    #[test]
    fn comparison_report() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["2"]))
            .compare_with(PeriodSelection::new(["2023"], ["2"]));
        let report = analyze(&ledger, &request);

        assert!(report.has_comparison);
        assert_eq!(report.target_rows, 2);
        assert_eq!(report.comparison_rows, 2);
        assert_eq!(report.totals.revenue.target, dec!(1500000));
        assert_eq!(report.totals.revenue.comparison, dec!(1000000));
        assert_eq!(report.totals.revenue.rate, Rate::Percent(dec!(50)));

        let keys: Vec<_> = report.breakdown.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(keys, vec!["A", "Gone", "New"]);
        assert_eq!(report.breakdown_total, report.totals);

        // trends run from January through the selected month on both sides
        assert_eq!(report.trend.rows.len(), 2);
        assert_eq!(report.trend.rows[0].variance.revenue.target, dec!(1000000));
        assert_eq!(report.trend.rows[0].variance.revenue.comparison, dec!(800000));

        let occupancy = report
            .categories
            .iter()
            .find(|c| c.category == CostCategory::Occupancy)
            .unwrap();
        assert_eq!(occupancy.variance.delta, dec!(-50000));
        assert_eq!(report.top_increases[0].item.name(), "셔틀");
        assert_eq!(report.top_decreases[0].item.name(), "임차A");

        assert_eq!(report.quarterly.len(), 2);
        assert_eq!(report.quarterly[0].year, "2023");
        assert_eq!(report.quarterly[1].points[0].quarter, Quarter::Q1);
        assert_eq!(report.quarterly[1].points[0].metrics.revenue, dec!(2500000));
    }

    #[test]
    fn quarter_trend_rows_align_only_within_a_year() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["1", "2"]))
            .compare_with(PeriodSelection::new(["2023"], ["1", "2"]))
            .bucket(TrendBucket::Quarter, false);
        let report = analyze(&ledger, &request);

        let rows: Vec<_> = report
            .trend
            .rows
            .iter()
            .map(|r| (r.label.as_str(), r.presence))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("2024 Q1", Presence::TargetOnly),
                ("2023 Q1", Presence::ComparisonOnly),
            ]
        );
        assert_eq!(report.trend.rows[0].variance.revenue.rate, Rate::Infinite);
        assert_eq!(
            report.trend.rows[1].variance.revenue.rate,
            Rate::Percent(dec!(-100))
        );
    }

    #[test]
    fn month_trend_sums_target_years_sharing_a_label() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2023", "2024"], ["1", "2"]))
            .compare_with(PeriodSelection::new(["2023"], ["1", "2"]));
        let report = analyze(&ledger, &request);

        let labels: Vec<_> = report.trend.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2"]);
        let january = &report.trend.rows[0].variance.revenue;
        assert_eq!(january.target, dec!(1800000));
        assert_eq!(january.comparison, dec!(800000));

        let without = analyze(
            &ledger,
            &AnalysisRequest::new(PeriodSelection::new(["2023", "2024"], ["1", "2"])),
        );
        assert_eq!(without.trend.rows.len(), 4);
    }

    #[test]
    fn empty_comparison_selection_falls_back_to_target_only() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["2"]))
            .compare_with(PeriodSelection::new(["2022"], ["2"]));
        let report = analyze(&ledger, &request);
        assert!(!report.has_comparison);
        assert!(!report.breakdown.has_comparison);
        assert_eq!(report.insights[0].title, "Current period");
    }

    #[test]
    fn empty_target_yields_no_data_notice() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["2"]))
            .compare_with(PeriodSelection::new(["2023"], ["2"]))
            .filters(DimensionFilters::new().with(Dimension::Campus, ["Nowhere"]));
        let report = analyze(&ledger, &request);
        assert_eq!(report.target_rows, 0);
        assert_eq!(report.totals.revenue.target, dec!(0));
        assert!(report.breakdown.is_empty());
        assert!(report.trend.is_empty());
        assert!(report.cost_items.is_empty());
        assert_eq!(report.insights, vec![Insight::no_data()]);
    }

    #[test]
    fn dimension_chooses_breakdown_keys() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["2"]))
            .dimension(Dimension::BusinessUnit);
        let report = analyze(&ledger, &request);
        assert_eq!(
            report.breakdown_keys,
            vec![Dimension::BusinessUnit, Dimension::Brand, Dimension::Campus]
        );
        assert_eq!(report.breakdown.rows[0].key, vec!["U1", "B1", "A"]);
        assert_eq!(report.breakdown.rows[0].label, "U1 / B1 / A");
    }

    #[test]
    fn options_and_heatmap() {
        let ledger = sample();
        let options = filter_options(&ledger);
        assert_eq!(options.years, vec!["2024", "2023"]);
        assert_eq!(options.dimensions[&Dimension::Campus], vec!["A", "Gone", "New"]);

        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["1", "2"]));
        let map = target_heatmap(&ledger, &request, Dimension::Campus, Metric::Revenue);
        assert_eq!(map.months, vec!["01", "02"]);
        assert_eq!(map.rows[1].label, "New");
        assert_eq!(map.rows[1].values, vec![dec!(0), dec!(300000)]);
    }

    #[test]
    fn report_serializes_to_json() {
        let ledger = sample();
        let request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["2"]))
            .compare_with(PeriodSelection::new(["2023"], ["2"]));
        let json = serde_json::to_value(analyze(&ledger, &request)).unwrap();
        assert_eq!(json["has_comparison"], true);
        assert_eq!(json["dimension"], "캠퍼스");
        assert_eq!(json["totals"]["revenue"]["rate"]["kind"], "percent");
        assert!(json["cost_items"][0]["item"].is_string());
    }
}
