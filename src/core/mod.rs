pub mod aggregate;
pub mod analysis;
pub mod cache;
pub mod costs;
pub mod filter;
pub mod insights;
pub mod ledger;
pub mod schema;
pub mod variance;
pub mod warnings;

#[cfg(test)]
pub(crate) mod testing;

// Flat public surface for domain types and functions.
pub use aggregate::{
    aggregate_breakdown, aggregate_totals, aggregate_trend, cumulate, heatmap, quarterly_by_year,
    AggregateRow, Heatmap, HeatmapRow, Metric, Metrics, QuarterPoint, QuarterSeries, TrendBucket,
};
pub use analysis::{
    analyze, breakdown_keys, filter_options, target_heatmap, AnalysisReport, AnalysisRequest,
    FilterOptions, TOP_MOVERS,
};
pub use cache::{content_key, LedgerCache, Session};
pub use costs::{
    analyze_categories, analyze_cost_items, largest_decrease, largest_increase, top_decreases,
    top_increases, CategoryVariance, CostItemVariance,
};
pub use filter::{
    normalize_month, select_exact, select_range_to_date, DimensionFilters, PeriodSelection,
};
pub use insights::{generate_insights, Insight, InsightKind};
pub use ledger::{derive_ledger, Ledger, LedgerError, LedgerRow, RawTable, MAX_AMOUNT};
pub use schema::{required_columns, CostCategory, CostItem, Dimension, Quarter};
pub use variance::{
    compute_variance, JoinOn, MetricsVariance, Presence, Rate, Variance, VarianceRow,
    VarianceTable,
};
pub use warnings::Warning;
