//! Group-by-sum reductions: totals, dimension breakdowns, time trends and pivots.

use super::ledger::LedgerRow;
use super::schema::{Dimension, Quarter, OPERATING_PROFIT_COLUMN, REVENUE_COLUMN, TOTAL_COST_COLUMN};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// The summed financial figures of a group of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Metrics {
    #[schemars(with = "String")]
    pub revenue: Decimal,
    #[schemars(with = "String")]
    pub total_cost: Decimal,
    #[schemars(with = "String")]
    pub operating_profit: Decimal,
}

impl Metrics {
    pub fn new(revenue: Decimal, total_cost: Decimal, operating_profit: Decimal) -> Self {
        Metrics {
            revenue,
            total_cost,
            operating_profit,
        }
    }

    pub fn of(row: &LedgerRow) -> Self {
        Metrics::new(row.revenue, row.total_cost, row.operating_profit)
    }

    pub fn get(&self, metric: Metric) -> Decimal {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::TotalCost => self.total_cost,
            Metric::OperatingProfit => self.operating_profit,
        }
    }

    /// Operating profit as a percentage of revenue, 0 without revenue or when the ratio
    /// leaves the `Decimal` range.
    pub fn profit_margin(&self) -> Decimal {
        self.operating_profit
            .checked_div(self.revenue)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, other: Metrics) {
        self.revenue += other.revenue;
        self.total_cost += other.total_cost;
        self.operating_profit += other.operating_profit;
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(mut self, other: Metrics) -> Metrics {
        self += other;
        self
    }
}

impl Sub for Metrics {
    type Output = Metrics;

    fn sub(self, other: Metrics) -> Metrics {
        Metrics::new(
            self.revenue - other.revenue,
            self.total_cost - other.total_cost,
            self.operating_profit - other.operating_profit,
        )
    }
}

impl Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Metrics {
        iter.fold(Metrics::default(), Add::add)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Metric {
    #[serde(rename = "매출액")]
    Revenue,
    #[serde(rename = "총비용")]
    TotalCost,
    #[serde(rename = "영업이익")]
    OperatingProfit,
}

impl Metric {
    pub fn column(self) -> &'static str {
        match self {
            Metric::Revenue => REVENUE_COLUMN,
            Metric::TotalCost => TOTAL_COST_COLUMN,
            Metric::OperatingProfit => OPERATING_PROFIT_COLUMN,
        }
    }
}

/// One group of an aggregation: its key values, a display label and the summed metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct AggregateRow {
    pub key: Vec<String>,
    pub label: String,
    pub metrics: Metrics,
}

pub fn aggregate_totals(rows: &[&LedgerRow]) -> Metrics {
    rows.iter().map(|r| Metrics::of(r)).sum()
}

/// Sum rows per unique combination of `keys`, sorted by key tuple.
pub fn aggregate_breakdown(rows: &[&LedgerRow], keys: &[Dimension]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<Vec<String>, Metrics> = BTreeMap::new();
    for row in rows {
        let key = keys.iter().map(|k| row.dimension(*k).to_string()).collect();
        *groups.entry(key).or_default() += Metrics::of(row);
    }
    log::debug!("Breakdown by {:?}: {} groups", keys, groups.len());
    groups
        .into_iter()
        .map(|(key, metrics)| AggregateRow {
            label: key.join(" / "),
            key,
            metrics,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendBucket {
    #[default]
    Month,
    Quarter,
}

/// Sum rows per month (`년월`) or per year-quarter (`년분기`) in chronological order,
/// optionally as running totals.
///
/// Month rows are labelled with the month number (`"1"`), quarter rows with
/// `"<year> <quarter>"`. Quarters are ordered by the earliest period they contain.
pub fn aggregate_trend(rows: &[&LedgerRow], bucket: TrendBucket, cumulative: bool) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<&str, (u32, Metrics)> = BTreeMap::new();
    for row in rows {
        let key = match bucket {
            TrendBucket::Month => row.period_key.as_str(),
            TrendBucket::Quarter => row.year_quarter.as_str(),
        };
        let sort_key = row.sort_key();
        let entry = groups.entry(key).or_insert((sort_key, Metrics::default()));
        entry.0 = entry.0.min(sort_key);
        entry.1 += Metrics::of(row);
    }

    let mut sorted: Vec<(&str, u32, Metrics)> = groups
        .into_iter()
        .map(|(key, (sort_key, metrics))| (key, sort_key, metrics))
        .collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let trend: Vec<AggregateRow> = sorted
        .into_iter()
        .map(|(key, _, metrics)| AggregateRow {
            key: vec![key.to_string()],
            label: match bucket {
                TrendBucket::Month => key[4..].trim_start_matches('0').to_string(),
                TrendBucket::Quarter => key.to_string(),
            },
            metrics,
        })
        .collect();

    if cumulative {
        cumulate(trend)
    } else {
        trend
    }
}

/// Replace each row's metrics with the running sum up to and including it.
pub fn cumulate(mut rows: Vec<AggregateRow>) -> Vec<AggregateRow> {
    let mut running = Metrics::default();
    for row in &mut rows {
        running += row.metrics;
        row.metrics = running;
    }
    rows
}

/// Dimension value by month matrix of one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Heatmap {
    pub dimension: Dimension,
    pub metric: Metric,
    /// Zero-padded months present in the data, ascending.
    pub months: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct HeatmapRow {
    pub label: String,
    #[schemars(with = "Vec<String>")]
    pub values: Vec<Decimal>,
}

pub fn heatmap(rows: &[&LedgerRow], dimension: Dimension, metric: Metric) -> Heatmap {
    let mut cells: BTreeMap<&str, BTreeMap<&str, Decimal>> = BTreeMap::new();
    let mut months: Vec<String> = Vec::new();
    for row in rows {
        if !matches!(row.month.parse::<u32>(), Ok(1..=12)) {
            continue;
        }
        if !months.contains(&row.month) {
            months.push(row.month.clone());
        }
        *cells
            .entry(row.dimension(dimension))
            .or_default()
            .entry(row.month.as_str())
            .or_default() += Metrics::of(row).get(metric);
    }
    months.sort();

    let rows = cells
        .into_iter()
        .map(|(label, by_month)| HeatmapRow {
            label: label.to_string(),
            values: months
                .iter()
                .map(|m| by_month.get(m.as_str()).copied().unwrap_or_default())
                .collect(),
        })
        .collect();
    Heatmap {
        dimension,
        metric,
        months,
        rows,
    }
}

/// Quarter totals of one year, for overlaying years on a Q1..Q4 axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct QuarterSeries {
    pub year: String,
    pub points: Vec<QuarterPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct QuarterPoint {
    pub quarter: Quarter,
    pub metrics: Metrics,
}

/// Group rows by year then quarter. With `cumulative`, totals run within each year.
pub fn quarterly_by_year(rows: &[&LedgerRow], cumulative: bool) -> Vec<QuarterSeries> {
    let mut years: BTreeMap<&str, BTreeMap<Quarter, Metrics>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.quarter != Quarter::NotAvailable) {
        *years
            .entry(row.year.as_str())
            .or_default()
            .entry(row.quarter)
            .or_default() += Metrics::of(row);
    }
    years
        .into_iter()
        .map(|(year, quarters)| {
            let mut running = Metrics::default();
            let points = quarters
                .into_iter()
                .map(|(quarter, metrics)| {
                    running += metrics;
                    QuarterPoint {
                        quarter,
                        metrics: if cumulative { running } else { metrics },
                    }
                })
                .collect();
            QuarterSeries {
                year: year.to_string(),
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{all, ledger, Row};
    use rust_decimal_macros::dec;

    fn two_months() -> crate::core::Ledger {
        ledger(&[
            Row::new("202401")
                .revenue(1_000_000)
                .cost("관리자A", 600_000),
            Row::new("202402")
                .revenue(1_200_000)
                .cost("관리자A", 700_000),
        ])
    }

    #[test]
    fn totals_of_two_months() {
        let ledger = two_months();
        let totals = aggregate_totals(&all(&ledger));
        assert_eq!(totals.revenue, dec!(2200000));
        assert_eq!(totals.total_cost, dec!(1300000));
        assert_eq!(totals.operating_profit, dec!(900000));
    }

    #[test]
    fn monthly_trend_labels_and_profits() {
        let ledger = two_months();
        let trend = aggregate_trend(&all(&ledger), TrendBucket::Month, false);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].label, "1");
        assert_eq!(trend[1].label, "2");
        assert_eq!(trend[0].metrics.operating_profit, dec!(400000));
        assert_eq!(trend[1].metrics.operating_profit, dec!(500000));

        let cumulative = aggregate_trend(&all(&ledger), TrendBucket::Month, true);
        assert_eq!(cumulative.len(), 2);
        assert_eq!(cumulative[0].metrics.operating_profit, dec!(400000));
        assert_eq!(cumulative[1].metrics.operating_profit, dec!(900000));
        assert_eq!(cumulative[1].label, "2");
    }

    #[test]
    fn cumulative_is_prefix_sum_of_plain_trend() {
        let ledger = ledger(&[
            Row::new("202403").revenue(30).cost("셔틀", 5),
            Row::new("202401").revenue(10).cost("셔틀", 50),
            Row::new("202402").revenue(20),
            Row::new("202401").revenue(7),
            Row::new("202311").revenue(4).cost("LMS", 1),
        ]);
        let rows = all(&ledger);
        for bucket in [TrendBucket::Month, TrendBucket::Quarter] {
            let plain = aggregate_trend(&rows, bucket, false);
            let direct = aggregate_trend(&rows, bucket, true);
            assert_eq!(cumulate(plain.clone()), direct);
            for i in 0..plain.len() {
                let prefix: Metrics = plain[..=i].iter().map(|r| r.metrics).sum();
                assert_eq!(direct[i].metrics, prefix);
            }
        }
    }

    #[test]
    fn month_trend_is_chronological_across_years() {
        let ledger = ledger(&[
            Row::new("202401").revenue(1),
            Row::new("202312").revenue(2),
            Row::new("202310").revenue(3),
        ]);
        let trend = aggregate_trend(&all(&ledger), TrendBucket::Month, false);
        let keys: Vec<_> = trend.iter().map(|r| r.key[0].as_str()).collect();
        assert_eq!(keys, vec!["202310", "202312", "202401"]);
        let labels: Vec<_> = trend.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["10", "12", "1"]);
    }

    #[test]
    fn quarter_trend_groups_by_year_quarter() {
        let ledger = ledger(&[
            Row::new("202405").revenue(5),
            Row::new("202401").revenue(1),
            Row::new("202403").revenue(3),
            Row::new("202312").revenue(12),
        ]);
        let trend = aggregate_trend(&all(&ledger), TrendBucket::Quarter, false);
        let labels: Vec<_> = trend.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["2023 Q4", "2024 Q1", "2024 Q2"]);
        assert_eq!(trend[1].metrics.revenue, dec!(4));
    }

    #[test]
    fn breakdown_is_sorted_by_key_tuple() {
        let ledger = ledger(&[
            Row::new("202401")
                .dim(Dimension::Brand, "Z")
                .dim(Dimension::Campus, "b")
                .revenue(1),
            Row::new("202401")
                .dim(Dimension::Brand, "A")
                .dim(Dimension::Campus, "c")
                .revenue(2),
            Row::new("202402")
                .dim(Dimension::Brand, "Z")
                .dim(Dimension::Campus, "b")
                .revenue(3),
            Row::new("202401")
                .dim(Dimension::Brand, "A")
                .dim(Dimension::Campus, "a")
                .revenue(4),
        ]);
        let breakdown = aggregate_breakdown(&all(&ledger), &[Dimension::Brand, Dimension::Campus]);
        let keys: Vec<_> = breakdown.iter().map(|r| r.key.join("|")).collect();
        assert_eq!(keys, vec!["A|a", "A|c", "Z|b"]);
        assert_eq!(breakdown[2].metrics.revenue, dec!(4));
        assert_eq!(breakdown[2].label, "Z / b");
    }

    #[test]
    fn empty_selection_aggregates_to_nothing() {
        let rows: Vec<&LedgerRow> = Vec::new();
        assert_eq!(aggregate_totals(&rows), Metrics::default());
        assert!(aggregate_breakdown(&rows, &[Dimension::Campus]).is_empty());
        assert!(aggregate_trend(&rows, TrendBucket::Quarter, true).is_empty());
        assert!(quarterly_by_year(&rows, false).is_empty());
    }

    #[test]
    fn heatmap_fills_missing_cells_with_zero() {
        let ledger = ledger(&[
            Row::new("202401").dim(Dimension::Campus, "B").revenue(10),
            Row::new("202403").dim(Dimension::Campus, "A").revenue(30),
            Row::new("202401").dim(Dimension::Campus, "B").revenue(5),
        ]);
        let map = heatmap(&all(&ledger), Dimension::Campus, Metric::Revenue);
        assert_eq!(map.months, vec!["01", "03"]);
        assert_eq!(map.rows[0].label, "A");
        assert_eq!(map.rows[0].values, vec![dec!(0), dec!(30)]);
        assert_eq!(map.rows[1].values, vec![dec!(15), dec!(0)]);
    }

    #[test]
    fn quarterly_series_run_within_each_year() {
        let ledger = ledger(&[
            Row::new("202301").revenue(1),
            Row::new("202305").revenue(2),
            Row::new("202402").revenue(10),
            Row::new("202408").revenue(20),
        ]);
        let series = quarterly_by_year(&all(&ledger), true);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].year, "2023");
        assert_eq!(series[0].points[1].quarter, Quarter::Q2);
        assert_eq!(series[0].points[1].metrics.revenue, dec!(3));
        assert_eq!(series[1].points[0].quarter, Quarter::Q1);
        assert_eq!(series[1].points[1].quarter, Quarter::Q3);
        assert_eq!(series[1].points[1].metrics.revenue, dec!(30));
    }

    #[test]
    fn margin_handles_zero_revenue() {
        assert_eq!(Metrics::default().profit_margin(), Decimal::ZERO);
        let m = Metrics::new(dec!(200), dec!(150), dec!(50));
        assert_eq!(m.profit_margin(), dec!(25));
    }

    #[test]
    fn margin_out_of_range_is_zero() {
        let m = Metrics::new(
            dec!(0.0000000000000000000001),
            dec!(-50_000_000_000),
            dec!(50_000_000_000),
        );
        assert_eq!(m.profit_margin(), Decimal::ZERO);
    }
}
