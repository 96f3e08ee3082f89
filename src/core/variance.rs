//! Target versus comparison deltas, shared by totals, breakdowns and trends.

use super::aggregate::{AggregateRow, Metrics};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Percentage change of a target value against its comparison value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Rate {
    Percent(#[schemars(with = "String")] Decimal),
    /// Comparison and target are both 0. Counts as a 0 % change.
    NotApplicable,
    /// Comparison is 0 and target is not. Counts as +infinity.
    Infinite,
}

impl Rate {
    /// `(target - comparison) / comparison * 100`.
    pub fn between(target: Decimal, comparison: Decimal) -> Rate {
        if comparison.is_zero() {
            return if target.is_zero() {
                Rate::NotApplicable
            } else {
                Rate::Infinite
            };
        }
        (target - comparison)
            .checked_div(comparison)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(Rate::Percent)
            .unwrap_or(Rate::Infinite)
    }

    pub fn percent(&self) -> Option<Decimal> {
        match self {
            Rate::Percent(p) => Some(*p),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Rate::Percent(p) => p.to_f64().unwrap_or_default(),
            Rate::NotApplicable => 0.0,
            Rate::Infinite => f64::INFINITY,
        }
    }

    pub fn is_above(&self, threshold: Decimal) -> bool {
        match self {
            Rate::Percent(p) => *p > threshold,
            Rate::NotApplicable => Decimal::ZERO > threshold,
            Rate::Infinite => true,
        }
    }

    pub fn is_below(&self, threshold: Decimal) -> bool {
        match self {
            Rate::Percent(p) => *p < threshold,
            Rate::NotApplicable => Decimal::ZERO < threshold,
            Rate::Infinite => false,
        }
    }

    /// Numeric ordering with `NotApplicable` as 0 and `Infinite` above everything.
    pub fn cmp_value(&self, other: &Rate) -> Ordering {
        let rank = |r: &Rate| match r {
            Rate::Percent(p) => (0, *p),
            Rate::NotApplicable => (0, Decimal::ZERO),
            Rate::Infinite => (1, Decimal::ZERO),
        };
        rank(self).cmp(&rank(other))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Percent(p) => write!(f, "{:.1} %", p.round_dp(1)),
            Rate::NotApplicable => f.write_str("N/A"),
            Rate::Infinite => f.write_str("Inf %"),
        }
    }
}

/// One metric compared across two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Variance {
    #[schemars(with = "String")]
    pub target: Decimal,
    #[schemars(with = "String")]
    pub comparison: Decimal,
    #[schemars(with = "String")]
    pub delta: Decimal,
    pub rate: Rate,
}

impl Variance {
    pub fn between(target: Decimal, comparison: Decimal) -> Self {
        Variance {
            target,
            comparison,
            delta: target - comparison,
            rate: Rate::between(target, comparison),
        }
    }

    /// A value with no comparison: delta 0 and rate not applicable.
    pub fn target_only(target: Decimal) -> Self {
        Variance {
            target,
            comparison: Decimal::ZERO,
            delta: Decimal::ZERO,
            rate: Rate::NotApplicable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MetricsVariance {
    pub revenue: Variance,
    pub total_cost: Variance,
    pub operating_profit: Variance,
}

impl MetricsVariance {
    pub fn between(target: &Metrics, comparison: &Metrics) -> Self {
        MetricsVariance {
            revenue: Variance::between(target.revenue, comparison.revenue),
            total_cost: Variance::between(target.total_cost, comparison.total_cost),
            operating_profit: Variance::between(
                target.operating_profit,
                comparison.operating_profit,
            ),
        }
    }

    pub fn target_only(target: &Metrics) -> Self {
        MetricsVariance {
            revenue: Variance::target_only(target.revenue),
            total_cost: Variance::target_only(target.total_cost),
            operating_profit: Variance::target_only(target.operating_profit),
        }
    }

    pub fn target(&self) -> Metrics {
        Metrics::new(
            self.revenue.target,
            self.total_cost.target,
            self.operating_profit.target,
        )
    }

    pub fn delta(&self) -> Metrics {
        Metrics::new(
            self.revenue.delta,
            self.total_cost.delta,
            self.operating_profit.delta,
        )
    }
}

/// Which side of the comparison a joined row was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    /// New in the target period.
    TargetOnly,
    /// Vanished since the comparison period.
    ComparisonOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct VarianceRow {
    pub key: Vec<String>,
    pub label: String,
    pub presence: Presence,
    pub variance: MetricsVariance,
}

/// Field used to match target rows with comparison rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOn {
    /// Dimension key tuple, for breakdowns.
    Key,
    /// Display label, for trends.
    ///
    /// Month labels carry no year, so with several target years the rows of the same
    /// month are summed into one joined row (running totals too, when cumulative).
    /// Quarter labels carry the year, so quarter rows only align within the same year;
    /// a year-over-year quarter comparison shows each side as unmatched.
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct VarianceTable {
    pub has_comparison: bool,
    pub rows: Vec<VarianceRow>,
}

struct Joined<'a> {
    key: &'a [String],
    label: &'a str,
    target: Option<Metrics>,
    comparison: Option<Metrics>,
}

/// Outer-join target and comparison aggregates and compute per-row variance.
///
/// Rows missing on one side are treated as 0 there. Without a comparison, or with an
/// empty one, every row is target-only. Output follows target order, then rows found
/// only in the comparison.
pub fn compute_variance(
    target: &[AggregateRow],
    comparison: Option<&[AggregateRow]>,
    join: JoinOn,
) -> VarianceTable {
    let comparison = match comparison {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            let rows = target
                .iter()
                .map(|row| VarianceRow {
                    key: row.key.clone(),
                    label: row.label.clone(),
                    presence: Presence::TargetOnly,
                    variance: MetricsVariance::target_only(&row.metrics),
                })
                .collect();
            return VarianceTable {
                has_comparison: false,
                rows,
            };
        }
    };

    let join_key = |row: &AggregateRow| -> Vec<String> {
        match join {
            JoinOn::Key => row.key.clone(),
            JoinOn::Label => vec![row.label.clone()],
        }
    };

    let mut joined: Vec<Joined> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    for (row, is_target) in target
        .iter()
        .map(|r| (r, true))
        .chain(comparison.iter().map(|r| (r, false)))
    {
        let at = *index.entry(join_key(row)).or_insert_with(|| {
            joined.push(Joined {
                key: &row.key,
                label: &row.label,
                target: None,
                comparison: None,
            });
            joined.len() - 1
        });
        let side = if is_target {
            &mut joined[at].target
        } else {
            &mut joined[at].comparison
        };
        *side.get_or_insert_with(Metrics::default) += row.metrics;
    }

    let rows = joined
        .into_iter()
        .map(|j| {
            let presence = match (j.target.is_some(), j.comparison.is_some()) {
                (true, true) => Presence::Both,
                (true, false) => Presence::TargetOnly,
                _ => Presence::ComparisonOnly,
            };
            VarianceRow {
                key: j.key.to_vec(),
                label: j.label.to_string(),
                presence,
                variance: MetricsVariance::between(
                    &j.target.unwrap_or_default(),
                    &j.comparison.unwrap_or_default(),
                ),
            }
        })
        .collect();
    VarianceTable {
        has_comparison: true,
        rows,
    }
}

impl VarianceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sorted_by_key(mut self) -> Self {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }

    /// Column sums of target and delta, with the rate recomputed from the sums.
    pub fn grand_total(&self) -> MetricsVariance {
        let target: Metrics = self.rows.iter().map(|r| r.variance.target()).sum();
        if !self.has_comparison {
            return MetricsVariance::target_only(&target);
        }
        let delta: Metrics = self.rows.iter().map(|r| r.variance.delta()).sum();
        MetricsVariance::between(&target, &(target - delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn agg(key: &str, revenue: Decimal, cost: Decimal) -> AggregateRow {
        AggregateRow {
            key: vec![key.to_string()],
            label: key.to_string(),
            metrics: Metrics::new(revenue, cost, revenue - cost),
        }
    }

    #[test]
    fn zero_division_policy() {
        let v = Variance::between(dec!(0), dec!(0));
        assert_eq!(v.delta, dec!(0));
        assert_eq!(v.rate, Rate::NotApplicable);
        assert_eq!(v.rate.to_f64(), 0.0);
        assert_eq!(v.rate.to_string(), "N/A");

        let v = Variance::between(dec!(5000), dec!(0));
        assert_eq!(v.delta, dec!(5000));
        assert_eq!(v.rate, Rate::Infinite);
        assert!(v.rate.to_f64().is_infinite());
        assert_eq!(v.rate.to_string(), "Inf %");
    }

    #[test]
    fn rate_is_relative_to_comparison() {
        assert_eq!(Rate::between(dec!(500000), dec!(400000)), Rate::Percent(dec!(25)));
        assert_eq!(Rate::between(dec!(90), dec!(100)), Rate::Percent(dec!(-10)));
        assert_eq!(Rate::Percent(dec!(12.345)).to_string(), "12.3 %");
    }

    #[test]
    fn thresholds_treat_sentinels_numerically() {
        assert!(Rate::Infinite.is_above(dec!(5)));
        assert!(!Rate::Infinite.is_below(dec!(-5)));
        assert!(!Rate::NotApplicable.is_above(dec!(5)));
        assert!(!Rate::NotApplicable.is_below(dec!(-5)));
        assert!(Rate::Percent(dec!(7)).is_above(dec!(5)));
        assert!(!Rate::Percent(dec!(5)).is_above(dec!(5)));
        assert_eq!(
            Rate::Infinite.cmp_value(&Rate::Percent(dec!(1000))),
            Ordering::Greater
        );
        assert_eq!(
            Rate::NotApplicable.cmp_value(&Rate::Percent(dec!(-1))),
            Ordering::Greater
        );
    }

    #[test]
    fn grand_total_recomputes_rate_from_sums() {
        let target = vec![
            agg("a", dec!(200), dec!(0)),
            agg("b", dec!(100), dec!(0)),
            agg("c", dec!(100), dec!(0)),
        ];
        let comparison = vec![
            agg("a", dec!(100), dec!(0)),
            agg("b", dec!(100), dec!(0)),
            agg("c", dec!(200), dec!(0)),
        ];
        let table = compute_variance(&target, Some(&comparison[..]), JoinOn::Key);
        let rates: Vec<_> = table
            .rows
            .iter()
            .map(|r| r.variance.revenue.rate.percent().unwrap())
            .collect();
        assert_eq!(rates, vec![dec!(100), dec!(0), dec!(-50)]);

        let total = table.grand_total();
        assert_eq!(total.revenue.target, dec!(400));
        assert_eq!(total.revenue.comparison, dec!(400));
        assert_eq!(total.revenue.delta, dec!(0));
        assert_eq!(total.revenue.rate, Rate::Percent(dec!(0)));
        let average: Decimal = rates.iter().sum::<Decimal>() / Decimal::from(3);
        assert!(average > dec!(16));
    }

    #[test]
    fn outer_join_keeps_new_and_vanished_rows() {
        let target = vec![agg("kept", dec!(100), dec!(10)), agg("new", dec!(40), dec!(0))];
        let comparison = vec![agg("gone", dec!(70), dec!(20)), agg("kept", dec!(80), dec!(10))];
        let table = compute_variance(&target, Some(&comparison[..]), JoinOn::Key);
        assert!(table.has_comparison);
        let keys: Vec<_> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(keys, vec!["kept", "new", "gone"]);

        let new = &table.rows[1];
        assert_eq!(new.presence, Presence::TargetOnly);
        assert_eq!(new.variance.revenue.comparison, dec!(0));
        assert_eq!(new.variance.revenue.rate, Rate::Infinite);

        let gone = &table.rows[2];
        assert_eq!(gone.presence, Presence::ComparisonOnly);
        assert_eq!(gone.variance.revenue.target, dec!(0));
        assert_eq!(gone.variance.revenue.delta, dec!(-70));
        assert_eq!(gone.variance.revenue.rate, Rate::Percent(dec!(-100)));

        let sorted = table.sorted_by_key();
        let keys: Vec<_> = sorted.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(keys, vec!["gone", "kept", "new"]);
    }

    #[test]
    fn missing_or_empty_comparison_is_target_only() {
        let target = vec![agg("a", dec!(100), dec!(60))];
        for table in [
            compute_variance(&target, None, JoinOn::Label),
            compute_variance(&target, Some(&[][..]), JoinOn::Label),
        ] {
            assert!(!table.has_comparison);
            let v = table.rows[0].variance;
            assert_eq!(v.revenue.target, dec!(100));
            assert_eq!(v.revenue.delta, dec!(0));
            assert_eq!(v.operating_profit.target, dec!(40));
            assert_eq!(table.grand_total().revenue.rate, Rate::NotApplicable);
        }
    }

    #[test]
    fn label_join_aligns_trend_buckets() {
        let mut target = vec![agg("2024-01", dec!(10), dec!(0))];
        target[0].label = "1".to_string();
        let mut comparison = vec![agg("2023-01", dec!(5), dec!(0))];
        comparison[0].label = "1".to_string();
        let table = compute_variance(&target, Some(&comparison[..]), JoinOn::Label);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].variance.revenue.delta, dec!(5));

        let by_key = compute_variance(&target, Some(&comparison[..]), JoinOn::Key);
        assert_eq!(by_key.rows.len(), 2);
    }

    #[test]
    fn empty_target_with_comparison_lists_vanished_rows() {
        let comparison = vec![agg("a", dec!(10), dec!(0))];
        let table = compute_variance(&[], Some(&comparison[..]), JoinOn::Key);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.grand_total().revenue.delta, dec!(-10));
    }
}
