//! Rule-based observations over aggregated results.

use super::aggregate::Metrics;
use super::costs::{largest_decrease, largest_increase, CategoryVariance, CostItemVariance};
use super::variance::Rate;
use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;

/// Revenue rate beyond +/- this is growth or decline, otherwise "maintained".
pub const REVENUE_THRESHOLD: Decimal = dec!(5);
/// Profit rate beyond +/- this is reported. Smaller changes are not.
pub const PROFIT_THRESHOLD: Decimal = dec!(10);
/// Cost items need a comparison amount above this to be considered for surge alerts.
pub const COST_MATERIALITY_FLOOR: Decimal = dec!(1000000);
/// Growth rate above which a material cost item is reported.
pub const COST_SURGE_THRESHOLD: Decimal = dec!(20);
pub const COST_SURGE_CANDIDATES: usize = 3;
/// Margin above which the target-only margin insight is positive.
pub const HEALTHY_MARGIN: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InsightKind::Positive => "+",
            InsightKind::Negative => "!",
            InsightKind::Neutral => "i",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub body: String,
}

impl Insight {
    fn new(kind: InsightKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Insight {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    /// The single notice returned when the selection has no rows.
    pub fn no_data() -> Self {
        Insight::new(
            InsightKind::Neutral,
            "No data",
            "No rows match the selected period and filters.",
        )
    }
}

fn won(amount: Decimal) -> String {
    let whole = amount.round().to_i64().unwrap_or_default();
    format!("{} 원", whole.to_formatted_string(&Locale::en))
}

fn magnitude(rate: Rate) -> Rate {
    match rate {
        Rate::Percent(p) => Rate::Percent(p.abs()),
        other => other,
    }
}

/// Derive insights from totals and cost analysis.
///
/// With a comparison: revenue direction (always one insight), profit direction (only
/// beyond the threshold), the categories with the largest increase and decrease, and
/// surging material cost items. Without one: a period summary and a margin assessment.
pub fn generate_insights(
    target: &Metrics,
    comparison: Option<&Metrics>,
    cost_items: &[CostItemVariance],
    categories: &[CategoryVariance],
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let comparison = match comparison {
        Some(comparison) => comparison,
        None => {
            insights.push(Insight::new(
                InsightKind::Neutral,
                "Current period",
                format!(
                    "Total revenue {}, operating profit {}.",
                    won(target.revenue),
                    won(target.operating_profit)
                ),
            ));
            let margin = target.profit_margin();
            let healthy = margin > HEALTHY_MARGIN;
            insights.push(Insight::new(
                if healthy {
                    InsightKind::Positive
                } else {
                    InsightKind::Negative
                },
                "Operating margin",
                format!(
                    "Operating margin is {:.1} %. {}",
                    margin.round_dp(1),
                    if healthy {
                        "This is a healthy level."
                    } else {
                        "Improvement is needed."
                    }
                ),
            ));
            return insights;
        }
    };

    let revenue_delta = target.revenue - comparison.revenue;
    let revenue_rate = Rate::between(target.revenue, comparison.revenue);
    if revenue_rate.is_above(REVENUE_THRESHOLD) {
        insights.push(Insight::new(
            InsightKind::Positive,
            "Revenue growth",
            format!(
                "Revenue rose {} against the comparison period ({} increase).",
                revenue_rate,
                won(revenue_delta)
            ),
        ));
    } else if revenue_rate.is_below(-REVENUE_THRESHOLD) {
        insights.push(Insight::new(
            InsightKind::Negative,
            "Revenue decline",
            format!(
                "Revenue fell {} against the comparison period ({} decrease).",
                magnitude(revenue_rate),
                won(revenue_delta.abs())
            ),
        ));
    } else {
        insights.push(Insight::new(
            InsightKind::Neutral,
            "Revenue maintained",
            format!(
                "Revenue is close to the comparison period (change {}).",
                revenue_rate
            ),
        ));
    }

    let profit_rate = Rate::between(target.operating_profit, comparison.operating_profit);
    if profit_rate.is_above(PROFIT_THRESHOLD) {
        insights.push(Insight::new(
            InsightKind::Positive,
            "Profitability improved",
            format!(
                "Operating profit rose {} against the comparison period.",
                profit_rate
            ),
        ));
    } else if profit_rate.is_below(-PROFIT_THRESHOLD) {
        insights.push(Insight::new(
            InsightKind::Negative,
            "Profitability worsened",
            format!(
                "Operating profit fell {} against the comparison period. Review the cost structure.",
                magnitude(profit_rate)
            ),
        ));
    }

    if let Some(up) = largest_increase(categories) {
        insights.push(Insight::new(
            InsightKind::Negative,
            format!("Largest cost increase: {}", up.category),
            format!(
                "{} costs increased by {} ({}). Check the items in this category.",
                up.category,
                won(up.variance.delta),
                up.variance.rate
            ),
        ));
    }
    if let Some(down) = largest_decrease(categories) {
        insights.push(Insight::new(
            InsightKind::Positive,
            format!("Largest cost reduction: {}", down.category),
            format!(
                "{} costs decreased by {} ({}).",
                down.category,
                won(down.variance.delta.abs()),
                magnitude(down.variance.rate)
            ),
        ));
    }

    let mut material: Vec<&CostItemVariance> = cost_items
        .iter()
        .filter(|i| i.variance.comparison > COST_MATERIALITY_FLOOR)
        .collect();
    material.sort_by(|a, b| b.variance.rate.cmp_value(&a.variance.rate));
    for item in material.into_iter().take(COST_SURGE_CANDIDATES) {
        if item.variance.rate.is_above(COST_SURGE_THRESHOLD) {
            insights.push(Insight::new(
                InsightKind::Negative,
                format!("{} surge", item.item),
                format!(
                    "{} grew {}. The cause should be identified.",
                    item.item, item.variance.rate
                ),
            ));
        }
    }

    insights
}
