//! Per-item and per-category cost variance.

use super::ledger::LedgerRow;
use super::schema::{CostCategory, CostItem};
use super::variance::Variance;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CostItemVariance {
    pub item: CostItem,
    pub category: CostCategory,
    pub variance: Variance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CategoryVariance {
    pub category: CostCategory,
    pub variance: Variance,
}

fn sum_item(rows: &[&LedgerRow], item: CostItem) -> Decimal {
    rows.iter().map(|r| r.cost(item)).sum()
}

/// Sum each cost item over both selections and compare them.
///
/// Without a comparison selection every item is target-only.
pub fn analyze_cost_items(
    target: &[&LedgerRow],
    comparison: Option<&[&LedgerRow]>,
    items: &[CostItem],
) -> Vec<CostItemVariance> {
    items
        .iter()
        .map(|&item| {
            let target_sum = sum_item(target, item);
            let variance = match comparison {
                Some(rows) => Variance::between(target_sum, sum_item(rows, item)),
                None => Variance::target_only(target_sum),
            };
            CostItemVariance {
                item,
                category: item.category(),
                variance,
            }
        })
        .collect()
}

/// Roll item variances up into every category. Items absent from `items` count as 0.
pub fn analyze_categories(items: &[CostItemVariance], has_comparison: bool) -> Vec<CategoryVariance> {
    CostCategory::ALL
        .iter()
        .map(|&category| {
            let (target, comparison) = items
                .iter()
                .filter(|i| i.category == category)
                .fold((Decimal::ZERO, Decimal::ZERO), |(t, c), i| {
                    (t + i.variance.target, c + i.variance.comparison)
                });
            let variance = if has_comparison {
                Variance::between(target, comparison)
            } else {
                Variance::target_only(target)
            };
            CategoryVariance { category, variance }
        })
        .collect()
}

/// Category with the largest positive delta. Ties go to the earlier category.
pub fn largest_increase(categories: &[CategoryVariance]) -> Option<&CategoryVariance> {
    categories
        .iter()
        .filter(|c| c.variance.delta > Decimal::ZERO)
        .fold(None, |best: Option<&CategoryVariance>, c| match best {
            Some(b) if b.variance.delta >= c.variance.delta => Some(b),
            _ => Some(c),
        })
}

/// Category with the most negative delta. Ties go to the earlier category.
pub fn largest_decrease(categories: &[CategoryVariance]) -> Option<&CategoryVariance> {
    categories
        .iter()
        .filter(|c| c.variance.delta < Decimal::ZERO)
        .fold(None, |best: Option<&CategoryVariance>, c| match best {
            Some(b) if b.variance.delta <= c.variance.delta => Some(b),
            _ => Some(c),
        })
}

/// Up to `n` items that grew, largest delta first.
pub fn top_increases(items: &[CostItemVariance], n: usize) -> Vec<&CostItemVariance> {
    let mut rising: Vec<_> = items
        .iter()
        .filter(|i| i.variance.delta > Decimal::ZERO)
        .collect();
    rising.sort_by(|a, b| b.variance.delta.cmp(&a.variance.delta));
    rising.truncate(n);
    rising
}

/// Up to `n` items that shrank, most negative delta first.
pub fn top_decreases(items: &[CostItemVariance], n: usize) -> Vec<&CostItemVariance> {
    let mut falling: Vec<_> = items
        .iter()
        .filter(|i| i.variance.delta < Decimal::ZERO)
        .collect();
    falling.sort_by(|a, b| a.variance.delta.cmp(&b.variance.delta));
    falling.truncate(n);
    falling
}
