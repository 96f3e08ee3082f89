//! Display units and number formatting for terminal and HTML output.

use clap::ValueEnum;
use num_format::{Locale, ToFormattedString};
use pnlc::core::{MetricsVariance, Rate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Currency unit amounts are scaled to when shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DisplayUnit {
    /// 원
    Won,
    /// 천 원
    Thousand,
    /// 백만 원
    #[default]
    Million,
    /// 천만 원
    TenMillion,
    /// 억 원
    HundredMillion,
}

impl DisplayUnit {
    pub fn divisor(self) -> Decimal {
        match self {
            DisplayUnit::Won => Decimal::ONE,
            DisplayUnit::Thousand => Decimal::from(1_000),
            DisplayUnit::Million => Decimal::from(1_000_000),
            DisplayUnit::TenMillion => Decimal::from(10_000_000),
            DisplayUnit::HundredMillion => Decimal::from(100_000_000),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DisplayUnit::Won => " 원",
            DisplayUnit::Thousand => " 천 원",
            DisplayUnit::Million => " 백만 원",
            DisplayUnit::TenMillion => " 천만 원",
            DisplayUnit::HundredMillion => " 억 원",
        }
    }
}

/// Fixed decimal places with thousands separators, e.g. `-1,234.5`.
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded =
        value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let abs = rounded.abs();
    let whole = abs.trunc().to_i64().unwrap_or_default();
    let mut out = whole.to_formatted_string(&Locale::en);
    if decimals > 0 {
        let scale = Decimal::from(10u64.pow(decimals));
        let frac = (abs.fract() * scale).trunc().to_u64().unwrap_or_default();
        out.push_str(&format!(".{:0width$}", frac, width = decimals as usize));
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", out)
    } else {
        out
    }
}

/// Base unit amounts are whole numbers, scaled units keep one decimal.
pub fn format_currency(amount: Decimal, unit: DisplayUnit) -> String {
    match unit {
        DisplayUnit::Won => format!("{}{}", format_number(amount.trunc(), 0), unit.suffix()),
        _ => format!(
            "{}{}",
            format_number(amount / unit.divisor(), 1),
            unit.suffix()
        ),
    }
}

pub fn format_rate(rate: &Rate) -> String {
    match rate {
        Rate::Percent(p) => format!("{} %", format_number(*p, 1)),
        Rate::NotApplicable => "N/A".to_string(),
        Rate::Infinite => "Inf %".to_string(),
    }
}

/// Plain numeric rate for CSV output.
pub fn rate_cell(rate: &Rate) -> String {
    match rate {
        Rate::Percent(p) => p.round_dp(4).normalize().to_string(),
        Rate::NotApplicable => "N/A".to_string(),
        Rate::Infinite => "Inf".to_string(),
    }
}

#[derive(Debug, Clone, Tabled)]
struct TargetLine {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "매출액")]
    revenue: String,
    #[tabled(rename = "총비용")]
    total_cost: String,
    #[tabled(rename = "영업이익")]
    operating_profit: String,
}

#[derive(Debug, Clone, Tabled)]
struct ComparisonLine {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "매출액")]
    revenue: String,
    #[tabled(rename = "매출액 Δ")]
    revenue_delta: String,
    #[tabled(rename = "매출액 Δ%")]
    revenue_rate: String,
    #[tabled(rename = "총비용")]
    total_cost: String,
    #[tabled(rename = "총비용 Δ")]
    total_cost_delta: String,
    #[tabled(rename = "영업이익")]
    operating_profit: String,
    #[tabled(rename = "영업이익 Δ")]
    operating_profit_delta: String,
    #[tabled(rename = "영업이익 Δ%")]
    operating_profit_rate: String,
}

pub fn render(table: &mut Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}

/// Render labelled metric variances, with delta columns only when there is a comparison.
pub fn variance_table<'a, I>(rows: I, has_comparison: bool, unit: DisplayUnit) -> String
where
    I: IntoIterator<Item = (String, &'a MetricsVariance)>,
{
    let money = |amount: Decimal| format_currency(amount, unit);
    if has_comparison {
        let lines: Vec<ComparisonLine> = rows
            .into_iter()
            .map(|(label, v)| ComparisonLine {
                label,
                revenue: money(v.revenue.target),
                revenue_delta: money(v.revenue.delta),
                revenue_rate: format_rate(&v.revenue.rate),
                total_cost: money(v.total_cost.target),
                total_cost_delta: money(v.total_cost.delta),
                operating_profit: money(v.operating_profit.target),
                operating_profit_delta: money(v.operating_profit.delta),
                operating_profit_rate: format_rate(&v.operating_profit.rate),
            })
            .collect();
        render(&mut Table::new(lines))
    } else {
        let lines: Vec<TargetLine> = rows
            .into_iter()
            .map(|(label, v)| TargetLine {
                label,
                revenue: money(v.revenue.target),
                total_cost: money(v.total_cost.target),
                operating_profit: money(v.operating_profit.target),
            })
            .collect();
        render(&mut Table::new(lines))
    }
}
