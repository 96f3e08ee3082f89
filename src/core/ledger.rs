//! Loading and derivation of the cost-center-month ledger.

use super::schema::{
    required_columns, CostItem, Dimension, Quarter, COST_ITEM_COUNT, MONTH_COLUMN, NOT_AVAILABLE,
    OPERATING_PROFIT_COLUMN, PERIOD_COLUMN, QUARTER_COLUMN, REVENUE_COLUMN, TOTAL_COST_COLUMN,
    YEAR_COLUMN, YEAR_QUARTER_COLUMN,
};
use super::warnings::Warning;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },
    #[error("invalid period key '{value}' on row {row}: expected six digits (yyyymm)")]
    InvalidPeriodKey { row: usize, value: String },
    #[error("failed to read ledger csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read ledger file: {0}")]
    Io(#[from] std::io::Error),
}

/// Untyped table as delivered by the loader: a header row and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        RawTable { headers, records }
    }

    /// Read a CSV export of the source sheet. Ragged records are accepted; absent
    /// trailing cells count as missing.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, LedgerError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let records = rdr
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
        log::info!("Read {} csv records", records.len());
        Ok(RawTable { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// A derived ledger record. Built only by [`derive_ledger`], after which it is never
/// recomputed: `operating_profit == revenue - total_cost` holds for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub period_key: String,
    pub year: String,
    pub month: String,
    pub quarter: Quarter,
    pub year_quarter: String,
    pub revenue_code: String,
    pub campus: String,
    pub brand: String,
    pub business_unit: String,
    pub revenue: Decimal,
    pub costs: [Decimal; COST_ITEM_COUNT],
    pub total_cost: Decimal,
    pub operating_profit: Decimal,
}

impl LedgerRow {
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::RevenueCode => &self.revenue_code,
            Dimension::Campus => &self.campus,
            Dimension::Brand => &self.brand,
            Dimension::BusinessUnit => &self.business_unit,
        }
    }

    pub fn cost(&self, item: CostItem) -> Decimal {
        self.costs[item.index()]
    }

    /// Numeric form of the period key, used for chronological ordering.
    pub fn sort_key(&self) -> u32 {
        self.period_key.parse().unwrap_or_default()
    }
}

/// The derived ledger for one loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
    cost_items: Vec<CostItem>,
    warnings: Vec<Warning>,
}

impl Ledger {
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Cost items whose columns were present in the source.
    pub fn cost_items(&self) -> &[CostItem] {
        &self.cost_items
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_degraded(&self) -> bool {
        self.cost_items.len() < COST_ITEM_COUNT
    }

    /// Distinct years, most recent first.
    pub fn years(&self) -> Vec<String> {
        let years: BTreeSet<&str> = self.rows.iter().map(|r| r.year.as_str()).collect();
        years.into_iter().rev().map(str::to_string).collect()
    }

    /// Distinct zero-padded months, ascending.
    pub fn months(&self) -> Vec<String> {
        let months: BTreeSet<&str> = self.rows.iter().map(|r| r.month.as_str()).collect();
        months.into_iter().map(str::to_string).collect()
    }

    /// Distinct values of a dimension, ascending.
    pub fn distinct(&self, dimension: Dimension) -> Vec<String> {
        let values: BTreeSet<&str> = self.rows.iter().map(|r| r.dimension(dimension)).collect();
        values.into_iter().map(str::to_string).collect()
    }

    /// Column names of the derived view, in output order.
    pub fn header(&self) -> Vec<&'static str> {
        let mut header = vec![
            PERIOD_COLUMN,
            YEAR_COLUMN,
            MONTH_COLUMN,
            QUARTER_COLUMN,
            YEAR_QUARTER_COLUMN,
        ];
        header.extend(Dimension::ALL.iter().map(|d| d.column()));
        header.push(REVENUE_COLUMN);
        header.extend(self.cost_items.iter().map(|item| item.name()));
        header.push(TOTAL_COST_COLUMN);
        header.push(OPERATING_PROFIT_COLUMN);
        header
    }

    /// Write the derived ledger, including calendar and financial fields, as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), LedgerError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![
                row.period_key.clone(),
                row.year.clone(),
                row.month.clone(),
                row.quarter.to_string(),
                row.year_quarter.clone(),
            ];
            record.extend(Dimension::ALL.iter().map(|d| row.dimension(*d).to_string()));
            record.push(row.revenue.normalize().to_string());
            record.extend(
                self.cost_items
                    .iter()
                    .map(|item| row.cost(*item).normalize().to_string()),
            );
            record.push(row.total_cost.normalize().to_string());
            record.push(row.operating_profit.normalize().to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Validate the raw table and derive calendar and financial fields.
///
/// Fails if a required column is absent. Missing cost columns are recoverable: the ledger
/// is returned with [`Warning::MissingCostColumns`], total cost 0 and operating profit equal
/// to revenue.
pub fn derive_ledger(raw: &RawTable) -> Result<Ledger, LedgerError> {
    for column in required_columns() {
        if raw.column(column).is_none() {
            return Err(LedgerError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    let column = |name: &str| raw.column(name);
    let period_idx = column(PERIOD_COLUMN);
    let revenue_idx = column(REVENUE_COLUMN);
    let dimension_idx = Dimension::ALL.map(|d| column(d.column()));

    let cost_idx: Vec<Option<usize>> = CostItem::all().map(|item| column(item.name())).collect();
    let cost_items: Vec<CostItem> = CostItem::all()
        .filter(|item| cost_idx[item.index()].is_some())
        .collect();
    let missing: Vec<String> = CostItem::all()
        .filter(|item| cost_idx[item.index()].is_none())
        .map(|item| item.name().to_string())
        .collect();
    let degraded = !missing.is_empty();

    let mut rows = Vec::with_capacity(raw.len());
    for (n, record) in raw.records.iter().enumerate() {
        let raw_period = cell(record, period_idx).unwrap_or_default();
        let period_key =
            normalize_period_key(raw_period).ok_or_else(|| LedgerError::InvalidPeriodKey {
                row: n + 1,
                value: raw_period.to_string(),
            })?;
        let year = period_key[..4].to_string();
        let month = period_key[4..6].to_string();
        let quarter = Quarter::from_month(&month);
        let year_quarter = format!("{} {}", year, quarter);

        let [revenue_code, campus, brand, business_unit] =
            dimension_idx.map(|idx| dimension_value(cell(record, idx)));

        let revenue = parse_amount(cell(record, revenue_idx));
        let mut costs = [Decimal::ZERO; COST_ITEM_COUNT];
        for (slot, idx) in costs.iter_mut().zip(&cost_idx) {
            *slot = parse_amount(cell(record, *idx));
        }
        let total_cost = if degraded {
            Decimal::ZERO
        } else {
            costs.iter().copied().sum()
        };

        rows.push(LedgerRow {
            period_key,
            year,
            month,
            quarter,
            year_quarter,
            revenue_code,
            campus,
            brand,
            business_unit,
            revenue,
            costs,
            total_cost,
            operating_profit: revenue - total_cost,
        });
    }

    let mut warnings = Vec::new();
    if degraded {
        let warning = Warning::MissingCostColumns { columns: missing };
        log::warn!("{}", warning);
        warnings.push(warning);
    }
    log::info!(
        "Derived {} ledger rows ({} of {} cost columns present)",
        rows.len(),
        cost_items.len(),
        COST_ITEM_COUNT
    );

    Ok(Ledger {
        rows,
        cost_items,
        warnings,
    })
}

fn cell(record: &[String], idx: Option<usize>) -> Option<&str> {
    let value = record.get(idx?)?.trim();
    (!value.is_empty()).then_some(value)
}

fn dimension_value(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Accepts `yyyymm`, tolerating the `.0` suffix of spreadsheet float exports.
fn normalize_period_key(value: &str) -> Option<String> {
    let value = value.trim();
    let value = value.strip_suffix(".0").unwrap_or(value);
    (value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit())).then(|| value.to_string())
}

/// Largest magnitude accepted for a single cell. Sums of many rows stay far below the
/// `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x38D7E, 0, false, 0);

/// Coerce a cell to an amount; anything unparseable or beyond [`MAX_AMOUNT`] is 0.
pub(crate) fn parse_amount(value: Option<&str>) -> Decimal {
    let Some(value) = value else {
        return Decimal::ZERO;
    };
    let value = value.trim().replace(',', "");
    if value.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&value)
        .or_else(|_| Decimal::from_scientific(&value))
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .and_then(Decimal::from_f64)
        })
        .filter(|amount| amount.abs() <= MAX_AMOUNT)
        .map(|amount| amount.round_dp(AMOUNT_SCALE))
        .unwrap_or(Decimal::ZERO)
}

const AMOUNT_SCALE: u32 = 4;
