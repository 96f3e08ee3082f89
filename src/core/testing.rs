//! Test-only builders for ledgers with the full column set.

use super::ledger::{derive_ledger, Ledger, LedgerRow, RawTable};
use super::schema::{required_columns, CostItem, Dimension};

#[derive(Debug, Clone)]
pub struct Row {
    period: String,
    dimensions: [String; 4],
    revenue: i64,
    costs: Vec<(&'static str, i64)>,
}

impl Row {
    pub fn new(period: &str) -> Self {
        Row {
            period: period.to_string(),
            dimensions: ["R1", "C1", "B1", "U1"].map(str::to_string),
            revenue: 0,
            costs: Vec::new(),
        }
    }

    pub fn revenue(mut self, amount: i64) -> Self {
        self.revenue = amount;
        self
    }

    pub fn cost(mut self, item: &'static str, amount: i64) -> Self {
        assert!(CostItem::from_name(item).is_some(), "unknown cost item {item}");
        self.costs.push((item, amount));
        self
    }

    pub fn dim(mut self, dimension: Dimension, value: &str) -> Self {
        let idx = Dimension::ALL.iter().position(|d| *d == dimension).unwrap();
        self.dimensions[idx] = value.to_string();
        self
    }
}

pub fn raw_table(rows: &[Row]) -> RawTable {
    let headers: Vec<String> = required_columns()
        .chain(CostItem::all().map(CostItem::name))
        .map(str::to_string)
        .collect();
    let records = rows
        .iter()
        .map(|row| {
            let mut record = vec![row.period.clone()];
            record.extend(row.dimensions.iter().cloned());
            record.push(row.revenue.to_string());
            record.extend(CostItem::all().map(|item| {
                row.costs
                    .iter()
                    .filter(|(name, _)| *name == item.name())
                    .map(|(_, amount)| amount)
                    .sum::<i64>()
                    .to_string()
            }));
            record
        })
        .collect();
    RawTable::new(headers, records)
}

pub fn ledger(rows: &[Row]) -> Ledger {
    derive_ledger(&raw_table(rows)).unwrap()
}

pub fn all(ledger: &Ledger) -> Vec<&LedgerRow> {
    ledger.rows().iter().collect()
}
