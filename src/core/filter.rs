//! Period and dimension selection over the ledger.

use super::ledger::LedgerRow;
use super::schema::Dimension;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Membership constraints per dimension. A dimension without values is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionFilters {
    selected: BTreeMap<Dimension, BTreeSet<String>>,
}

impl DimensionFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(dimension, values);
        self
    }

    pub fn set<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.selected.remove(&dimension);
        } else {
            self.selected.insert(dimension, values);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn matches(&self, row: &LedgerRow) -> bool {
        self.selected
            .iter()
            .all(|(dimension, values)| values.contains(row.dimension(*dimension)))
    }
}

/// Normalize a month given as `4` or `04` to the two digit form used by the ledger.
pub fn normalize_month(month: &str) -> String {
    let month = month.trim();
    match month.parse::<u32>() {
        Ok(m) if month.len() <= 2 => format!("{:02}", m),
        _ => month.to_string(),
    }
}

/// Rows whose year and month are both selected. Nothing selected means no rows.
pub fn select_exact<'a>(
    rows: &'a [LedgerRow],
    years: &[String],
    months: &[String],
    filters: &DimensionFilters,
) -> Vec<&'a LedgerRow> {
    let selected: Vec<&LedgerRow> = rows
        .iter()
        .filter(|r| years.contains(&r.year) && months.contains(&r.month) && filters.matches(r))
        .collect();
    log::debug!(
        "Exact selection years={:?} months={:?}: {} rows",
        years,
        months,
        selected.len()
    );
    selected
}

/// Rows of the selected years from January through `max_month`, for continuous trends.
pub fn select_range_to_date<'a>(
    rows: &'a [LedgerRow],
    years: &[String],
    max_month: &str,
    filters: &DimensionFilters,
) -> Vec<&'a LedgerRow> {
    let selected: Vec<&LedgerRow> = rows
        .iter()
        .filter(|r| {
            years.contains(&r.year) && r.month.as_str() <= max_month && filters.matches(r)
        })
        .collect();
    log::debug!(
        "Range-to-date selection years={:?} through {}: {} rows",
        years,
        max_month,
        selected.len()
    );
    selected
}

/// A set of years and months chosen for one side of an analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PeriodSelection {
    pub years: Vec<String>,
    pub months: Vec<String>,
}

impl PeriodSelection {
    pub fn new<Y, M>(years: Y, months: M) -> Self
    where
        Y: IntoIterator,
        Y::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        PeriodSelection {
            years: years.into_iter().map(|y| y.as_ref().trim().to_string()).collect(),
            months: months
                .into_iter()
                .map(|m| normalize_month(m.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.months.is_empty()
    }

    pub fn max_month(&self) -> Option<&str> {
        self.months.iter().map(String::as_str).max()
    }

    pub fn exact<'a>(&self, rows: &'a [LedgerRow], filters: &DimensionFilters) -> Vec<&'a LedgerRow> {
        select_exact(rows, &self.years, &self.months, filters)
    }

    /// Range-to-date rows through the latest selected month; empty when nothing is selected.
    pub fn range_to_date<'a>(
        &self,
        rows: &'a [LedgerRow],
        filters: &DimensionFilters,
    ) -> Vec<&'a LedgerRow> {
        match self.max_month() {
            Some(max) if !self.years.is_empty() => {
                select_range_to_date(rows, &self.years, max, filters)
            }
            _ => Vec::new(),
        }
    }

    /// Months without leading zeros, as shown to users.
    pub fn display_months(&self) -> Vec<String> {
        self.months
            .iter()
            .map(|m| m.trim_start_matches('0').to_string())
            .collect()
    }
}
