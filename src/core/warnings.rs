use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recoverable conditions raised while deriving a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Some cost columns are absent, so total cost is 0 and operating profit equals revenue.
    MissingCostColumns { columns: Vec<String> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingCostColumns { columns } => write!(
                f,
                "{} cost column(s) missing ({}); total cost treated as 0 and operating profit equals revenue",
                columns.len(),
                columns.join(", ")
            ),
        }
    }
}
