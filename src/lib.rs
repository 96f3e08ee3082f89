//! Profit and loss analysis for multi-campus education ledgers.
//!
//! [`core`] loads a cost-center-month ledger, selects periods and organizational slices,
//! aggregates them into totals, breakdowns and trends, compares two periods and derives
//! rule-based insights.

pub mod core;
