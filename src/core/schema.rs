//! Column schema of the source ledger and the fixed cost item table.
//!
//! Column names are the Korean headers of the source workbook and form the contract with
//! loaders and exporters, so they are kept verbatim.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Six digit `yyyymm` period key.
pub const PERIOD_COLUMN: &str = "년월";
pub const REVENUE_COLUMN: &str = "매출액";

pub const YEAR_COLUMN: &str = "년";
pub const MONTH_COLUMN: &str = "월";
pub const QUARTER_COLUMN: &str = "분기";
pub const YEAR_QUARTER_COLUMN: &str = "년분기";
pub const TOTAL_COST_COLUMN: &str = "총비용";
pub const OPERATING_PROFIT_COLUMN: &str = "영업이익";

/// Value substituted for missing dimension cells and invalid quarters.
pub const NOT_AVAILABLE: &str = "N/A";

/// Organizational dimension columns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Dimension {
    #[serde(rename = "수익코드")]
    RevenueCode,
    #[serde(rename = "캠퍼스")]
    Campus,
    #[serde(rename = "브랜드")]
    Brand,
    #[serde(rename = "사업부")]
    BusinessUnit,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::RevenueCode,
        Dimension::Campus,
        Dimension::Brand,
        Dimension::BusinessUnit,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::RevenueCode => "수익코드",
            Dimension::Campus => "캠퍼스",
            Dimension::Brand => "브랜드",
            Dimension::BusinessUnit => "사업부",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Quarter {
    /// Maps a zero-padded month (`"01"`..`"12"`) to its quarter.
    pub fn from_month(month: &str) -> Quarter {
        match month.parse::<u32>() {
            Ok(1..=3) => Quarter::Q1,
            Ok(4..=6) => Quarter::Q2,
            Ok(7..=9) => Quarter::Q3,
            Ok(10..=12) => Quarter::Q4,
            _ => Quarter::NotAvailable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
            Quarter::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic grouping of cost items used for category-level variance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum CostCategory {
    #[serde(rename = "인건비")]
    Personnel,
    #[serde(rename = "4대보험/퇴직")]
    StatutoryRetirement,
    #[serde(rename = "인센티브")]
    Incentives,
    #[serde(rename = "임차/관리비")]
    Occupancy,
    #[serde(rename = "용역/청소")]
    Cleaning,
    #[serde(rename = "감가상각")]
    Depreciation,
    #[serde(rename = "운영비")]
    OperatingExpense,
    #[serde(rename = "마케팅")]
    Marketing,
    #[serde(rename = "기타")]
    Other,
}

impl CostCategory {
    pub const ALL: [CostCategory; 9] = [
        CostCategory::Personnel,
        CostCategory::StatutoryRetirement,
        CostCategory::Incentives,
        CostCategory::Occupancy,
        CostCategory::Cleaning,
        CostCategory::Depreciation,
        CostCategory::OperatingExpense,
        CostCategory::Marketing,
        CostCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CostCategory::Personnel => "인건비",
            CostCategory::StatutoryRetirement => "4대보험/퇴직",
            CostCategory::Incentives => "인센티브",
            CostCategory::Occupancy => "임차/관리비",
            CostCategory::Cleaning => "용역/청소",
            CostCategory::Depreciation => "감가상각",
            CostCategory::OperatingExpense => "운영비",
            CostCategory::Marketing => "마케팅",
            CostCategory::Other => "기타",
        }
    }

    /// Items of this category, in ledger column order.
    pub fn items(self) -> impl Iterator<Item = CostItem> {
        CostItem::all().filter(move |item| item.category() == self)
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

use CostCategory::*;

/// Cost columns in source order with their category.
const COST_ITEMS: [(&str, CostCategory); 48] = [
    ("관리자A", Personnel),
    ("관리자B", Personnel),
    ("관리자C", Personnel),
    ("강사A", Personnel),
    ("강사B", Personnel),
    ("강사C", Personnel),
    ("강사D", Personnel),
    ("4대보험근로자", StatutoryRetirement),
    ("4대보험강사D", StatutoryRetirement),
    ("퇴직추계", StatutoryRetirement),
    ("해지미정산", Other),
    ("인센티브직접", Incentives),
    ("인센티브간저", Incentives),
    ("경비", OperatingExpense),
    ("본사급여", Personnel),
    ("본사4대보험", StatutoryRetirement),
    ("본사퇴직추계", StatutoryRetirement),
    ("셔틀", OperatingExpense),
    ("동승자", OperatingExpense),
    ("임차A", Occupancy),
    ("임차B", Occupancy),
    ("임차C", Occupancy),
    ("임차D", Occupancy),
    ("관리비A", Occupancy),
    ("관리비B", Occupancy),
    ("관리비C", Occupancy),
    ("관리비D", Occupancy),
    ("청소용역A", Cleaning),
    ("청소용역B", Cleaning),
    ("청소용역C", Cleaning),
    ("청소용역D", Cleaning),
    ("복구충당", Depreciation),
    ("공통감가비A", Depreciation),
    ("캠퍼스감가비B", Depreciation),
    ("관별감가비B", Depreciation),
    ("공통감가비B", Depreciation),
    ("기타1", Other),
    ("제경비", Other),
    ("카드매출수수료", Other),
    ("공기청정기", OperatingExpense),
    ("정수기", OperatingExpense),
    ("캡스", OperatingExpense),
    ("복합기", OperatingExpense),
    ("LMS", OperatingExpense),
    ("관마케팅", Marketing),
    ("캠퍼스마케팅", Marketing),
    ("관기타2", Other),
    ("캠퍼스기타2", Other),
];

pub const COST_ITEM_COUNT: usize = COST_ITEMS.len();

/// One of the enumerated cost columns, addressed by its position in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CostItem(usize);

impl CostItem {
    pub fn all() -> impl Iterator<Item = CostItem> {
        (0..COST_ITEM_COUNT).map(CostItem)
    }

    pub fn from_name(name: &str) -> Option<CostItem> {
        COST_ITEMS
            .iter()
            .position(|(column, _)| *column == name)
            .map(CostItem)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn name(self) -> &'static str {
        COST_ITEMS[self.0].0
    }

    pub fn category(self) -> CostCategory {
        COST_ITEMS[self.0].1
    }
}

impl fmt::Display for CostItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CostItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl JsonSchema for CostItem {
    fn schema_name() -> String {
        "CostItem".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Columns a ledger file must carry.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    std::iter::once(PERIOD_COLUMN)
        .chain(Dimension::ALL.iter().map(|d| d.column()))
        .chain(std::iter::once(REVENUE_COLUMN))
}
