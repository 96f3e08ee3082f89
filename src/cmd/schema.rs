//! Schema command - print the expected ledger format and the report schema

use clap::Args;
use pnlc::core::{required_columns, AnalysisReport, CostCategory, CostItem, MAX_AMOUNT};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "csv-fields")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema of the exported analysis report
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(AnalysisReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        let columns: Vec<&str> = required_columns()
            .chain(CostItem::all().map(CostItem::name))
            .collect();
        println!("{}", columns.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("Ledger CSV Format");
        println!("=================");
        println!();
        for (name, description) in REQUIRED_FIELD_DESCRIPTIONS {
            println!("{:20} ({:8})  {}", name, "required", description);
        }
        for category in CostCategory::ALL {
            for item in category.items() {
                println!(
                    "{:20} ({:8})  Cost amount, category {}",
                    item.name(),
                    "optional",
                    category
                );
            }
        }
        println!();
        println!(
            "Amounts are in 원. Thousands separators are accepted; unparseable cells and amounts beyond ±{} count as 0.",
            MAX_AMOUNT
        );
        println!("If any cost column is missing, 총비용 is 0 and 영업이익 equals 매출액.");
        Ok(())
    }
}

const REQUIRED_FIELD_DESCRIPTIONS: &[(&str, &str)] = &[
    ("년월", "Period as yyyymm (e.g. 202404); a trailing .0 is accepted"),
    ("수익코드", "Revenue code; empty cells become N/A"),
    ("캠퍼스", "Campus; empty cells become N/A"),
    ("브랜드", "Brand; empty cells become N/A"),
    ("사업부", "Business unit; empty cells become N/A"),
    ("매출액", "Revenue amount"),
];
