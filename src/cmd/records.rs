//! Flat CSV renderings of report tables, amounts in base units.

use super::display::rate_cell;
use pnlc::core::{AnalysisReport, MetricsVariance, Variance, VarianceTable};
use rust_decimal::Decimal;
use std::io::Write;

const TOTAL_LABEL: &str = "합계";

fn amount(value: Decimal) -> String {
    value.normalize().to_string()
}

fn variance_header(has_comparison: bool) -> Vec<String> {
    let mut header = Vec::new();
    for metric in ["매출액", "총비용", "영업이익"] {
        header.push(metric.to_string());
        if has_comparison {
            header.push(format!("{metric}_비교"));
            header.push(format!("{metric}_증감액"));
            header.push(format!("{metric}_증감률"));
        }
    }
    header
}

fn variance_cells(v: &MetricsVariance, has_comparison: bool) -> Vec<String> {
    let mut cells = Vec::new();
    for metric in [&v.revenue, &v.total_cost, &v.operating_profit] {
        cells.push(amount(metric.target));
        if has_comparison {
            cells.push(amount(metric.comparison));
            cells.push(amount(metric.delta));
            cells.push(rate_cell(&metric.rate));
        }
    }
    cells
}

/// One column per breakdown key, then metric columns, then a grand-total row.
pub fn write_breakdown<W: Write>(report: &AnalysisReport, writer: W) -> anyhow::Result<()> {
    let table = &report.breakdown;
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<String> = report
        .breakdown_keys
        .iter()
        .map(|d| d.column().to_string())
        .collect();
    header.extend(variance_header(table.has_comparison));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = row.key.clone();
        record.extend(variance_cells(&row.variance, table.has_comparison));
        wtr.write_record(&record)?;
    }
    if !table.is_empty() {
        let mut total = vec![TOTAL_LABEL.to_string()];
        total.resize(report.breakdown_keys.len(), String::new());
        total.extend(variance_cells(&report.breakdown_total, table.has_comparison));
        wtr.write_record(&total)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_trend<W: Write>(trend: &VarianceTable, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["기간".to_string()];
    header.extend(variance_header(trend.has_comparison));
    wtr.write_record(&header)?;
    for row in &trend.rows {
        let mut record = vec![row.label.clone()];
        record.extend(variance_cells(&row.variance, trend.has_comparison));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn cost_cells(v: &Variance) -> [String; 4] {
    [
        amount(v.target),
        amount(v.comparison),
        amount(v.delta),
        rate_cell(&v.rate),
    ]
}

/// Cost items followed by their category rollups, tagged by level.
pub fn write_costs<W: Write>(report: &AnalysisReport, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["구분", "카테고리", "비용항목", "대상기간", "비교기간", "증감액", "증감률"])?;
    for item in &report.cost_items {
        let mut record = vec![
            "항목".to_string(),
            item.category.label().to_string(),
            item.item.name().to_string(),
        ];
        record.extend(cost_cells(&item.variance));
        wtr.write_record(&record)?;
    }
    for category in &report.categories {
        let mut record = vec![
            "카테고리".to_string(),
            category.category.label().to_string(),
            String::new(),
        ];
        record.extend(cost_cells(&category.variance));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnlc::core::{analyze, derive_ledger, AnalysisRequest, PeriodSelection, RawTable};

    const CSV: &str = "년월,수익코드,캠퍼스,브랜드,사업부,매출액,셔틀\n\
                       202401,R,Gangnam,B,U,1000,100\n\
                       202401,R,Seocho,B,U,500,50\n\
                       202301,R,Gangnam,B,U,800,100\n";

    fn report(compare: bool) -> AnalysisReport {
        let ledger = derive_ledger(&RawTable::read_csv(CSV.as_bytes()).unwrap()).unwrap();
        let mut request = AnalysisRequest::new(PeriodSelection::new(["2024"], ["01"]));
        if compare {
            request = request.compare_with(PeriodSelection::new(["2023"], ["01"]));
        }
        analyze(&ledger, &request)
    }

    fn render<F>(f: F) -> Vec<String>
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn breakdown_with_total_row() {
        let report = report(true);
        let lines = render(|out| write_breakdown(&report, out));
        assert_eq!(
            lines[0],
            "캠퍼스,매출액,매출액_비교,매출액_증감액,매출액_증감률,총비용,총비용_비교,총비용_증감액,총비용_증감률,영업이익,영업이익_비교,영업이익_증감액,영업이익_증감률"
        );
        assert_eq!(lines[1], "Gangnam,1000,800,200,25,0,0,0,N/A,1000,800,200,25");
        assert_eq!(lines[2], "Seocho,500,0,500,Inf,0,0,0,N/A,500,0,500,Inf");
        assert_eq!(lines[3], "합계,1500,800,700,87.5,0,0,0,N/A,1500,800,700,87.5");
    }

    #[test]
    fn target_only_trend() {
        let report = report(false);
        let lines = render(|out| write_trend(&report.trend, out));
        assert_eq!(lines, vec!["기간,매출액,총비용,영업이익", "1,1500,0,1500"]);
    }

    #[test]
    fn costs_list_items_then_categories() {
        let report = report(true);
        let lines = render(|out| write_costs(&report, out));
        assert_eq!(lines[1], "항목,운영비,셔틀,150,100,50,50");
        assert_eq!(lines.len(), 2 + 9);
    }
}
