//! HTML report generation
//!
//! Generates a self-contained HTML file with embedded CSS: headline metric cards,
//! insights, the breakdown table with its grand total, and the trend table.

use super::display::{format_currency, format_rate, DisplayUnit};
use super::{AnalysisArgs, BucketArg, DimensionArg};
use clap::Args;
use pnlc::core::{analyze, AnalysisReport, InsightKind, MetricsVariance, Variance};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HtmlCommand {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Breakdown dimension
    #[arg(long, value_enum, default_value_t = DimensionArg::Campus)]
    by: DimensionArg,

    /// Trend bucket
    #[arg(long, value_enum, default_value_t = BucketArg::Month)]
    bucket: BucketArg,

    /// Show running totals in the trend
    #[arg(long)]
    cumulative: bool,

    /// Output file path (default: opens in browser)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl HtmlCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = self.analysis.load()?;
        let request = self
            .analysis
            .request(&ledger)
            .dimension(self.by.into())
            .bucket(self.bucket.into(), self.cumulative);
        let report = analyze(&ledger, &request);

        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let html = generate(
            &report,
            &self.analysis.describe(&request),
            &generated,
            self.analysis.unit,
        );

        if let Some(ref output_path) = self.output {
            std::fs::write(output_path, &html)?;
            println!("HTML report written to: {}", output_path.display());
        } else {
            // Write to temp file and open in browser
            let temp_path = std::env::temp_dir().join("pnlc-report.html");
            std::fs::write(&temp_path, &html)?;
            opener::open(&temp_path)?;
            println!("Opened HTML report in browser: {}", temp_path.display());
        }

        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Generate HTML report content
pub fn generate(report: &AnalysisReport, period: &str, generated: &str, unit: DisplayUnit) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<section class="cards">{}{}{}</section>"#,
        card("영업이익", &report.totals.operating_profit, report.has_comparison, unit, false),
        card("매출액", &report.totals.revenue, report.has_comparison, unit, false),
        card("총비용", &report.totals.total_cost, report.has_comparison, unit, true),
    );

    body.push_str("<h2>Insights</h2>");
    for insight in &report.insights {
        let class = match insight.kind {
            InsightKind::Positive => "positive",
            InsightKind::Negative => "negative",
            InsightKind::Neutral => "neutral",
        };
        let _ = write!(
            body,
            r#"<div class="insight {}"><strong>{}</strong><br>{}</div>"#,
            class,
            escape(&insight.title),
            escape(&insight.body)
        );
    }

    if !report.breakdown.is_empty() {
        let heading = report
            .breakdown_keys
            .iter()
            .map(|d| d.column())
            .collect::<Vec<_>>()
            .join(" / ");
        let _ = write!(body, "<h2>Breakdown by {}</h2>", escape(&heading));
        let rows = report
            .breakdown
            .rows
            .iter()
            .map(|r| (r.label.as_str(), &r.variance))
            .chain(std::iter::once(("합계", &report.breakdown_total)));
        body.push_str(&table(rows, report.has_comparison, unit));
    }

    if !report.trend.is_empty() {
        let _ = write!(
            body,
            "<h2>Trend{}</h2>",
            if report.cumulative { " (cumulative)" } else { "" }
        );
        let rows = report
            .trend
            .rows
            .iter()
            .map(|r| (r.label.as_str(), &r.variance));
        body.push_str(&table(rows, report.has_comparison, unit));
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="ko">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>P&amp;L Report</title>
    <style>
{css}
    </style>
</head>
<body>
    <header>
        <h1>P&amp;L Report</h1>
        <p><strong>Period:</strong> {period}</p>
        <p><strong>Generated:</strong> {generated}</p>
    </header>
    <main>
{body}
    </main>
</body>
</html>"##,
        css = CSS,
        period = escape(period),
        generated = escape(generated),
        body = body
    )
}

/// A metric card. For costs a decrease is shown as good news.
fn card(label: &str, v: &Variance, has_comparison: bool, unit: DisplayUnit, lower_is_better: bool) -> String {
    let delta = if has_comparison {
        let improving = if lower_is_better {
            v.delta.is_sign_negative()
        } else {
            v.delta.is_sign_positive()
        };
        let class = if v.delta.is_zero() {
            "flat"
        } else if improving {
            "up"
        } else {
            "down"
        };
        format!(
            r#"<p class="delta {}">{} ({})</p>"#,
            class,
            escape(&format_currency(v.delta, unit)),
            escape(&format_rate(&v.rate))
        )
    } else {
        String::new()
    };
    format!(
        r#"<div class="card"><h3>{}</h3><p class="value">{}</p>{}</div>"#,
        escape(label),
        escape(&format_currency(v.target, unit)),
        delta
    )
}

fn table<'a, I>(rows: I, has_comparison: bool, unit: DisplayUnit) -> String
where
    I: IntoIterator<Item = (&'a str, &'a MetricsVariance)>,
{
    let mut html = String::from("<table><thead><tr><th></th>");
    for metric in ["매출액", "총비용", "영업이익"] {
        let _ = write!(html, "<th>{}</th>", metric);
        if has_comparison {
            let _ = write!(html, "<th>{} Δ</th><th>{} Δ%</th>", metric, metric);
        }
    }
    html.push_str("</tr></thead><tbody>");
    for (label, v) in rows {
        let _ = write!(html, "<tr><td>{}</td>", escape(label));
        for metric in [&v.revenue, &v.total_cost, &v.operating_profit] {
            let _ = write!(html, "<td>{}</td>", escape(&format_currency(metric.target, unit)));
            if has_comparison {
                let _ = write!(
                    html,
                    "<td>{}</td><td>{}</td>",
                    escape(&format_currency(metric.delta, unit)),
                    escape(&format_rate(&metric.rate))
                );
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

const CSS: &str = r#"
:root {
    --primary: #2563eb;
    --success: #16a34a;
    --danger: #dc2626;
    --gray-50: #f9fafb;
    --gray-200: #e5e7eb;
    --gray-500: #6b7280;
    --gray-900: #111827;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Noto Sans KR', Arial, sans-serif;
    background: var(--gray-50);
    color: var(--gray-900);
    line-height: 1.5;
}

header {
    background: white;
    border-bottom: 1px solid var(--gray-200);
    padding: 1.5rem 2rem;
}

header h1 {
    font-size: 1.5rem;
    font-weight: 600;
    margin-bottom: 0.5rem;
}

main {
    padding: 1.5rem 2rem;
}

h2 {
    font-size: 1.125rem;
    margin: 1.5rem 0 0.75rem;
}

.cards {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
    gap: 1rem;
}

.card {
    background: white;
    border: 1px solid var(--gray-200);
    border-radius: 0.5rem;
    padding: 1rem 1.25rem;
}

.card h3 {
    font-size: 0.75rem;
    font-weight: 500;
    color: var(--gray-500);
    text-transform: uppercase;
}

.card .value {
    font-size: 1.5rem;
    font-weight: 700;
}

.delta.up { color: var(--success); }
.delta.down { color: var(--danger); }
.delta.flat { color: var(--gray-500); }

.insight {
    background: #f0f9ff;
    border-left: 4px solid var(--primary);
    border-radius: 0.375rem;
    padding: 0.75rem 1rem;
    margin: 0.5rem 0;
}

.insight.positive { border-left-color: var(--success); background: #ecfdf5; }
.insight.negative { border-left-color: var(--danger); background: #fef2f2; }

table {
    width: 100%;
    border-collapse: collapse;
    background: white;
    font-size: 0.875rem;
}

th {
    background: var(--primary);
    color: white;
    padding: 0.5rem 0.75rem;
    text-align: right;
    font-weight: 600;
}

td {
    padding: 0.5rem 0.75rem;
    border-bottom: 1px solid var(--gray-200);
    text-align: right;
}

td:first-child, th:first-child {
    text-align: left;
}

tbody tr:last-child td {
    font-weight: 600;
}
"#;
