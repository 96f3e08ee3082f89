use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "pnlc", version, about = "Profit and loss analysis for multi-campus education ledgers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Period totals, deltas against a comparison period and insights
    Summary(cmd::summary::SummaryCommand),
    /// Totals per revenue code, business unit, brand or campus
    Breakdown(cmd::breakdown::BreakdownCommand),
    /// Monthly or quarterly trend
    Trend(cmd::trend::TrendCommand),
    /// Cost item and category variance
    Costs(cmd::costs::CostsCommand),
    /// Dimension by month matrix of one metric
    Heatmap(cmd::heatmap::HeatmapCommand),
    /// Rule-based insights
    Insights(cmd::insights::InsightsCommand),
    /// Years, months and dimension values present in a ledger
    Options(cmd::options::OptionsCommand),
    /// Print the derived ledger as CSV
    Ledger(cmd::ledger::LedgerCommand),
    /// Write breakdown, trend, cost and JSON report files
    Export(cmd::export::ExportCommand),
    /// Generate an HTML report
    Html(cmd::html_report::HtmlCommand),
    /// Print the expected ledger format or the report JSON schema
    Schema(cmd::schema::SchemaCommand),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Summary(c) => c.exec(),
        Command::Breakdown(c) => c.exec(),
        Command::Trend(c) => c.exec(),
        Command::Costs(c) => c.exec(),
        Command::Heatmap(c) => c.exec(),
        Command::Insights(c) => c.exec(),
        Command::Options(c) => c.exec(),
        Command::Ledger(c) => c.exec(),
        Command::Export(c) => c.exec(),
        Command::Html(c) => c.exec(),
        Command::Schema(c) => c.exec(),
    }
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
