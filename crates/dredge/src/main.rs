mod cli;
mod dredge;

// remote imports
use chrono::{Duration, Utc};
use clap::Parser;
use cli::{Cli, TraceLevel};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preprocess the trace level, and open the .env file
fn preprocess(trace_level: Level) {
    dotenv::dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        });
    } else {
        dotenv::dotenv().ok();
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `dredge dredge <Option<Vec<Archive>>>`: download archives
        Dredge { archives, from, to } => {
            let archives = archives.unwrap_or_else(cli::Archive::all);
            let to = to.unwrap_or_else(|| Utc::now().date_naive());
            let from = from.unwrap_or(to - Duration::days(30));
            if from > to {
                anyhow::bail!("--from {from} is after --to {to}");
            }
            dredge::run(archives, from, to, tui).await?;
        }

        // `dredge search <QUERY>`: scan the downloaded archives
        Search {
            query,
            archives,
            ticker,
        } => {
            let archives = archives.unwrap_or_else(cli::Archive::all);
            dredge::search(&query, archives, ticker, tui).await?;
        }

        // `dredge analyze`: swap-chain reconciliation
        Analyze { file } => {
            dredge_spider::analyze::run(file, tui).await?;
        }
    }

    Ok(())
}
