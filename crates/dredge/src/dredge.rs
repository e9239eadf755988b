use crate::cli::Archive;
use chrono::NaiveDate;
use colored::Colorize;
use dredge_spider as spider;
use tracing::{error, info};

/// Run the download pass for the selected archives. `from`/`to` only bind
/// the daily and half-month feeds; the quarterly data sets always run from
/// their first published quarter with the filelist skipping what is already
/// on disk.
pub(crate) async fn run(
    archives: Vec<Archive>,
    from: NaiveDate,
    to: NaiveDate,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    for archive in archives {
        match archive {
            Archive::CftcSwaps => spider::swaps::cftc::dredge(from, to, tui).await?,
            Archive::SecSwaps => spider::swaps::sec::dredge(from, to, tui).await?,
            Archive::Form13f => spider::edgar::form13f::dredge(tui).await?,
            Archive::Nport => spider::edgar::nport::dredge(tui).await?,
            Archive::Ncen => spider::edgar::ncen::dredge(tui).await?,
            Archive::Nmfp => spider::edgar::nmfp::dredge(tui).await?,
            Archive::FormD => spider::edgar::formd::dredge(tui).await?,
            Archive::Ftd => spider::edgar::ftd::dredge(from, to, tui).await?,
        }
    }

    info!(
        "dredge finished collecting archives, time elapsed: {:?}",
        time.elapsed()
    );
    if tui {
        println!("{}", "dredge finished".green().bold());
    }

    Ok(())
}

/// Search the selected archives; a failure on one archive (usually nothing
/// downloaded for it yet) is reported and the rest still run.
pub(crate) async fn search(
    query: &str,
    archives: Vec<Archive>,
    ticker: bool,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    let query = if ticker {
        match spider::edgar::tickers::resolve(query).await? {
            Some(entry) => {
                info!(
                    "resolved ticker {symbol} to \"{title}\" (CIK {cik})",
                    symbol = entry.ticker,
                    title = entry.title,
                    cik = entry.cik,
                );
                if tui {
                    println!(
                        "searching for {} ({})",
                        entry.title.bold(),
                        entry.ticker.cyan()
                    );
                }
                entry.title
            }
            None => anyhow::bail!("ticker {query} not found in the SEC company directory"),
        }
    } else {
        query.to_string()
    };

    for archive in archives {
        let result = match archive {
            Archive::CftcSwaps => spider::swaps::cftc::search(&query, tui).await,
            Archive::SecSwaps => spider::swaps::sec::search(&query, tui).await,
            Archive::Form13f => spider::edgar::form13f::search(&query, tui).await,
            Archive::Nport => spider::edgar::nport::search(&query, tui).await,
            Archive::Ncen => spider::edgar::ncen::search(&query, tui).await,
            Archive::Nmfp => spider::edgar::nmfp::search(&query, tui).await,
            Archive::FormD => spider::edgar::formd::search(&query, tui).await,
            Archive::Ftd => spider::edgar::ftd::search(&query, tui).await,
        };

        match result {
            Ok(path) => {
                if tui {
                    println!(
                        "{name}: {path}",
                        name = archive.name(),
                        path = path.display().to_string().cyan(),
                    );
                }
            }
            Err(err) => error!(
                "search of {name} failed, error({err})",
                name = archive.name()
            ),
        }
    }

    info!(
        "search finished, time elapsed: {:?}",
        time.elapsed()
    );

    Ok(())
}
