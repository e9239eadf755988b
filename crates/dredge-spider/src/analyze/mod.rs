//! Swap-chain reconciliation over a produced search report: trace
//! amendment/termination chains to their roots and report the positions
//! never fully terminated, plus daily volume aggregates.

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod chains;
pub mod volume;

pub use chains::{OpenChain, SchemaError, SwapSet};
pub use volume::VolumeReport;

/// Load a swap CSV and emit the open-chain and daily-volume reports next to
/// the other results. Without an explicit `file`, the user picks one out of
/// the data dir interactively.
pub async fn run(file: Option<PathBuf>, tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let path = match file {
        Some(path) => path,
        None => pick_csv(&crate::data_dir())?,
    };
    info!("loading {path:?}");

    let set = SwapSet::load(&path)?;
    let total_chains = set.chains().len();
    let open = set.open_chains();
    let report = volume::daily_newt_volume(&set);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("swaps")
        .to_string();
    let results_dir = crate::data_dir().join("results");
    let open_path = write_open_report(&results_dir, &stem, &open)?;
    let volume_path = write_volume_report(&results_dir, &stem, &report)?;

    if tui {
        println!(
            "\n{total} unique position chains, {open} open",
            total = total_chains,
            open = open.len().to_string().green().bold(),
        );
        for chain in &open {
            println!("{}", "-".repeat(50));
            println!("Root ID: {}", chain.root_id);
            println!("Last Dissemination ID: {}", chain.last_id);
            println!("Last Action: {}", chain.last_action);
            println!("Event Timestamp: {}", chain.event_ts);
            println!("Execution Timestamp: {}", chain.exec_ts);
            println!("Expiration Date: {}", chain.expiration);
            println!("Swap Type: {}", chain.product);
            for (currency, amount) in &chain.notional {
                println!("Notional_{currency}: {amount}");
            }
            for (currency, amount) in &chain.quantity {
                println!("Quantity_{currency}: {amount}");
            }
        }
        if report.invalid_timestamps > 0 {
            println!(
                "{}",
                format!(
                    "{n} rows had unparseable execution timestamps",
                    n = report.invalid_timestamps
                )
                .yellow(),
            );
        }
        println!("open chains saved to {}", open_path.display().to_string().cyan());
        println!("daily volume saved to {}", volume_path.display().to_string().cyan());
    }

    info!(
        "analyzed {total_chains} chains ({open} open), {elapsed}",
        open = open.len(),
        elapsed = crate::time_elapsed(time),
    );

    Ok(())
}

/// Two-step picker matching the old workflow: choose a subdirectory of the
/// data dir, then a CSV inside it.
fn pick_csv(data_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut subdirs: Vec<PathBuf> = walk_dirs(data_dir)?;
    subdirs.sort();
    if subdirs.is_empty() {
        anyhow::bail!("no subdirectories under {data_dir:?}, nothing to analyze");
    }

    let labels: Vec<String> = subdirs
        .iter()
        .map(|d| d.strip_prefix(data_dir).unwrap_or(d).display().to_string())
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a subdirectory")
        .items(&labels)
        .default(0)
        .interact()?;
    let subdir = &subdirs[choice];

    let mut files: Vec<PathBuf> = std::fs::read_dir(subdir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no CSV files under {subdir:?}");
    }

    let labels: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap_or_default().to_string_lossy().to_string())
        .collect();
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a CSV file")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(files[choice].clone())
}

fn walk_dirs(data_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut pending = vec![data_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path.clone());
                dirs.push(path);
            }
        }
    }
    Ok(dirs)
}

/// `open_<stem>.csv`: one row per open chain, notional/quantity fanned out
/// over the sorted union of currencies.
fn write_open_report(
    results_dir: &Path,
    stem: &str,
    open: &[OpenChain],
) -> anyhow::Result<PathBuf> {
    let out_path = results_dir.join(format!("open_{stem}.csv"));
    std::fs::create_dir_all(results_dir)?;

    let currencies: BTreeSet<&String> = open
        .iter()
        .flat_map(|chain| chain.notional.keys().chain(chain.quantity.keys()))
        .collect();

    let mut writer = csv::Writer::from_path(&out_path)?;
    let mut header = vec![
        "Root ID".to_string(),
        "Last Dissemination ID".to_string(),
        "Last Action".to_string(),
        "Event Timestamp".to_string(),
        "Execution Timestamp".to_string(),
        "Expiration Date".to_string(),
        "Swap Type".to_string(),
    ];
    header.extend(currencies.iter().map(|c| format!("Notional_{c}")));
    header.extend(currencies.iter().map(|c| format!("Quantity_{c}")));
    writer.write_record(&header)?;

    for chain in open {
        let mut row = vec![
            chain.root_id.clone(),
            chain.last_id.clone(),
            chain.last_action.clone(),
            chain.event_ts.clone(),
            chain.exec_ts.clone(),
            chain.expiration.clone(),
            chain.product.clone(),
        ];
        for currency in &currencies {
            row.push(
                chain
                    .notional
                    .get(*currency)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        for currency in &currencies {
            row.push(
                chain
                    .quantity
                    .get(*currency)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(out_path)
}

/// `volume_<stem>.csv`: per execution date, NEWT counts and per-currency
/// notional/quantity.
fn write_volume_report(
    results_dir: &Path,
    stem: &str,
    report: &VolumeReport,
) -> anyhow::Result<PathBuf> {
    let out_path = results_dir.join(format!("volume_{stem}.csv"));
    std::fs::create_dir_all(results_dir)?;

    let currencies = report.currencies();

    let mut writer = csv::Writer::from_path(&out_path)?;
    let mut header = vec![
        "Date".to_string(),
        "Count".to_string(),
        "CFD Count".to_string(),
        "Non-CFD Count".to_string(),
    ];
    header.extend(currencies.iter().map(|c| format!("Notional_{c}")));
    header.extend(currencies.iter().map(|c| format!("Quantity_{c}")));
    writer.write_record(&header)?;

    for (date, day) in &report.days {
        let mut row = vec![
            date.to_string(),
            day.count.to_string(),
            day.cfd_count.to_string(),
            day.non_cfd_count.to_string(),
        ];
        for currency in &currencies {
            row.push(
                day.notional
                    .get(currency)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        for currency in &currencies {
            row.push(
                day.quantity
                    .get(currency)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(out_path)
}
