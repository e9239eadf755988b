use super::DailySlice;
use crate::scan;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Scan every downloaded daily ZIP of a slice for rows containing `query`
/// (case-insensitive, any column) and collect the matches into one CSV under
/// `<data>/results/`.
///
/// The daily files carry their own header; the first file's header becomes
/// the report header and every match is reindexed to its width, so schema
/// drift between days cannot produce ragged output.
pub(crate) async fn search_slice(
    slice: &DailySlice,
    query: &str,
    tui: bool,
) -> anyhow::Result<PathBuf> {
    let time = std::time::Instant::now();
    let dir = slice.local_dir();

    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|err| {
            anyhow::anyhow!("no downloaded files under {dir:?} (run dredge first): {err}")
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "zip"))
        .collect();
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no downloaded files under {dir:?}, run dredge first");
    }

    let pb = if tui {
        let pb = ProgressBar::new(files.len() as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} files",
                )?
                .progress_chars("##-"),
        );
        pb.set_message(format!("searching for \"{query}\" ..."));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    let needle = query.to_lowercase();

    // each day's archive is independent; scan them across the rayon pool
    let scanned: Vec<scan::Scanned> = files
        .par_iter()
        .map(|path| {
            let result = scan::scan_archive(path, &needle, b',', |name| name.ends_with(".csv"));
            pb.inc(1);
            match result {
                Ok(found) => found,
                Err(err) => {
                    warn!("failed to scan {path:?}, error({err})");
                    scan::Scanned {
                        header: None,
                        rows: Vec::new(),
                    }
                }
            }
        })
        .collect();
    pb.finish_and_clear();

    let out_path = scan::results_path(&slice.dir.replace('/', "_"), query);
    let matches = scan::write_report(&out_path, &scanned)?;

    info!(
        "searched {n} files for \"{query}\", {matches} matches, {elapsed}",
        n = files.len(),
        elapsed = crate::time_elapsed(time),
    );

    Ok(out_path)
}
