use crate::filelist::Filelist;
use crate::fs::FetchJob;
use crate::scan;
use chrono::{Datelike, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

// Fails-to-deliver files: one ZIP per half-month, a single pipe-delimited
// text member (settlement date | CUSIP | symbol | fails quantity |
// description | price). The half-month split started 2009; earlier monthly
// files are out of range.

const BASE: &str = "https://www.sec.gov/files/data/fails-deliver-data";

const DIR: &str = "edgar/ftd";

fn file_name(year: i32, month: u32, half: char) -> String {
    format!("cnsfails{year}{month:02}{half}.zip")
}

fn url(year: i32, month: u32, half: char) -> String {
    format!("{BASE}/{name}", name = file_name(year, month, half))
}

/// Every half-month file in `[from, to]`, keyed by the month.
fn jobs(from: NaiveDate, to: NaiveDate, local_dir: &std::path::Path) -> Vec<FetchJob> {
    let mut jobs = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());
    while (year, month) <= (to.year(), to.month()) {
        for half in ['a', 'b'] {
            jobs.push(FetchJob {
                url: url(year, month, half),
                path: local_dir.join(file_name(year, month, half)),
            });
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    jobs
}

/// Fetch the fails-to-deliver files covering `[from, to]`; halves not yet
/// published 404 and are skipped.
pub async fn dredge(from: NaiveDate, to: NaiveDate, tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let http_client = crate::std_client_build();
    let filelist = Filelist::open(&crate::data_dir());
    let local_dir = crate::data_dir().join(DIR);
    tokio::fs::create_dir_all(&local_dir).await?;

    crate::fs::bulk_fetch(&http_client, &filelist, jobs(from, to, &local_dir), tui).await?;

    info!(
        "fails-to-deliver files collected, {elapsed}",
        elapsed = crate::time_elapsed(time),
    );

    Ok(())
}

/// CUSIP/symbol search across every downloaded fails-to-deliver file.
pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    let time = std::time::Instant::now();
    let dir = crate::data_dir().join(DIR);

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
    let scanned: Vec<scan::Scanned> = files
        .par_iter()
        .map(|path| {
            let result = scan::scan_archive(path, &needle, b'|', |name| name.ends_with(".txt"));
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

    let out_path = scan::results_path("edgar_ftd", query);
    let matches = scan::write_report(&out_path, &scanned)?;

    info!(
        "searched {n} files for \"{query}\", {matches} matches, {elapsed}",
        n = files.len(),
        elapsed = crate::time_elapsed(time),
    );

    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_month_urls_zero_pad_the_month() {
        assert_eq!(
            url(2024, 3, 'a'),
            "https://www.sec.gov/files/data/fails-deliver-data/cnsfails202403a.zip"
        );
    }

    #[test]
    fn jobs_cover_both_halves_of_every_month_in_range() {
        let from = NaiveDate::from_ymd_opt(2023, 11, 15).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let jobs = jobs(from, to, std::path::Path::new("/tmp"));
        let urls: Vec<&str> = jobs.iter().map(|j| j.url.as_str()).collect();
        assert_eq!(jobs.len(), 6); // nov a/b, dec a/b, jan a/b
        assert!(urls.contains(&"https://www.sec.gov/files/data/fails-deliver-data/cnsfails202311a.zip"));
        assert!(urls.contains(&"https://www.sec.gov/files/data/fails-deliver-data/cnsfails202401b.zip"));
    }
}
