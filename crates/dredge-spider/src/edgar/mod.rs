//! SEC structured data sets (quarterly ZIPs of TSV tables published by
//! DERA), the fails-to-deliver half-month files, and the company ticker
//! directory.

use crate::filelist::Filelist;
use chrono::Datelike;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod form13f;
pub mod formd;
pub mod ftd;
pub mod ncen;
pub mod nmfp;
pub mod nport;
pub mod tickers;

/// One quarterly structured data set. Each filing type publishes the same
/// shape: `<base>/<year>q<quarter>_<suffix>.zip`, a ZIP of TSV tables, of
/// which one table is the interesting one for keyword/CUSIP searches.
pub(crate) struct QuarterlyDataset {
    /// Directory name under the data dir, e.g. `edgar/form13f`.
    pub dir: &'static str,
    pub base: &'static str,
    pub suffix: &'static str,
    /// TSV member the search targets (lowercased comparison).
    pub member: &'static str,
    /// First quarter the SEC published this data set for.
    pub earliest: (i32, u32),
}

impl QuarterlyDataset {
    pub(crate) fn url(&self, year: i32, quarter: u32) -> String {
        format!(
            "{base}/{year}q{quarter}_{suffix}.zip",
            base = self.base,
            suffix = self.suffix,
        )
    }

    pub(crate) fn local_dir(&self) -> PathBuf {
        crate::data_dir().join(self.dir)
    }

    /// Every quarter from the data set's first publication up to and
    /// including the current one (which usually 404s until released).
    pub(crate) fn quarters(&self) -> Vec<(i32, u32)> {
        let today = chrono::Utc::now().date_naive();
        let current = (today.year(), (today.month0() / 3) + 1);

        let mut quarters = Vec::new();
        let (mut year, mut quarter) = self.earliest;
        while (year, quarter) <= current {
            quarters.push((year, quarter));
            quarter += 1;
            if quarter > 4 {
                quarter = 1;
                year += 1;
            }
        }
        quarters
    }
}

/// Download and extract every quarter of a data set not already recorded in
/// the filelist. Quarters are fetched sequentially; the files are large and
/// [`crate::fs::download_file`] already parallelises each one internally.
/// The ZIP is deleted after extraction, the filelist records the extracted
/// directory.
pub(crate) async fn dredge_dataset(ds: &QuarterlyDataset, tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let http_client = crate::std_client_build();
    let filelist = Filelist::open(&crate::data_dir());
    let local_dir = ds.local_dir();
    tokio::fs::create_dir_all(&local_dir).await?;

    for (year, quarter) in ds.quarters() {
        let url = ds.url(year, quarter);
        if filelist.is_complete(&url) {
            debug!("{url} already extracted, skipping");
            continue;
        }

        let zip_path = local_dir.join(format!("{year}q{quarter}.zip"));
        let zip_path = zip_path.to_string_lossy().to_string();
        let extract_dir = local_dir.join(format!("{year}q{quarter}"));
        let extract_dir = extract_dir.to_string_lossy().to_string();

        if tui {
            println!(
                "{bar}\n{name:^40}\n{bar}",
                bar = "=".repeat(40),
                name = format!("{suffix} {year}q{quarter}", suffix = ds.suffix),
            );
        }

        let size = match crate::fs::download_file(&http_client, &url, &zip_path, tui).await {
            Ok(size) => size,
            Err(err) => {
                // current quarter not published yet, or a gap in the series
                warn!("no data set at {url}, skipping, error({err})");
                continue;
            }
        };

        crate::fs::unzip(&zip_path, &extract_dir, tui).await?;
        filelist.record(&url, &extract_dir, size)?;
        tokio::fs::remove_file(&zip_path).await?;
    }

    info!(
        "{dir} data sets collected, {elapsed}",
        dir = ds.dir,
        elapsed = crate::time_elapsed(time),
    );

    Ok(())
}

/// Search the target table of every extracted quarter for `query`,
/// collecting matches into one CSV report.
pub(crate) async fn search_dataset(
    ds: &QuarterlyDataset,
    query: &str,
    tui: bool,
) -> anyhow::Result<PathBuf> {
    let time = std::time::Instant::now();
    let local_dir = ds.local_dir();

    let mut quarters: Vec<PathBuf> = std::fs::read_dir(&local_dir)
        .map_err(|err| {
            anyhow::anyhow!("no extracted data sets under {local_dir:?} (run dredge first): {err}")
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    quarters.sort();
    if quarters.is_empty() {
        anyhow::bail!("no extracted data sets under {local_dir:?}, run dredge first");
    }

    let pb = if tui {
        let pb = ProgressBar::new(quarters.len() as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} quarters",
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
    let scanned: Vec<crate::scan::Scanned> = quarters
        .par_iter()
        .map(|qdir| {
            let result = find_member(qdir, ds.member).and_then(|member| {
                member
                    .map(|path| crate::scan::scan_file(&path, &needle, b'\t'))
                    .transpose()
            });
            pb.inc(1);
            match result {
                Ok(Some(found)) => found,
                Ok(None) => {
                    warn!("no {member} under {qdir:?}", member = ds.member);
                    crate::scan::Scanned {
                        header: None,
                        rows: Vec::new(),
                    }
                }
                Err(err) => {
                    warn!("failed to scan {qdir:?}, error({err})");
                    crate::scan::Scanned {
                        header: None,
                        rows: Vec::new(),
                    }
                }
            }
        })
        .collect();
    pb.finish_and_clear();

    let out_path = crate::scan::results_path(&ds.dir.replace('/', "_"), query);
    let matches = crate::scan::write_report(&out_path, &scanned)?;

    info!(
        "searched {n} quarters for \"{query}\", {matches} matches, {elapsed}",
        n = quarters.len(),
        elapsed = crate::time_elapsed(time),
    );

    Ok(out_path)
}

/// Locate the target table inside an extracted quarter; the member name is
/// matched case-insensitively because DERA has shipped both spellings.
fn find_member(qdir: &std::path::Path, member: &str) -> anyhow::Result<Option<PathBuf>> {
    let wanted = member.to_lowercase();
    for entry in std::fs::read_dir(qdir)? {
        let path = entry?.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.to_lowercase() == wanted {
                return Ok(Some(path));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DS: QuarterlyDataset = QuarterlyDataset {
        dir: "edgar/test",
        base: "https://www.sec.gov/files/structureddata/data/test-data-sets",
        suffix: "test",
        member: "TABLE.tsv",
        earliest: (2019, 4),
    };

    #[test]
    fn quarter_urls_follow_the_dera_pattern() {
        assert_eq!(
            DS.url(2024, 1),
            "https://www.sec.gov/files/structureddata/data/test-data-sets/2024q1_test.zip"
        );
    }

    #[test]
    fn quarters_run_from_earliest_to_now() {
        let quarters = DS.quarters();
        assert_eq!(quarters.first(), Some(&(2019, 4)));
        assert_eq!(quarters[1], (2020, 1));
        // the current quarter is included so new releases get picked up
        let today = chrono::Utc::now().date_naive();
        assert_eq!(
            quarters.last(),
            Some(&(today.year(), (today.month0() / 3) + 1))
        );
        assert!(quarters.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn member_lookup_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("table.TSV"), "A\tB\n1\t2\n").unwrap();
        let found = find_member(dir.path(), "TABLE.tsv").unwrap();
        assert!(found.is_some());
    }
}
