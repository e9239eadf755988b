//! Swap data repository cumulative equity slices, published daily by DTCC
//! as one ZIP per day per regulator.

use crate::filelist::Filelist;
use crate::fs::FetchJob;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

pub mod cftc;
pub mod search;
pub mod sec;

/// One regulator's slice of the repository.
pub(crate) struct DailySlice {
    /// Directory name under the data dir, e.g. `swaps/cftc`.
    pub dir: &'static str,
    /// URL prefix up to the file name.
    pub base: &'static str,
    /// File name prefix, completed with `_YYYY_MM_DD.zip`.
    pub prefix: &'static str,
}

impl DailySlice {
    pub(crate) fn file_name(&self, date: NaiveDate) -> String {
        format!(
            "{prefix}_{date}.zip",
            prefix = self.prefix,
            date = date.format("%Y_%m_%d"),
        )
    }

    pub(crate) fn url(&self, date: NaiveDate) -> String {
        format!("{base}/{name}", base = self.base, name = self.file_name(date))
    }

    pub(crate) fn local_dir(&self) -> PathBuf {
        crate::data_dir().join(self.dir)
    }
}

/// Fetch every daily file in `[from, to]` that the filelist does not already
/// record. Days the repository never published (weekends, holidays, dates
/// outside the retention window) come back 404/403 and are skipped.
pub(crate) async fn dredge_daily(
    slice: &DailySlice,
    from: NaiveDate,
    to: NaiveDate,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let http_client = crate::std_client_build();
    let filelist = Filelist::open(&crate::data_dir());
    let local_dir = slice.local_dir();
    tokio::fs::create_dir_all(&local_dir).await?;

    let jobs: Vec<FetchJob> = from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| FetchJob {
            url: slice.url(date),
            path: local_dir.join(slice.file_name(date)),
        })
        .collect();

    crate::fs::bulk_fetch(&http_client, &filelist, jobs, tui).await?;

    info!(
        "{dir} cumulative files collected, {elapsed}",
        dir = slice.dir,
        elapsed = crate::time_elapsed(time),
    );

    Ok(())
}
