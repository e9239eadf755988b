use super::DailySlice;
use chrono::NaiveDate;
use std::path::PathBuf;

/// SEC slice of the DTCC public price dissemination data; security-based
/// swaps, same daily cumulative layout as the CFTC slice.
pub(crate) const SLICE: DailySlice = DailySlice {
    dir: "swaps/sec",
    base: "https://pddata.dtcc.com/ppd/api/report/cumulative/sec",
    prefix: "SEC_CUMULATIVE_EQUITIES",
};

pub async fn dredge(from: NaiveDate, to: NaiveDate, tui: bool) -> anyhow::Result<()> {
    super::dredge_daily(&SLICE, from, to, tui).await
}

/// Keyword search across every downloaded SEC daily file.
pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search::search_slice(&SLICE, query, tui).await
}
