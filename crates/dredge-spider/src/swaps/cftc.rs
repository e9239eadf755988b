use super::DailySlice;
use chrono::NaiveDate;
use std::path::PathBuf;

/// CFTC slice of the DTCC public price dissemination data, one cumulative
/// equities ZIP per day.
pub(crate) const SLICE: DailySlice = DailySlice {
    dir: "swaps/cftc",
    base: "https://pddata.dtcc.com/ppd/api/report/cumulative/cftc",
    prefix: "CFTC_CUMULATIVE_EQUITIES",
};

pub async fn dredge(from: NaiveDate, to: NaiveDate, tui: bool) -> anyhow::Result<()> {
    super::dredge_daily(&SLICE, from, to, tui).await
}

/// Keyword search across every downloaded CFTC daily file.
pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search::search_slice(&SLICE, query, tui).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            SLICE.url(date),
            "https://pddata.dtcc.com/ppd/api/report/cumulative/cftc/CFTC_CUMULATIVE_EQUITIES_2024_03_07.zip"
        );
    }
}
