use super::QuarterlyDataset;
use std::path::PathBuf;

/// Form N-PORT structured data: monthly fund portfolio holdings, published
/// quarterly. FUND_REPORTED_HOLDING has one row per position (issuer,
/// CUSIP, ISIN, value).
pub(crate) const DATASET: QuarterlyDataset = QuarterlyDataset {
    dir: "edgar/nport",
    base: "https://www.sec.gov/files/dera/data/form-n-port-data-sets",
    suffix: "nport",
    member: "FUND_REPORTED_HOLDING.tsv",
    earliest: (2019, 4),
};

pub async fn dredge(tui: bool) -> anyhow::Result<()> {
    super::dredge_dataset(&DATASET, tui).await
}

pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search_dataset(&DATASET, query, tui).await
}
