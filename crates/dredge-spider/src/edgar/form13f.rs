use super::QuarterlyDataset;
use std::path::PathBuf;

/// Form 13F structured data: quarterly institutional holdings. The
/// INFOTABLE carries one row per holding with issuer name and CUSIP.
pub(crate) const DATASET: QuarterlyDataset = QuarterlyDataset {
    dir: "edgar/form13f",
    base: "https://www.sec.gov/files/structureddata/data/form-13f-data-sets",
    suffix: "form13f",
    member: "INFOTABLE.tsv",
    earliest: (2013, 2),
};

pub async fn dredge(tui: bool) -> anyhow::Result<()> {
    super::dredge_dataset(&DATASET, tui).await
}

/// CUSIP or issuer-name search over every downloaded quarter of 13F
/// holdings.
pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search_dataset(&DATASET, query, tui).await
}
