use super::QuarterlyDataset;
use std::path::PathBuf;

/// Form N-CEN structured data: annual fund census filings.
pub(crate) const DATASET: QuarterlyDataset = QuarterlyDataset {
    dir: "edgar/ncen",
    base: "https://www.sec.gov/files/dera/data/form-n-cen-data-sets",
    suffix: "ncen",
    member: "REGISTRANT.tsv",
    earliest: (2019, 3),
};

pub async fn dredge(tui: bool) -> anyhow::Result<()> {
    super::dredge_dataset(&DATASET, tui).await
}

pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search_dataset(&DATASET, query, tui).await
}
