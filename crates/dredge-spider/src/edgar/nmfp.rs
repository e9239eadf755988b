use super::QuarterlyDataset;
use std::path::PathBuf;

/// Form N-MFP structured data: monthly money market fund holdings. Every
/// DERA set ships a SUBMISSION table, which is the stable search target
/// across the N-MFP/N-MFP2/N-MFP3 revisions.
pub(crate) const DATASET: QuarterlyDataset = QuarterlyDataset {
    dir: "edgar/nmfp",
    base: "https://www.sec.gov/files/dera/data/form-n-mfp-data-sets",
    suffix: "nmfp",
    member: "SUBMISSION.tsv",
    earliest: (2010, 4),
};

pub async fn dredge(tui: bool) -> anyhow::Result<()> {
    super::dredge_dataset(&DATASET, tui).await
}

pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search_dataset(&DATASET, query, tui).await
}
