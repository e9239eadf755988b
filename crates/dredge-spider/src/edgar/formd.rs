use super::QuarterlyDataset;
use std::path::PathBuf;

/// Form D structured data: exempt offering notices. ISSUERS has one row
/// per issuing entity (name, jurisdiction, CIK).
pub(crate) const DATASET: QuarterlyDataset = QuarterlyDataset {
    dir: "edgar/formd",
    base: "https://www.sec.gov/files/dera/data/form-d-data-sets",
    suffix: "d",
    member: "ISSUERS.tsv",
    earliest: (2008, 1),
};

pub async fn dredge(tui: bool) -> anyhow::Result<()> {
    super::dredge_dataset(&DATASET, tui).await
}

pub async fn search(query: &str, tui: bool) -> anyhow::Result<PathBuf> {
    super::search_dataset(&DATASET, query, tui).await
}
