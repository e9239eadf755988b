//! Row-matching primitives shared by the swap, EDGAR and fails-to-deliver
//! searches.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Matching rows pulled out of one archive, plus the header of the first
/// delimited member so reports can be reindexed to a fixed width.
pub struct Scanned {
    pub header: Option<csv::StringRecord>,
    pub rows: Vec<csv::StringRecord>,
}

/// Case-insensitive substring match against every field of a record. The
/// upstream schemas drift between quarters, so matching is positional-free:
/// a CUSIP, ticker or issuer keyword hits wherever it appears.
pub fn row_matches(record: &csv::StringRecord, needle_lower: &str) -> bool {
    record
        .iter()
        .any(|field| field.to_lowercase().contains(needle_lower))
}

/// Pad or truncate a record to the declared header width, so every emitted
/// row has exactly the header's column count even when source files
/// disagree about the schema.
pub fn reindex(record: &csv::StringRecord, width: usize) -> Vec<String> {
    let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
    while row.len() < width {
        row.push(String::new());
    }
    row
}

/// Scan the delimited members of one ZIP archive for rows containing the
/// (lowercased) needle. `member_matches` selects which members to read by
/// their lowercased name.
pub fn scan_archive(
    path: &Path,
    needle_lower: &str,
    delimiter: u8,
    member_matches: impl Fn(&str) -> bool,
) -> anyhow::Result<Scanned> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut header = None;
    let mut rows = Vec::new();
    for i in 0..archive.len() {
        let member = archive.by_index(i)?;
        if !member_matches(&member.name().to_lowercase()) {
            debug!("skipping member {} in {path:?}", member.name());
            continue;
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(member);
        if header.is_none() {
            header = Some(reader.headers()?.clone());
        }
        for record in reader.records() {
            let record = record?;
            if row_matches(&record, needle_lower) {
                rows.push(record);
            }
        }
    }

    Ok(Scanned { header, rows })
}

/// Scan one delimited file on disk (an extracted dataset member).
pub fn scan_file(path: &Path, needle_lower: &str, delimiter: u8) -> anyhow::Result<Scanned> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    let header = Some(reader.headers()?.clone());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if row_matches(&record, needle_lower) {
            rows.push(record);
        }
    }
    Ok(Scanned { header, rows })
}

/// Write the collected matches as one CSV report. The first header seen
/// becomes the report header; every row is reindexed to its width. Returns
/// the number of rows written.
pub fn write_report(out_path: &Path, scanned: &[Scanned]) -> anyhow::Result<usize> {
    let header = scanned
        .iter()
        .find_map(|s| s.header.clone())
        .ok_or_else(|| anyhow::anyhow!("no readable delimited member in any archive"))?;
    let width = header.len();

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(out_path)?;
    writer.write_record(&header)?;

    let mut matches = 0usize;
    for s in scanned {
        for row in &s.rows {
            writer.write_record(reindex(row, width))?;
            matches += 1;
        }
    }
    writer.flush()?;
    Ok(matches)
}

/// Output path for a search report: `<data>/results/<stem>_<query>_<now>.csv`.
pub fn results_path(stem: &str, query: &str) -> PathBuf {
    let sanitized: String = query
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    crate::data_dir().join("results").join(format!(
        "{stem}_{sanitized}_{now}.csv",
        now = chrono::Utc::now().format("%Y%m%d_%H%M%S"),
    ))
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_and_positional_free() {
        let record = csv::StringRecord::from(vec!["12345", "GameStop Corp", "NEWT"]);
        assert!(row_matches(&record, "gamestop"));
        assert!(row_matches(&record, "newt"));
        assert!(!row_matches(&record, "tesla"));
    }

    #[test]
    fn reindex_pads_and_truncates_to_header_width() {
        let short = csv::StringRecord::from(vec!["a", "b"]);
        assert_eq!(reindex(&short, 4), vec!["a", "b", "", ""]);

        let long = csv::StringRecord::from(vec!["a", "b", "c", "d"]);
        assert_eq!(reindex(&long, 2), vec!["a", "b"]);
    }

    #[test]
    fn report_rows_all_match_the_header_width() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.csv");

        let scanned = vec![
            Scanned {
                header: Some(csv::StringRecord::from(vec!["a", "b", "c"])),
                rows: vec![
                    csv::StringRecord::from(vec!["1", "2"]),
                    csv::StringRecord::from(vec!["1", "2", "3", "4"]),
                ],
            },
            Scanned {
                header: None,
                rows: vec![csv::StringRecord::from(vec!["x", "y", "z"])],
            },
        ];

        let matches = write_report(&out, &scanned).unwrap();
        assert_eq!(matches, 3);

        let mut reader = csv::Reader::from_path(&out).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 3);
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), 3);
        }
    }

    #[test]
    fn query_is_sanitized_for_the_file_name() {
        let path = results_path("swaps_cftc", "GME / swap");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("swaps_cftc_GME___swap_"));
        assert!(name.ends_with(".csv"));
    }
}
