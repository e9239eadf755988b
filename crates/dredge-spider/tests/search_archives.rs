use dredge_spider::scan;
use std::io::Write;
use std::path::Path;

fn write_zip(path: &Path, member: &str, body: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file(member, options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap();
}

#[test]
fn archives_scan_into_a_fixed_width_report() {
    let dir = tempfile::tempdir().unwrap();

    // two daily files with drifting schemas: day two grew a column
    let day1 = dir.path().join("SEC_CUMULATIVE_EQUITIES_2024_01_05.zip");
    write_zip(
        &day1,
        "SEC_CUMULATIVE_EQUITIES_2024_01_05.csv",
        "Dissemination Identifier,Product name,Action type\n\
         1001,Equity:Swap:GameStop,NEWT\n\
         1002,Equity:Swap:Tesla,NEWT\n",
    );
    let day2 = dir.path().join("SEC_CUMULATIVE_EQUITIES_2024_01_08.zip");
    write_zip(
        &day2,
        "SEC_CUMULATIVE_EQUITIES_2024_01_08.csv",
        "Dissemination Identifier,Product name,Action type,Event type\n\
         1003,Equity:Swap:GameStop,MODI,MODI\n",
    );

    let scanned = vec![
        scan::scan_archive(&day1, "gamestop", b',', |name| name.ends_with(".csv")).unwrap(),
        scan::scan_archive(&day2, "gamestop", b',', |name| name.ends_with(".csv")).unwrap(),
    ];
    assert_eq!(scanned[0].rows.len(), 1);
    assert_eq!(scanned[1].rows.len(), 1);

    let out = dir.path().join("report.csv");
    let matches = scan::write_report(&out, &scanned).unwrap();
    assert_eq!(matches, 2);

    // every row reindexed to the first header's width
    let mut reader = csv::Reader::from_path(&out).unwrap();
    let width = reader.headers().unwrap().len();
    assert_eq!(width, 3);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.len() == width));
    assert_eq!(&rows[1][0], "1003");
}

#[test]
fn non_matching_members_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cnsfails202401a.zip");
    write_zip(
        &path,
        "cnsfails202401a.txt",
        "SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY (FAILS)|DESCRIPTION|PRICE\n\
         20240105|36467W109|GME|25000|GAMESTOP CORP|17.53\n\
         20240105|88160R101|TSLA|100|TESLA INC|238.45\n",
    );

    // the member filter skips .csv lookups in a .txt-only archive
    let empty = scan::scan_archive(&path, "gme", b'|', |name| name.ends_with(".csv")).unwrap();
    assert!(empty.header.is_none());
    assert!(empty.rows.is_empty());

    let scanned = scan::scan_archive(&path, "gme", b'|', |name| name.ends_with(".txt")).unwrap();
    assert_eq!(scanned.rows.len(), 1);
    assert_eq!(&scanned.rows[0][2], "GME");
    assert_eq!(scanned.header.as_ref().unwrap().len(), 6);
}
