use dredge_spider::analyze::{volume, SwapSet};

// A cut of the real DTCC cumulative file layout: the interesting columns
// sit between unrelated ones and not at the positions the old positional
// parsers assumed.
const HEADER: &str = "Dissemination Identifier,Original Dissemination Identifier,Action type,\
    Event type,Event timestamp,Amendment indicator,Asset Class,Execution Timestamp,\
    Effective Date,Expiration Date,Platform identifier,Prime brokerage transaction indicator,\
    Product name,Notional amount-Leg 1,Notional amount-Leg 2,Notional currency-Leg 1,\
    Notional currency-Leg 2,Total notional quantity-Leg 1,Total notional quantity-Leg 2";

fn row(
    id: &str,
    parent: &str,
    action: &str,
    event: &str,
    event_ts: &str,
    exec_ts: &str,
    product: &str,
    notional: &str,
    currency: &str,
    quantity: &str,
) -> String {
    format!(
        "{id},{parent},{action},{event},{event_ts},,EQ,{exec_ts},2024-01-02,2025-01-01,,,\
         {product},{notional},,{currency},,{quantity},"
    )
}

#[test]
fn realistic_file_resolves_columns_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SEC_CUMULATIVE_EQUITIES_slice.csv");

    let mut body = String::from(HEADER);
    body.push('\n');
    // chain A: NEWT -> MODI -> TERM/ETRM (closed)
    body.push_str(&row("1","","NEWT","TRAD","2024-01-02T10:00:00Z","2024-01-02T09:30:00Z","Equity:Swap:TotalReturn:Single","500000","USD","10000"));
    body.push('\n');
    body.push_str(&row("2","1","MODI","MODI","2024-01-03T10:00:00Z","2024-01-02T09:30:00Z","Equity:Swap:TotalReturn:Single","510000","USD","10200"));
    body.push('\n');
    body.push_str(&row("3","2","TERM","ETRM","2024-01-04T10:00:00Z","2024-01-02T09:30:00Z","Equity:Swap:TotalReturn:Single","0","USD","0"));
    body.push('\n');
    // chain B: NEWT -> MODI, still open
    body.push_str(&row("10","","NEWT","TRAD","2024-01-02T11:00:00Z","2024-01-02T10:45:00Z","Equity:Swap:ContractForDifference:Single","250000","EUR","5000"));
    body.push('\n');
    body.push_str(&row("11","10","MODI","MODI","2024-01-05T11:00:00Z","2024-01-02T10:45:00Z","Equity:Swap:ContractForDifference:Single","260000","EUR","5100"));
    body.push('\n');
    std::fs::write(&path, body).unwrap();

    let set = SwapSet::load(&path).unwrap();
    assert_eq!(set.chains().len(), 2);

    let open = set.open_chains();
    assert_eq!(open.len(), 1);
    let chain = &open[0];
    assert_eq!(chain.root_id, "10");
    assert_eq!(chain.last_id, "11");
    assert_eq!(chain.last_action, "MODI");
    assert_eq!(chain.product, "Equity:Swap:ContractForDifference:Single");
    assert_eq!(chain.notional["EUR"], 510000.0);
    assert_eq!(chain.quantity["EUR"], 10100.0);

    let report = volume::daily_newt_volume(&set);
    let day = report.days.values().next().unwrap();
    assert_eq!(report.days.len(), 1); // both NEWTs executed 2024-01-02
    assert_eq!(day.count, 2);
    assert_eq!(day.cfd_count, 1);
    assert_eq!(day.non_cfd_count, 1);
}
