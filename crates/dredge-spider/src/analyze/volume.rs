use super::chains::SwapSet;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Per-execution-date aggregate over the file's `NEWT` rows: trade counts
/// split by contract-for-difference products, plus notional and quantity
/// per currency for the non-basket rows. This is the tabular form of the
/// original per-day volume charts.
#[derive(Debug, Default)]
pub struct DayVolume {
    pub count: u64,
    pub cfd_count: u64,
    pub non_cfd_count: u64,
    pub notional: BTreeMap<String, f64>,
    pub quantity: BTreeMap<String, f64>,
}

pub struct VolumeReport {
    pub days: BTreeMap<NaiveDate, DayVolume>,
    /// Rows whose execution timestamp would not parse; reported, not fatal.
    pub invalid_timestamps: u64,
}

pub fn daily_newt_volume(set: &SwapSet) -> VolumeReport {
    let mut days: BTreeMap<NaiveDate, DayVolume> = BTreeMap::new();
    let mut invalid = 0u64;

    for row in set.rows.iter().filter(|row| row.action == "NEWT") {
        let date = match row.exec_ts {
            Some(ts) => ts.date(),
            None => {
                invalid += 1;
                continue;
            }
        };
        let day = days.entry(date).or_default();
        day.count += 1;
        if row.product.to_lowercase().contains("contractfordifference") {
            day.cfd_count += 1;
        } else {
            day.non_cfd_count += 1;
        }

        if row.is_basket() {
            continue;
        }
        if row.notional > 0.0 {
            *day.notional.entry(row.currency_bucket().to_string()).or_default() += row.notional;
        }
        if row.quantity > 0.0 {
            *day.quantity.entry(row.currency_bucket().to_string()).or_default() += row.quantity;
        }
    }

    if invalid > 0 {
        debug!("{invalid} NEWT rows had unparseable execution timestamps");
    }

    VolumeReport {
        days,
        invalid_timestamps: invalid,
    }
}

impl VolumeReport {
    /// Sorted union of every currency seen across the report.
    pub fn currencies(&self) -> Vec<String> {
        let mut currencies = BTreeSet::new();
        for day in self.days.values() {
            currencies.extend(day.notional.keys().cloned());
            currencies.extend(day.quantity.keys().cloned());
        }
        currencies.into_iter().collect()
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Dissemination Identifier,Original Dissemination Identifier,Action type,\
        Event type,Event timestamp,Execution Timestamp,Expiration Date,Product name,\
        Notional amount-Leg 1,Notional currency-Leg 1,Total notional quantity-Leg 1";

    fn load(rows: &[&str]) -> SwapSet {
        let csv = format!("{HEADER}\n{}\n", rows.join("\n"));
        SwapSet::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn newt_rows_bucket_by_execution_date() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,,Equity:Swap,100,USD,10",
            "2,,NEWT,TRAD,2024-01-02T11:00:00Z,2024-01-02T10:30:00Z,,Equity:Swap:ContractForDifference,200,USD,20",
            "3,,NEWT,TRAD,2024-01-03T10:00:00Z,2024-01-03T09:00:00Z,,Equity:Swap,50,EUR,5",
            "4,2,MODI,MODI,2024-01-03T10:00:00Z,2024-01-03T09:00:00Z,,Equity:Swap,999,USD,99",
        ]);
        let report = daily_newt_volume(&set);
        assert_eq!(report.days.len(), 2);

        let jan2 = &report.days[&NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()];
        assert_eq!(jan2.count, 2);
        assert_eq!(jan2.cfd_count, 1);
        assert_eq!(jan2.non_cfd_count, 1);
        assert_eq!(jan2.notional["USD"], 300.0);

        // MODI rows never count towards NEWT volume
        let jan3 = &report.days[&NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()];
        assert_eq!(jan3.count, 1);
        assert_eq!(report.currencies(), vec!["EUR", "USD"]);
    }

    #[test]
    fn baskets_count_but_do_not_aggregate() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,,Equity:Swap:PriceReturnBasicPerformance:Basket,100,USD,10",
        ]);
        let report = daily_newt_volume(&set);
        let jan2 = &report.days[&NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()];
        assert_eq!(jan2.count, 1);
        assert!(jan2.notional.is_empty());
    }

    #[test]
    fn invalid_execution_timestamps_are_counted_not_fatal() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,not-a-date,,Equity:Swap,100,USD,10",
        ]);
        let report = daily_newt_volume(&set);
        assert!(report.days.is_empty());
        assert_eq!(report.invalid_timestamps, 1);
    }
}
