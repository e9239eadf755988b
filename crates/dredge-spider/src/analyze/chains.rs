use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Basket swaps carry no usable per-row weighting, so they are excluded
/// from notional aggregation (they still count towards chain membership).
const BASKET_PRODUCT: &str = "Equity:Swap:PriceReturnBasicPerformance:Basket";

const TERMINAL_ACTION: &str = "TERM";
const TERMINAL_EVENT: &str = "ETRM";
const NEW_TRADE_ACTION: &str = "NEWT";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
}

/// One disseminated swap record, reduced to the columns the chain walk and
/// the reports need. Timestamps keep their raw text for reporting alongside
/// the parsed form used for ordering.
#[derive(Debug)]
pub struct SwapRow {
    pub id: String,
    /// `Original Dissemination Identifier`: the previous record in the
    /// amendment/termination chain. Blank, `nan` artifacts and
    /// self-references all mean "no parent".
    pub parent: Option<String>,
    pub action: String,
    pub event: String,
    pub event_ts_raw: String,
    pub event_ts: Option<NaiveDateTime>,
    pub exec_ts_raw: String,
    pub exec_ts: Option<NaiveDateTime>,
    pub expiration: String,
    pub product: String,
    pub notional: f64,
    pub currency: String,
    pub quantity: f64,
}

impl SwapRow {
    pub fn is_basket(&self) -> bool {
        self.product == BASKET_PRODUCT
    }

    /// Currency bucket for aggregation; blank currencies land in `UNK`.
    pub fn currency_bucket(&self) -> &str {
        if self.currency.is_empty() {
            "UNK"
        } else {
            &self.currency
        }
    }
}

/// A loaded swap CSV, indexed by `Dissemination Identifier`.
#[derive(Debug)]
pub struct SwapSet {
    pub rows: Vec<SwapRow>,
    by_id: HashMap<String, usize>,
}

/// Column positions resolved from the header by name; the upstream files
/// have shuffled positions between revisions, so positional access is out.
struct ColIdx {
    id: usize,
    parent: usize,
    action: usize,
    event: Option<usize>,
    event_ts: Option<usize>,
    exec_ts: Option<usize>,
    expiration: Option<usize>,
    product: Option<usize>,
    notional: Option<usize>,
    currency: Option<usize>,
    quantity: Option<usize>,
}

impl ColIdx {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, SchemaError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &'static str| find(name).ok_or(SchemaError::MissingColumn(name));

        Ok(Self {
            id: require("Dissemination Identifier")?,
            parent: require("Original Dissemination Identifier")?,
            action: require("Action type")?,
            event: find("Event type"),
            event_ts: find("Event timestamp"),
            exec_ts: find("Execution Timestamp"),
            expiration: find("Expiration Date"),
            product: find("Product name"),
            notional: find("Notional amount-Leg 1"),
            currency: find("Notional currency-Leg 1"),
            quantity: find("Total notional quantity-Leg 1"),
        })
    }
}

/// The SDR feeds stamp events as `2024-01-05T14:30:00Z`; fall back to full
/// RFC 3339 for files that carry offsets.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .ok()
        })
}

// amounts over a thousand arrive with separators
fn parse_amount(raw: &str) -> f64 {
    raw.replace(',', "").trim().parse().unwrap_or(0.0)
}

impl SwapSet {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl std::io::Read) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let cols = ColIdx::resolve(csv_reader.headers()?)?;

        let get = |record: &csv::StringRecord, idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        let mut rows = Vec::new();
        let mut by_id = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let id = get(&record, Some(cols.id));
            if id.is_empty() {
                continue;
            }

            let parent = match get(&record, Some(cols.parent)) {
                p if p.is_empty() || p == "nan" => None,
                // a record claiming to amend itself is its own root
                p if p == id => {
                    debug!("self-referential parent on {id}, treating as root");
                    None
                }
                p => Some(p),
            };

            let event_ts_raw = get(&record, cols.event_ts);
            let exec_ts_raw = get(&record, cols.exec_ts);
            let row = SwapRow {
                parent,
                action: get(&record, Some(cols.action)),
                event: get(&record, cols.event),
                event_ts: parse_timestamp(&event_ts_raw),
                event_ts_raw,
                exec_ts: parse_timestamp(&exec_ts_raw),
                exec_ts_raw,
                expiration: get(&record, cols.expiration),
                product: get(&record, cols.product),
                notional: parse_amount(&get(&record, cols.notional)),
                currency: get(&record, cols.currency).to_uppercase(),
                quantity: parse_amount(&get(&record, cols.quantity)),
                id,
            };
            if by_id.insert(row.id.clone(), rows.len()).is_some() {
                warn!("duplicate dissemination identifier {}", row.id);
            }
            rows.push(row);
        }

        Ok(Self { rows, by_id })
    }

    /// Walk parent pointers from `id` to the chain root. Terminates on rows
    /// with no parent, on parent ids absent from the file (the root then is
    /// that dangling id), and on cycles (the last id reached before the
    /// revisit wins).
    pub fn root_of(&self, id: &str) -> String {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = id;
        loop {
            visited.insert(current);
            let row = match self.by_id.get(current) {
                Some(&idx) => &self.rows[idx],
                // dangling parent reference: the chain starts before this file
                None => return current.to_string(),
            };
            match &row.parent {
                Some(parent) if !visited.contains(parent.as_str()) => current = parent,
                _ => return current.to_string(),
            }
        }
    }

    /// Group every record under its chain root.
    pub fn chains(&self) -> BTreeMap<String, Vec<usize>> {
        let mut chains: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, row) in self.rows.iter().enumerate() {
            chains.entry(self.root_of(&row.id)).or_default().push(idx);
        }
        chains
    }

    /// Chains that opened with a `NEWT` and whose chronologically-latest
    /// event is not a full termination (`TERM`/`ETRM`).
    pub fn open_chains(&self) -> Vec<OpenChain> {
        let mut open = Vec::new();
        for (root_id, members) in self.chains() {
            let root_row = match self.by_id.get(&root_id) {
                Some(&idx) => &self.rows[idx],
                // root disseminated before this file's window
                None => continue,
            };
            if root_row.action != NEW_TRADE_ACTION {
                continue;
            }

            // rows without a parseable timestamp lose the comparison
            let latest = match members
                .iter()
                .map(|&idx| &self.rows[idx])
                .max_by_key(|row| row.event_ts)
            {
                Some(row) => row,
                None => continue,
            };
            if latest.action == TERMINAL_ACTION && latest.event == TERMINAL_EVENT {
                continue;
            }

            let mut notional: BTreeMap<String, f64> = BTreeMap::new();
            let mut quantity: BTreeMap<String, f64> = BTreeMap::new();
            for &idx in &members {
                let row = &self.rows[idx];
                if row.is_basket() {
                    continue;
                }
                *notional.entry(row.currency_bucket().to_string()).or_default() += row.notional;
                *quantity.entry(row.currency_bucket().to_string()).or_default() += row.quantity;
            }

            open.push(OpenChain {
                root_id,
                last_id: latest.id.clone(),
                last_action: latest.action.clone(),
                event_ts: latest.event_ts_raw.clone(),
                exec_ts: latest.exec_ts_raw.clone(),
                expiration: latest.expiration.clone(),
                product: latest.product.clone(),
                notional,
                quantity,
            });
        }
        open
    }
}

/// An un-terminated swap position chain, summarised from its latest event.
#[derive(Debug)]
pub struct OpenChain {
    pub root_id: String,
    pub last_id: String,
    pub last_action: String,
    pub event_ts: String,
    pub exec_ts: String,
    pub expiration: String,
    pub product: String,
    /// Notional summed per currency over the chain's non-basket rows.
    pub notional: BTreeMap<String, f64>,
    pub quantity: BTreeMap<String, f64>,
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
    fn missing_required_column_is_a_schema_error() {
        let err = SwapSet::from_reader("Action type\nNEWT\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Dissemination Identifier"));
    }

    #[test]
    fn roots_resolve_through_parent_pointers() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,100,USD,10",
            "2,1,MODI,MODI,2024-01-03T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,120,USD,12",
            "3,2,MODI,MODI,2024-01-04T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,130,USD,13",
        ]);
        assert_eq!(set.root_of("3"), "1");
        let chains = set.chains();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains["1"].len(), 3);
    }

    #[test]
    fn walk_terminates_on_cycles() {
        // 1 -> 2 -> 1 is malformed data, not an excuse to hang
        let set = load(&[
            "1,2,NEWT,TRAD,2024-01-02T10:00:00Z,,,Equity:Swap,100,USD,10",
            "2,1,MODI,MODI,2024-01-03T10:00:00Z,,,Equity:Swap,100,USD,10",
        ]);
        // each walk crosses to the other side of the cycle before the
        // revisit stops it, so the two rows resolve to opposite roots
        assert_eq!(set.root_of("1"), "2");
        assert_eq!(set.root_of("2"), "1");
        let chains = set.chains();
        assert_eq!(chains.len(), 2);
        assert!(chains.values().all(|members| members.len() == 1));
    }

    #[test]
    fn self_reference_and_nan_both_mean_root() {
        let set = load(&[
            "1,1,NEWT,TRAD,2024-01-02T10:00:00Z,,,Equity:Swap,100,USD,10",
            "2,nan,NEWT,TRAD,2024-01-02T10:00:00Z,,,Equity:Swap,100,USD,10",
        ]);
        assert_eq!(set.root_of("1"), "1");
        assert_eq!(set.root_of("2"), "2");
        assert_eq!(set.chains().len(), 2);
    }

    #[test]
    fn dangling_parent_becomes_the_root_and_is_not_reported() {
        // the chain opened before this file's window; without its NEWT row
        // it cannot be classified, so it is skipped
        let set = load(&[
            "5,4,MODI,MODI,2024-01-03T10:00:00Z,,,Equity:Swap,100,USD,10",
        ]);
        assert_eq!(set.root_of("5"), "4");
        assert!(set.open_chains().is_empty());
    }

    #[test]
    fn fully_terminated_chains_are_closed() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,100,USD,10",
            "2,1,TERM,ETRM,2024-01-05T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,0,USD,0",
        ]);
        assert!(set.open_chains().is_empty());
    }

    #[test]
    fn term_without_etrm_event_stays_open() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,100,USD,10",
            "2,1,TERM,MODI,2024-01-05T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,0,USD,0",
        ]);
        let open = set.open_chains();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].last_id, "2");
        assert_eq!(open[0].last_action, "TERM");
    }

    #[test]
    fn chains_not_rooted_in_a_newt_are_skipped() {
        let set = load(&[
            "1,,MODI,MODI,2024-01-02T10:00:00Z,,,Equity:Swap,100,USD,10",
        ]);
        assert!(set.open_chains().is_empty());
    }

    #[test]
    fn notional_aggregates_per_currency_and_skips_baskets() {
        let set = load(&[
            "1,,NEWT,TRAD,2024-01-02T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,100,USD,10",
            "2,1,MODI,MODI,2024-01-03T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,\"1,900\",usd,5",
            "3,2,MODI,MODI,2024-01-04T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,50,EUR,1",
            "4,3,MODI,MODI,2024-01-05T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap:PriceReturnBasicPerformance:Basket,999,USD,99",
            "5,4,MODI,MODI,2024-01-06T10:00:00Z,2024-01-02T09:00:00Z,2025-01-01,Equity:Swap,25,,2",
        ]);
        let open = set.open_chains();
        assert_eq!(open.len(), 1);
        let chain = &open[0];
        assert_eq!(chain.notional["USD"], 2000.0); // currency uppercased, separators stripped
        assert_eq!(chain.notional["EUR"], 50.0);
        assert_eq!(chain.notional["UNK"], 25.0);
        assert_eq!(chain.quantity["USD"], 15.0);
        assert!(!chain.notional.contains_key("BASKET"));
        assert_eq!(chain.last_id, "5");
    }

    #[test]
    fn unparseable_timestamps_lose_the_latest_comparison() {
        let set = load(&[
            "1,,NEWT,TRAD,garbage,,,Equity:Swap,100,USD,10",
            "2,1,MODI,MODI,2024-01-03T10:00:00Z,,,Equity:Swap,100,USD,10",
        ]);
        let open = set.open_chains();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].last_id, "2");
    }
}
