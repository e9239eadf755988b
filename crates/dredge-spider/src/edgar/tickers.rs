use crate::http::*;
use serde::de::Visitor;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, error, trace};

const URL: &str = "https://www.sec.gov/files/company_tickers.json";

// de
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct Tickers(pub Vec<Ticker>);

#[derive(Clone, Debug, Deserialize)]
pub struct Ticker {
    #[serde(rename = "cik_str", deserialize_with = "de_cik")]
    pub cik: String,
    pub ticker: String,
    pub title: String,
}

// The SEC publishes CIKs as bare integers; EDGAR paths want them as
// zero-padded 10-character strings.
fn de_cik<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let cik = u64::deserialize(deserializer)?;
    Ok(format!("{cik:010}"))
}

struct TickerVisitor;

impl<'de> Visitor<'de> for TickerVisitor {
    type Value = Tickers;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("Map of tickers")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // each entry is in the form of:
        // `0: { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
        //  1: { ... },
        //  ...`
        let mut tickers: Vec<Ticker> = Vec::new();
        while let Some((_, ticker)) = map.next_entry::<u32, Ticker>()? {
            tickers.push(ticker);
        }
        Ok(Tickers(tickers))
    }
}

impl<'de> Deserialize<'de> for Tickers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // a vector is wanted, but the endpoint serves a map keyed by row
        // number, hence the visitor
        deserializer.deserialize_map(TickerVisitor)
    }
}

// fetch
// ----------------------------------------------------------------------------

fn cache_path() -> PathBuf {
    crate::data_dir().join("edgar").join("company_tickers.json")
}

/// Fetch the SEC company ticker directory, reading the on-disk cache when
/// one exists (delete the file to force a refresh).
pub async fn fetch(http_client: &HttpClient) -> anyhow::Result<Tickers> {
    let cache = cache_path();
    if cache.exists() {
        trace!("reading cached company tickers from {cache:?}");
        let bytes = tokio::fs::read(&cache).await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    debug!("fetching SEC company tickers");
    let bytes = http_client
        .get(URL)
        .send()
        .await
        .map_err(|err| {
            error!("failed to fetch company tickers, error({err})");
            err
        })?
        .bytes()
        .await?;

    if let Some(dir) = cache.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&cache, &bytes).await?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Resolve a ticker symbol to its directory entry, so a symbol query can be
/// widened into an issuer-title keyword.
pub async fn resolve(symbol: &str) -> anyhow::Result<Option<Ticker>> {
    let http_client = crate::std_client_build();
    let tickers = fetch(&http_client).await?;
    Ok(tickers
        .0
        .into_iter()
        .find(|t| t.ticker.eq_ignore_ascii_case(symbol)))
}
