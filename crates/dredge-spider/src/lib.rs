pub mod analyze;
pub mod edgar;
pub mod swaps;

pub mod filelist;
pub mod fs;
pub mod scan;
pub(crate) mod tui;

use std::path::PathBuf;

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
}

/// Build the default HTTP client.
///
/// SEC and DTCC endpoints both expect a contact `User-Agent` (the SEC fair
/// access policy rejects anonymous clients), so `USER_AGENT` must be set in
/// the environment or a `.env` file.
pub(crate) fn std_client_build() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .user_agent(http::var("USER_AGENT").expect("environment variable USER_AGENT"))
        .build()
        .expect("failed to build reqwest client")
}

/// Root directory for downloaded archives and reports, `./data` unless
/// `DREDGE_DATA_DIR` says otherwise.
pub fn data_dir() -> PathBuf {
    PathBuf::from(http::var("DREDGE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()))
}

pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:.2}s", time.elapsed().as_secs_f64())
}
