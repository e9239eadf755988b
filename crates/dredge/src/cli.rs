use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download regulatory archives into the data directory.
    Dredge {
        /// Specify the archives to download.
        ///
        /// If no archives are provided, dredge will collect all.
        #[arg(short, long)]
        archives: Option<Vec<Archive>>,

        /// First date for the daily and half-month feeds (YYYY-MM-DD);
        /// 30 days back when omitted.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date for the daily and half-month feeds; today when omitted.
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Search the downloaded archives for a keyword or CUSIP and collect
    /// the matching rows into a CSV report.
    Search {
        /// Keyword, CUSIP, or (with --ticker) a ticker symbol.
        query: String,

        /// Specify the archives to search.
        ///
        /// If no archives are provided, all downloaded archives are searched.
        #[arg(short, long)]
        archives: Option<Vec<Archive>>,

        /// Resolve the query as a ticker symbol through the SEC company
        /// directory and search for the issuer title instead.
        #[arg(long)]
        ticker: bool,
    },

    /// Trace swap amendment chains in a produced CSV and report the
    /// positions never fully terminated.
    Analyze {
        /// Swap CSV to analyze; interactive picker when omitted.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Archive {
    /// CFTC swap data repository cumulative equities (daily).
    CftcSwaps,

    /// SEC security-based swap cumulative equities (daily).
    SecSwaps,

    /// Form 13F institutional holdings data sets (quarterly).
    Form13f,

    /// Form N-PORT fund portfolio holdings data sets (quarterly).
    Nport,

    /// Form N-CEN fund census data sets (quarterly).
    Ncen,

    /// Form N-MFP money market fund data sets (quarterly).
    Nmfp,

    /// Form D exempt offering data sets (quarterly).
    FormD,

    /// Fails-to-deliver files (half-month).
    Ftd,
}

impl Archive {
    pub fn all() -> Vec<Self> {
        use Archive::*;
        vec![CftcSwaps, SecSwaps, Form13f, Nport, Ncen, Nmfp, FormD, Ftd]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archive::CftcSwaps => "CFTC swaps",
            Archive::SecSwaps => "SEC swaps",
            Archive::Form13f => "Form 13F",
            Archive::Nport => "N-PORT",
            Archive::Ncen => "N-CEN",
            Archive::Nmfp => "N-MFP",
            Archive::FormD => "Form D",
            Archive::Ftd => "fails-to-deliver",
        }
    }
}
