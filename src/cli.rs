use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::EntryKey;
use crate::source::PopplerTools;

#[derive(Parser, Debug)]
#[command(
    name = "titlechain",
    version,
    about = "Chain-of-title extraction and 24-month vesting deed selection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract chain entries from a PDF or DOCX abstract.
    Extract(ExtractArgs),
    /// Print the chain/tax/other vote for every page.
    Classify(ClassifyArgs),
    /// Re-run the 24-month selection over a saved report.
    Select(SelectArgs),
    /// Manually keep or drop entries in a saved report.
    Review(ReviewArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PopplerArgs {
    #[arg(long, default_value = "pdftotext")]
    pub pdftotext_bin: String,

    #[arg(long, default_value = "pdftohtml")]
    pub pdftohtml_bin: String,
}

impl PopplerArgs {
    pub fn tools(&self) -> PopplerTools {
        PopplerTools {
            pdftotext: self.pdftotext_bin.clone(),
            pdftohtml: self.pdftohtml_bin.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub document: PathBuf,

    /// Reference date for the 24-month window (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,

    /// Tax year read from tax pages; defaults to the year before --as-of.
    #[arg(long)]
    pub tax_year: Option<i32>,

    /// Write the JSON extraction report to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub poppler: PopplerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    pub document: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub poppler: PopplerArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    pub report: PathBuf,

    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,

    /// Write the updated report here instead of rewriting it in place.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    pub report: PathBuf,

    /// Entry to add to the kept list, as DATE|BOOK-PAGE|INSTRUMENT.
    #[arg(long = "keep", value_parser = parse_entry_key)]
    pub keep: Vec<EntryKey>,

    /// Entry to remove from the kept list, as DATE|BOOK-PAGE|INSTRUMENT.
    #[arg(long = "drop", value_parser = parse_entry_key)]
    pub drop: Vec<EntryKey>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got '{raw}': {err}"))
}

fn parse_entry_key(raw: &str) -> Result<EntryKey, String> {
    raw.parse::<EntryKey>().map_err(|err| err.to_string())
}
