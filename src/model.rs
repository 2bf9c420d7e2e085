use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded instrument affecting title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub date: NaiveDate,
    pub date_string: String,
    pub grantor: String,
    pub grantee: String,
    pub instrument: String,
    pub book_page: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub is_vesting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

impl ChainEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey {
            date_string: self.date_string.clone(),
            book_page: self.book_page.clone(),
            instrument: self.instrument.clone(),
        }
    }
}

/// Identity of a record across extraction strategies and manual review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub date_string: String,
    pub book_page: String,
    pub instrument: String,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.date_string, self.book_page, self.instrument
        )
    }
}

impl FromStr for EntryKey {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let parts = raw.split('|').map(str::trim).collect::<Vec<&str>>();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            bail!("entry key must look like DATE|BOOK-PAGE|INSTRUMENT, got '{raw}'");
        }

        Ok(Self {
            date_string: parts[0].to_string(),
            book_page: parts[1].to_string(),
            instrument: parts[2].to_ascii_uppercase(),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Chain,
    Tax,
    Other,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chain => "chain",
            Self::Tax => "tax",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageClassification {
    pub page: usize,
    pub kind: PageKind,
    pub chain_score: usize,
    pub tax_score: usize,
}

/// All entries found in one run plus the subset kept for the closing document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainResult {
    pub kept: Vec<ChainEntry>,
    pub all: Vec<ChainEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub tax_year: i32,
    pub total_amount: Option<String>,
    pub date_paid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub chain: ChainResult,
    #[serde(default)]
    pub pages: Vec<PageClassification>,
    #[serde(default)]
    pub tax: Option<TaxSummary>,
}

impl ProcessOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            chain: ChainResult::default(),
            pages: Vec::new(),
            tax: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub report_version: u32,
    pub generated_at: String,
    pub updated_at: String,
    pub source_path: String,
    pub source_sha256: Option<String>,
    pub as_of: NaiveDate,
    pub outcome: ProcessOutcome,
    #[serde(default)]
    pub notes: Vec<String>,
}
