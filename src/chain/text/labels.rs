use anyhow::{Context, Result};
use regex::Regex;

use crate::chain::build_entry;
use crate::chain::dates::DateNormalizer;
use crate::model::ChainEntry;

/// Matches abstracts that print every field behind an inline label:
/// `GRANTOR: ... GRANTEE: ... <INSTRUMENT> DATED: <date> RECORDING: <book-page>`.
#[derive(Debug)]
pub struct LabelParser {
    labelled_record: Regex,
}

impl LabelParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            labelled_record: Regex::new(concat!(
                r"(?i)GRANTOR\s*:?\s*(?P<grantor>.+?)\s+GRANTEE\s*:?\s*(?P<grantee>.+?)\s+",
                r"(?P<instrument>SPECIAL\s+WARRANTY\s+DEED|WARRANTY\s+DEED|QUITCLAIM\s+DEED|DEED\s+OF\s+TRUST|MORTGAGE|DEED)\s+",
                r"DATED\s*:?\s*(?P<date>\d{1,2}/\d{1,2}/\d{4})\s+RECORDING\s*:?\s*(?P<record>\d{3,6}-\d{1,7})",
            ))
            .context("failed to compile labelled record regex")?,
        })
    }

    pub fn parse(&self, text: &str, dates: &DateNormalizer) -> Vec<ChainEntry> {
        let flat = text.split_whitespace().collect::<Vec<&str>>().join(" ");

        self.labelled_record
            .captures_iter(&flat)
            .filter_map(|captures| {
                let field = |name: &str| captures.name(name).map(|value| value.as_str()).unwrap_or("");
                let mut entry = build_entry(
                    dates,
                    field("date"),
                    field("grantor"),
                    field("grantee"),
                    field("instrument"),
                    field("record"),
                )?;
                entry.line = captures.get(0).map(|value| value.as_str().to_string());
                Some(entry)
            })
            .collect()
    }
}
