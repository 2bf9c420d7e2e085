use anyhow::{Context, Result};
use regex::Regex;

use crate::chain::dates::DateNormalizer;
use crate::chain::{build_entry, collapse_whitespace};
use crate::model::ChainEntry;

const UNKNOWN_PARTY: &str = "UNKNOWN";
const ENTITY_SUFFIXES: [&str; 10] = [
    " LLC", " INC", " CO", " COMPANY", " CORP", " TRUST", " JR", " SR", " LP", " LLP",
];

/// Last-resort scan: any line holding `<date> ... <instrument> <book-page>`
/// becomes an entry, with parties inferred from neighbouring lines.
#[derive(Debug)]
pub struct LinewiseParser {
    record_fragment: Regex,
}

impl LinewiseParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            record_fragment: Regex::new(concat!(
                r"(?i)(?P<date>\d{1,2}/\d{1,2}/\d{4})\s+(?P<between>.*?)\s*",
                r"(?P<instrument>SPECIAL\s+WARRANTY\s+DEED|WARRANTY\s+DEED|QUITCLAIM\s+DEED|DEED\s+OF\s+TRUST|MORTGAGE|DEED)",
                r"\s+(?P<book>[A-Z0-9-]+)",
            ))
            .context("failed to compile line-wise record regex")?,
        })
    }

    pub fn parse(&self, text: &str, dates: &DateNormalizer) -> Vec<ChainEntry> {
        let lines = text.lines().map(str::trim).collect::<Vec<&str>>();
        let mut entries = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let Some(captures) = self.record_fragment.captures(line) else {
                continue;
            };
            let field = |name: &str| captures.name(name).map(|value| value.as_str()).unwrap_or("");

            let between = collapse_whitespace(field("between")).to_uppercase();
            let mut grantee = if between == "-" { String::new() } else { between };

            let previous = index
                .checked_sub(1)
                .and_then(|previous| self.neighbour(&lines, previous));
            let next = self.neighbour(&lines, index + 1);

            let mut grantor = previous.unwrap_or_default();
            if let Some(continuation) = next.as_deref()
                && !grantor.is_empty()
                && !grantee.is_empty()
                && has_entity_suffix(continuation)
            {
                if !has_entity_suffix(&grantor) {
                    grantor = format!("{grantor} {continuation}");
                } else if !has_entity_suffix(&grantee) {
                    grantee = format!("{grantee} {continuation}");
                }
            }

            if grantee.is_empty()
                && let Some(continuation) = next
            {
                grantee = continuation;
            }
            if grantor.is_empty() {
                grantor = UNKNOWN_PARTY.to_string();
            }
            if grantee.is_empty() {
                grantee = UNKNOWN_PARTY.to_string();
            }

            let Some(mut entry) = build_entry(
                dates,
                field("date"),
                &grantor,
                &grantee,
                field("instrument"),
                field("book"),
            ) else {
                continue;
            };
            entry.line = Some(line.to_string());
            entries.push(entry);
        }

        entries
    }

    /// Upper-cased neighbour text, unless that line is blank, a separator, a
    /// heading, or a record line of its own.
    fn neighbour(&self, lines: &[&str], index: usize) -> Option<String> {
        let line = lines.get(index)?;
        let upper = line.to_uppercase();
        if line.is_empty()
            || line.starts_with('*')
            || upper.contains("CHAIN OF TITLE")
            || upper.contains("FILED GRANTOR")
            || self.record_fragment.is_match(line)
        {
            return None;
        }
        Some(upper)
    }
}

fn has_entity_suffix(party: &str) -> bool {
    let padded = format!(" {party}");
    ENTITY_SUFFIXES.iter().any(|suffix| padded.contains(suffix))
}
