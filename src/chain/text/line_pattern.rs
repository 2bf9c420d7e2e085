use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::chain::build_entry;
use crate::chain::dates::DateNormalizer;
use crate::model::ChainEntry;

const NOISE_PATTERNS: [&str; 13] = [
    r"FILED.*GRANTOR.*GRANTEE.*INSTRUMENT",
    r"^\*+",
    r"CHAIN OF TITLE",
    r"File No\.",
    r"NAME CERTIFICATION",
    r"SELLER\s+.*\s+BUYER",
    r"OWNER:",
    r"For further information",
    r"Certified to:",
    r"New Certification Date:",
    r"By:.*",
    r"INFORMATION TO FOLLOW",
    r"^\s*$",
];

/// Strict single-line records: `<date> <grantor> <grantee> <instrument> <book-page> [remark]`.
#[derive(Debug)]
pub struct LinePatternParser {
    noise: Vec<Regex>,
    full_record: Regex,
    short_record: Regex,
}

impl LinePatternParser {
    pub fn new() -> Result<Self> {
        let noise = NOISE_PATTERNS
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}"))
                    .with_context(|| format!("failed to compile noise line regex {pattern}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            noise,
            full_record: Regex::new(concat!(
                r"(?i)^(\d{2}/\d{2}/\d{4})\s+(.+?)\s+(.+?)\s+",
                r"((?:[\w\s]+(?:DEED|TRUST|ASSIGNMENT|MORTGAGE|UCC|SATISFACTION|RELEASE|SUBORDINATION|MODIFICATION|EXTENSION|LIS PENDENS|NOTICE|AFFIDAVIT|EASEMENT)[\w\s]*)|(?:P\s+\d+-\d+))",
                r"\s+([A-Z]?\s*\d+-\d+|\w+-\w+)(?:\s+(.*))?$",
            ))
            .context("failed to compile full record line regex")?,
            short_record: Regex::new(concat!(
                r"(?i)^(\d{2}/\d{2}/\d{4})\s+(.+?)\s+",
                r"(WARRANTY DEED|DEED OF TRUST|QUITCLAIM DEED|SPECIAL WARRANTY DEED|DEED)",
                r"\s+(\d+-\d+)(?:\s+(.*))?$",
            ))
            .context("failed to compile short record line regex")?,
        })
    }

    pub fn parse(&self, text: &str, dates: &DateNormalizer) -> Vec<ChainEntry> {
        text.lines()
            .map(str::trim)
            .filter(|line| !self.is_noise(line))
            .filter_map(|line| self.parse_line(line, dates))
            .collect()
    }

    fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|pattern| pattern.is_match(line))
    }

    fn parse_line(&self, line: &str, dates: &DateNormalizer) -> Option<ChainEntry> {
        let group = |captures: &Captures<'_>, index: usize| -> String {
            captures
                .get(index)
                .map(|value| value.as_str().trim().to_string())
                .unwrap_or_default()
        };

        let (date_string, grantor, grantee, instrument, book_page, remark) =
            if let Some(captures) = self.full_record.captures(line) {
                (
                    group(&captures, 1),
                    group(&captures, 2),
                    group(&captures, 3),
                    group(&captures, 4),
                    group(&captures, 5),
                    group(&captures, 6),
                )
            } else {
                let captures = self.short_record.captures(line)?;
                let (grantor, grantee) = split_names_at_midpoint(&group(&captures, 2));
                (
                    group(&captures, 1),
                    grantor,
                    grantee,
                    group(&captures, 3),
                    group(&captures, 4),
                    group(&captures, 5),
                )
            };

        let mut entry = build_entry(dates, &date_string, &grantor, &grantee, &instrument, &book_page)?;
        entry.remark = Some(remark).filter(|value| !value.is_empty());
        entry.line = Some(line.to_string());
        Some(entry)
    }
}

/// Combined party text with no separator: first half of the words is the
/// grantor. A single word leaves the grantee unknown.
fn split_names_at_midpoint(combined: &str) -> (String, String) {
    let words = combined.split_whitespace().collect::<Vec<&str>>();
    if words.len() < 2 {
        return (combined.trim().to_string(), "UNKNOWN".to_string());
    }

    let middle = words.len() / 2;
    (words[..middle].join(" "), words[middle..].join(" "))
}
