//! Title-chain extraction and 24-month selection.
//!
//! Every extractor here is total: input that yields no parseable record
//! produces an empty vector, never an error. Regexes are compiled once per
//! [`ChainExtractor`] and shared by reference; there is no global state.

pub mod dates;
pub mod instrument;
pub mod pages;
pub mod select;
pub mod table;
pub mod tax;
pub mod text;

use anyhow::Result;
use tracing::debug;

use crate::model::ChainEntry;
use crate::source::PageTable;

use self::dates::DateNormalizer;
use self::instrument::is_vesting_deed;
use self::table::TableExtractor;
use self::text::TextCascade;

/// Builds an entry from already-located fields. Returns `None` when the date
/// text does not normalize, so no entry ever exists without a date.
pub(crate) fn build_entry(
    dates: &DateNormalizer,
    date_string: &str,
    grantor: &str,
    grantee: &str,
    instrument: &str,
    book_page: &str,
) -> Option<ChainEntry> {
    let date_string = date_string.trim();
    let date = dates.parse(date_string)?;
    let instrument = collapse_whitespace(instrument).to_uppercase();

    Some(ChainEntry {
        date,
        date_string: date_string.to_string(),
        grantor: collapse_whitespace(grantor).to_uppercase(),
        grantee: collapse_whitespace(grantee).to_uppercase(),
        is_vesting: is_vesting_deed(&instrument),
        instrument,
        book_page: book_page.trim().to_string(),
        remark: None,
        line: None,
    })
}

pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Newest first. Stable, so equal dates keep their merge order.
pub(crate) fn sort_newest_first(entries: &mut [ChainEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

#[derive(Debug)]
pub struct ChainExtractor {
    dates: DateNormalizer,
    table: TableExtractor,
    text: TextCascade,
}

impl ChainExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dates: DateNormalizer::new()?,
            table: TableExtractor::new()?,
            text: TextCascade::new()?,
        })
    }

    pub fn extract_table_entries(&self, tables: &[PageTable]) -> Vec<ChainEntry> {
        let entries = self.table.extract(tables, &self.dates);
        debug!(tables = tables.len(), entries = entries.len(), "table extraction finished");
        entries
    }

    pub fn extract_text_entries(&self, text: &str) -> Vec<ChainEntry> {
        self.text.extract(text, &self.dates)
    }
}
