use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::dates::DateNormalizer;
use super::text::merge::merge_candidates;
use super::{build_entry, sort_newest_first};
use crate::model::ChainEntry;
use crate::source::PageTable;

const HEADER_TOKENS: [&str; 3] = ["GRANTOR", "GRANTEE", "INSTRUMENT"];
const DATE_HEADERS: [&str; 3] = ["DATED", "FILED", "DATE"];
const RECORDING_HEADERS: [&str; 4] = ["BOOK-PAGE", "RECORDING", "BOOK", "RECORD"];

/// Column positions resolved from a header row. `None` means the header
/// carried no matching label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub grantor: Option<usize>,
    pub grantee: Option<usize>,
    pub instrument: Option<usize>,
    pub date: Option<usize>,
    pub recording: Option<usize>,
}

#[derive(Debug)]
pub struct TableExtractor {
    cell_date: Regex,
    cell_book_page: Regex,
}

impl TableExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cell_date: Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})")
                .context("failed to compile table date cell regex")?,
            cell_book_page: Regex::new(r"([A-Z0-9]+-\d+)")
                .context("failed to compile table book-page cell regex")?,
        })
    }

    /// Parses every table that carries a GRANTOR/GRANTEE/INSTRUMENT header.
    /// Tables without one contribute nothing.
    pub fn extract(&self, tables: &[PageTable], dates: &DateNormalizer) -> Vec<ChainEntry> {
        let mut per_table = Vec::with_capacity(tables.len());

        for table in tables {
            let Some((header_index, columns)) = locate_header(table) else {
                continue;
            };
            debug!(header_row = header_index, ?columns, "found chain table header");

            let entries = self
                .fold_continuation_rows(&table[header_index + 1..], &columns)
                .iter()
                .filter_map(|row| self.parse_row(row, &columns, dates))
                .collect::<Vec<ChainEntry>>();
            per_table.push(entries);
        }

        let mut entries = merge_candidates(per_table);
        sort_newest_first(&mut entries);
        entries
    }

    /// A row with no date in the date column continues the dated row above
    /// it: each non-empty cell is appended to the same column after `\n`.
    fn fold_continuation_rows(&self, rows: &[Vec<String>], columns: &ColumnMap) -> Vec<Vec<String>> {
        let mut records = Vec::<Vec<String>>::with_capacity(rows.len());
        let mut open_record = false;

        for row in rows {
            let dated = columns
                .date
                .and_then(|index| row.get(index))
                .is_some_and(|cell| self.cell_date.is_match(cell));
            if !dated
                && open_record
                && let Some(record) = records.last_mut()
            {
                append_cells(record, row);
                continue;
            }
            open_record = dated;
            records.push(row.clone());
        }

        records
    }

    fn parse_row(
        &self,
        row: &[String],
        columns: &ColumnMap,
        dates: &DateNormalizer,
    ) -> Option<ChainEntry> {
        let cell = |index: Option<usize>| -> String {
            index
                .and_then(|index| row.get(index))
                .map(|value| value.replace('\n', " ").trim().to_string())
                .unwrap_or_default()
        };

        let grantor = cell(columns.grantor);
        let grantee = cell(columns.grantee);
        let instrument = cell(columns.instrument);
        let date_cell = cell(columns.date);
        let recording_cell = cell(columns.recording);

        let date_string = self
            .cell_date
            .captures(&date_cell)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())?;

        let book_page = self
            .cell_book_page
            .captures(&recording_cell)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
            .unwrap_or(recording_cell);
        if book_page.is_empty() {
            return None;
        }

        build_entry(dates, &date_string, &grantor, &grantee, &instrument, &book_page)
    }
}

fn append_cells(record: &mut Vec<String>, row: &[String]) {
    if record.len() < row.len() {
        record.resize(row.len(), String::new());
    }
    for (cell, continuation) in record.iter_mut().zip(row) {
        let continuation = continuation.trim();
        if continuation.is_empty() {
            continue;
        }
        if !cell.is_empty() {
            cell.push('\n');
        }
        cell.push_str(continuation);
    }
}

/// First row whose joined cells mention all three header tokens.
pub fn locate_header(table: &PageTable) -> Option<(usize, ColumnMap)> {
    table.iter().enumerate().find_map(|(index, row)| {
        let cells = row
            .iter()
            .map(|value| value.trim().to_uppercase())
            .collect::<Vec<String>>();
        let joined = cells.join(" ");

        if !HEADER_TOKENS.iter().all(|token| joined.contains(token)) {
            return None;
        }

        Some((
            index,
            ColumnMap {
                grantor: find_column(&cells, &["GRANTOR"]),
                grantee: find_column(&cells, &["GRANTEE"]),
                instrument: find_column(&cells, &["INSTRUMENT"]),
                date: find_column(&cells, &DATE_HEADERS),
                recording: find_column(&cells, &RECORDING_HEADERS),
            },
        ))
    })
}

/// Exact label match across all variants first, then substring match.
fn find_column(cells: &[String], variants: &[&str]) -> Option<usize> {
    variants
        .iter()
        .find_map(|variant| cells.iter().position(|cell| cell == variant))
        .or_else(|| {
            variants
                .iter()
                .find_map(|variant| cells.iter().position(|cell| cell.contains(variant)))
        })
}
