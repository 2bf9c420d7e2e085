//! Rebuilds table rows from `pdftotext -layout` output, where each column
//! keeps the character offset of its header label.

use anyhow::{Context, Result};
use regex::Regex;

use super::is_table_end;
use crate::chain::build_entry;
use crate::chain::dates::DateNormalizer;
use crate::model::ChainEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Grantor,
    Grantee,
    Instrument,
    Recording,
}

/// Header label offsets, in characters, sorted left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnLayout {
    columns: Vec<(Field, usize)>,
}

impl ColumnLayout {
    fn from_header(line: &str) -> Option<Self> {
        let upper = line.to_ascii_uppercase();
        let grantor = char_offset(&upper, "GRANTOR")?;
        let grantee = char_offset(&upper, "GRANTEE")?;
        let instrument = char_offset(&upper, "INSTRUMENT")?;

        let mut columns = vec![
            (Field::Grantor, grantor),
            (Field::Grantee, grantee),
            (Field::Instrument, instrument),
        ];
        if let Some(date) = char_offset(&upper, "FILED").or_else(|| char_offset(&upper, "DATED")) {
            columns.push((Field::Date, date));
        }
        if let Some(recording) =
            char_offset(&upper, "BOOK-PAGE").or_else(|| char_offset(&upper, "RECORDING"))
        {
            columns.push((Field::Recording, recording));
        }
        columns.sort_by_key(|(_, offset)| *offset);

        Some(Self { columns })
    }

    fn has(&self, field: Field) -> bool {
        self.columns.iter().any(|(candidate, _)| *candidate == field)
    }

    /// Text under `field`, from its header offset up to the next column.
    fn slice<'a>(&self, line: &'a str, field: Field) -> &'a str {
        let Some(position) = self.columns.iter().position(|(candidate, _)| *candidate == field)
        else {
            return "";
        };
        let start = self.columns[position].1;
        let end = self.columns.get(position + 1).map(|(_, offset)| *offset);
        char_slice(line, start, end)
    }
}

#[derive(Debug)]
pub struct ColumnLayoutParser {
    date_prefix: Regex,
    book_page_prefix: Regex,
}

impl ColumnLayoutParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            date_prefix: Regex::new(r"^\s*(\d{1,2}/\d{1,2}/\d{4})")
                .context("failed to compile column date prefix regex")?,
            book_page_prefix: Regex::new(r"^\s*(\w+-\w+)")
                .context("failed to compile column book-page prefix regex")?,
        })
    }

    pub fn parse(&self, text: &str, dates: &DateNormalizer) -> Vec<ChainEntry> {
        let mut entries = Vec::new();
        let mut layout: Option<ColumnLayout> = None;
        let mut block = Vec::<&str>::new();
        let mut block_has_date = false;

        for line in text.lines() {
            if let Some(next_layout) = ColumnLayout::from_header(line) {
                if let Some(active) = &layout {
                    self.flush(&mut block, block_has_date, active, dates, &mut entries);
                }
                block_has_date = false;
                layout = Some(next_layout);
                continue;
            }

            let Some(active) = &layout else {
                continue;
            };

            if is_table_end(line) {
                self.flush(&mut block, block_has_date, active, dates, &mut entries);
                block_has_date = false;
                layout = None;
                continue;
            }

            let starts_entry = self.starts_with_date(active, line);
            if starts_entry && block_has_date {
                self.flush(&mut block, block_has_date, active, dates, &mut entries);
                block_has_date = false;
            }

            block.push(line);
            block_has_date |= starts_entry;
        }

        if let Some(active) = &layout {
            self.flush(&mut block, block_has_date, active, dates, &mut entries);
        }

        entries
    }

    fn starts_with_date(&self, layout: &ColumnLayout, line: &str) -> bool {
        if self.date_prefix.is_match(line) {
            return true;
        }
        layout.has(Field::Date) && self.date_prefix.is_match(layout.slice(line, Field::Date))
    }

    fn flush(
        &self,
        block: &mut Vec<&str>,
        has_date: bool,
        layout: &ColumnLayout,
        dates: &DateNormalizer,
        entries: &mut Vec<ChainEntry>,
    ) {
        if has_date && let Some(entry) = self.parse_block(block, layout, dates) {
            entries.push(entry);
        }
        block.clear();
    }

    fn parse_block(
        &self,
        block: &[&str],
        layout: &ColumnLayout,
        dates: &DateNormalizer,
    ) -> Option<ChainEntry> {
        let joined = |field: Field| -> String {
            block
                .iter()
                .map(|line| layout.slice(line, field).trim())
                .filter(|part| !part.is_empty())
                .collect::<Vec<&str>>()
                .join(" ")
        };
        let first_capture = |pattern: &Regex, field: Field| -> Option<String> {
            block.iter().find_map(|line| {
                pattern
                    .captures(layout.slice(line, field))
                    .and_then(|captures| captures.get(1))
                    .map(|value| value.as_str().to_string())
            })
        };

        let grantor = joined(Field::Grantor);
        let grantee = joined(Field::Grantee);
        let instrument = joined(Field::Instrument);
        let date_string = first_capture(&self.date_prefix, Field::Date)?;
        let book_page = first_capture(&self.book_page_prefix, Field::Recording)?;

        if grantor.is_empty() && grantee.is_empty() {
            return None;
        }

        let mut entry = build_entry(dates, &date_string, &grantor, &grantee, &instrument, &book_page)?;
        entry.line = Some(
            block
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<&str>>()
                .join(" "),
        );
        Some(entry)
    }
}

fn char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

fn char_slice(line: &str, start: usize, end: Option<usize>) -> &str {
    let byte_at = |chars: usize| -> usize {
        line.char_indices()
            .nth(chars)
            .map(|(byte, _)| byte)
            .unwrap_or(line.len())
    };

    let begin = byte_at(start);
    let finish = end.map(byte_at).unwrap_or(line.len());
    if finish <= begin {
        return "";
    }
    &line[begin..finish]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(date: &str, grantor: &str, grantee: &str, instrument: &str, book_page: &str) -> String {
        format!("{date:<12}{grantor:<24}{grantee:<24}{instrument:<18}{book_page}")
    }

    fn layout_text() -> String {
        [
            "CHAIN OF TITLE".to_string(),
            row("FILED", "GRANTOR", "GRANTEE", "INSTRUMENT", "BOOK-PAGE"),
            row("10/17/2024", "SOUTH CHERRY TREE", "LEGACY NEW HOMES,", "WARRANTY DEED", "1024-18978"),
            row("", "DEVELOPMENT, INC", "LLC", "", ""),
            row("11/18/2021", "SHORT CREEK", "SOUTH CHERRY TREE", "WARRANTY DEED", "979-60"),
            row("", "INVESTMENTS, LLC", "DEVELOPMENT, INC", "", ""),
            row("5/15/2023", "JOHN DOE", "FIRST BANK", "DEED OF TRUST", "800-123"),
            "*** END OF CHAIN ***".to_string(),
            row("01/01/1999", "AFTER", "MARKER", "WARRANTY DEED", "1-1"),
        ]
        .join("\n")
    }

    fn parse(text: &str) -> Vec<ChainEntry> {
        let dates = DateNormalizer::new().expect("regexes compile");
        ColumnLayoutParser::new()
            .expect("regexes compile")
            .parse(text, &dates)
    }

    #[test]
    fn rebuilds_wrapped_rows_from_column_offsets() {
        let entries = parse(&layout_text());
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 10, 17).expect("date"));
        assert_eq!(entries[0].grantor, "SOUTH CHERRY TREE DEVELOPMENT, INC");
        assert_eq!(entries[0].grantee, "LEGACY NEW HOMES, LLC");
        assert_eq!(entries[0].instrument, "WARRANTY DEED");
        assert_eq!(entries[0].book_page, "1024-18978");
        assert!(entries[0].is_vesting);

        assert_eq!(entries[1].grantor, "SHORT CREEK INVESTMENTS, LLC");
        assert_eq!(entries[1].grantee, "SOUTH CHERRY TREE DEVELOPMENT, INC");

        assert_eq!(entries[2].date_string, "5/15/2023");
        assert_eq!(entries[2].instrument, "DEED OF TRUST");
        assert!(!entries[2].is_vesting);
    }

    #[test]
    fn stops_at_end_marker() {
        let entries = parse(&layout_text());
        assert!(entries.iter().all(|entry| entry.book_page != "1-1"));
    }

    #[test]
    fn date_column_need_not_be_first() {
        let header = format!(
            "{:<16}{:<16}{:<16}{:<12}{}",
            "GRANTOR", "GRANTEE", "INSTRUMENT", "DATED", "RECORDING"
        );
        let line = format!(
            "{:<16}{:<16}{:<16}{:<12}{}",
            "ACME LLC", "JANE ROE", "QUITCLAIM DEED", "03/02/2022", "912-44"
        );
        let second = format!(
            "{:<16}{:<16}{:<16}{:<12}{}",
            "JANE ROE", "BOB POE", "WARRANTY DEED", "04/05/2023", "950-1"
        );

        let entries = parse(&[header, line, second].join("\n"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].grantor, "ACME LLC");
        assert_eq!(entries[0].instrument, "QUITCLAIM DEED");
        assert_eq!(entries[0].book_page, "912-44");
        assert_eq!(entries[1].grantee, "BOB POE");
    }

    #[test]
    fn no_header_yields_nothing() {
        assert!(parse("10/17/2024 SOUTH LEGACY WARRANTY DEED 1024-18978").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn char_slice_respects_multibyte_text() {
        assert_eq!(char_slice("ÉTÉ ABC", 4, None), "ABC");
        assert_eq!(char_slice("ÉTÉ ABC", 0, Some(3)), "ÉTÉ");
        assert_eq!(char_slice("short", 10, Some(20)), "");
    }
}
