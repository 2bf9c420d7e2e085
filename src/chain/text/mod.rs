//! Free-text fallback used when the abstract carries no usable table layer.
//!
//! Four parsers run in a fixed order over the same text and their results are
//! merged by entry key, so an earlier parser's reading of a record wins.

mod columns;
mod labels;
mod line_pattern;
mod linewise;
pub mod merge;

use anyhow::Result;
use tracing::debug;

use self::columns::ColumnLayoutParser;
use self::labels::LabelParser;
use self::line_pattern::LinePatternParser;
use self::linewise::LinewiseParser;
use self::merge::merge_candidates;
use super::dates::DateNormalizer;
use super::sort_newest_first;
use crate::model::ChainEntry;

#[derive(Debug)]
pub struct TextCascade {
    columns: ColumnLayoutParser,
    labels: LabelParser,
    line_pattern: LinePatternParser,
    linewise: LinewiseParser,
}

impl TextCascade {
    pub fn new() -> Result<Self> {
        Ok(Self {
            columns: ColumnLayoutParser::new()?,
            labels: LabelParser::new()?,
            line_pattern: LinePatternParser::new()?,
            linewise: LinewiseParser::new()?,
        })
    }

    pub fn extract(&self, text: &str, dates: &DateNormalizer) -> Vec<ChainEntry> {
        let text = normalize_lines(text);

        let column_entries = self.columns.parse(&text, dates);
        debug!(count = column_entries.len(), "column layout parser finished");
        let label_entries = self.labels.parse(&text, dates);
        debug!(count = label_entries.len(), "label parser finished");
        let line_entries = self.line_pattern.parse(&text, dates);
        debug!(count = line_entries.len(), "line pattern parser finished");
        let linewise_entries = self.linewise.parse(&text, dates);
        debug!(count = linewise_entries.len(), "line-wise parser finished");

        let mut merged = merge_candidates([
            column_entries,
            label_entries,
            line_entries,
            linewise_entries,
        ]);
        sort_newest_first(&mut merged);
        merged
    }
}

/// Separator rows (`*** ... ***`) close a layout table.
pub(crate) fn is_table_end(line: &str) -> bool {
    line.contains("***") || line.trim_start().starts_with('*')
}

fn normalize_lines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<&str>>()
        .join("\n")
}
