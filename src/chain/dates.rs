use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Whole-string formats, tried in priority order. Month-first wins ambiguous
/// strings such as `03/04/2020`.
const STRICT_FORMATS: [&str; 4] = ["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    MonthDayYear,
    YearMonthDay,
}

#[derive(Debug)]
pub struct DateNormalizer {
    fallbacks: Vec<(Regex, FieldOrder)>,
}

impl DateNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fallbacks: vec![
                (
                    Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})")
                        .context("failed to compile slash date regex")?,
                    FieldOrder::MonthDayYear,
                ),
                (
                    Regex::new(r"(\d{1,2})-(\d{1,2})-(\d{4})")
                        .context("failed to compile dash date regex")?,
                    FieldOrder::MonthDayYear,
                ),
                (
                    Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})")
                        .context("failed to compile iso date regex")?,
                    FieldOrder::YearMonthDay,
                ),
            ],
        })
    }

    /// Returns `None` for empty, malformed or impossible dates.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        for format in STRICT_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Some(date);
            }
        }

        // Each fallback only considers its first match, like a plain search.
        for (pattern, order) in &self.fallbacks {
            let Some(captures) = pattern.captures(value) else {
                continue;
            };
            if let Some(date) = date_from_captures(&captures, *order) {
                return Some(date);
            }
        }

        None
    }
}

fn date_from_captures(captures: &Captures<'_>, order: FieldOrder) -> Option<NaiveDate> {
    let field = |index: usize| -> Option<u32> { captures.get(index)?.as_str().parse().ok() };

    let (year, month, day) = match order {
        FieldOrder::MonthDayYear => (field(3)?, field(1)?, field(2)?),
        FieldOrder::YearMonthDay => (field(1)?, field(2)?, field(3)?),
    };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}
