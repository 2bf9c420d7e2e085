use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::model::TaxSummary;

/// Reads one tax year's total and paid date from tax-information page text.
#[derive(Debug)]
pub struct TaxPageParser {
    money: Regex,
    paid_date: Regex,
    any_date: Regex,
    cell_separator: Regex,
    total_after_label: Regex,
}

impl TaxPageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            money: Regex::new(r"\$?([\d,]+\.?\d*)").context("failed to compile money regex")?,
            paid_date: Regex::new(r"PAID\s+(\d{1,2}/\d{1,2}/\d{4})")
                .context("failed to compile paid date regex")?,
            any_date: Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})")
                .context("failed to compile tax date regex")?,
            cell_separator: Regex::new(r"[|\t]").context("failed to compile cell separator regex")?,
            total_after_label: Regex::new(r"(?:TOTAL|Total).*?\$?([\d,]+\.?\d*)")
                .context("failed to compile tax total regex")?,
        })
    }

    /// `None` when neither a total nor a paid date was found for `tax_year`.
    pub fn parse(&self, text: &str, tax_year: i32) -> Option<TaxSummary> {
        let year = tax_year.to_string();
        let lines = text.lines().collect::<Vec<&str>>();
        let mut total_amount = None;
        let mut date_paid = None;

        for (index, line) in lines.iter().enumerate() {
            if !line.contains(&year) {
                continue;
            }
            let clean = line.split_whitespace().collect::<Vec<&str>>().join(" ");

            if line.contains('|') || line.contains('\t') {
                if let Some(paid_cell) = self
                    .cell_separator
                    .split(line)
                    .find(|cell| cell.contains("PAID"))
                {
                    date_paid = self.first_capture(&self.paid_date, paid_cell);
                    total_amount = self.money_values(&clean).pop();
                }
            } else {
                date_paid = self.first_capture(&self.paid_date, &clean);
                total_amount = self
                    .money_values(&clean)
                    .into_iter()
                    .filter(|amount| looks_like_amount(amount))
                    .next_back();
            }

            if date_paid.is_none()
                && let Some(next) = lines.get(index + 1)
            {
                date_paid = self.first_capture(&self.any_date, next);
            }

            if total_amount.is_some() || date_paid.is_some() {
                debug!(tax_year, line = index, "tax row found");
                break;
            }
        }

        if total_amount.is_none() || date_paid.is_none() {
            let full_text = lines.join(" ");
            if let Some(start) = full_text.find(&year) {
                let after_year = &full_text[start + year.len()..];
                if total_amount.is_none() {
                    total_amount = self
                        .first_capture(&self.total_after_label, after_year)
                        .map(|amount| amount.replace(',', ""));
                }
                if date_paid.is_none() {
                    date_paid = self.first_capture(&self.paid_date, after_year);
                }
            }
        }

        if total_amount.is_none() && date_paid.is_none() {
            return None;
        }
        Some(TaxSummary {
            tax_year,
            total_amount,
            date_paid,
        })
    }

    /// Every money-shaped token on the line, commas removed.
    fn money_values(&self, line: &str) -> Vec<String> {
        self.money
            .captures_iter(line)
            .filter_map(|captures| captures.get(1))
            .map(|value| value.as_str().replace(',', ""))
            .filter(|value| value.chars().any(|c| c.is_ascii_digit()))
            .collect()
    }

    fn first_capture(&self, pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }
}

/// Bare four-digit integers read as years; single digits are noise.
fn looks_like_amount(amount: &str) -> bool {
    if amount.len() == 4 && !amount.contains('.') {
        return false;
    }
    amount.contains('.') || amount.len() >= 2
}
