use std::path::Path;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use tracing::{info, warn};

use crate::chain::ChainExtractor;
use crate::chain::pages::{PageClassifier, PageSplit};
use crate::chain::tax::TaxPageParser;
use crate::model::{ChainResult, ProcessOutcome, TaxSummary};
use crate::source::{self, ExtractedPage, PopplerTools, SourceKind};

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub as_of: NaiveDate,
    pub tax_year: i32,
    pub tools: PopplerTools,
}

impl ProcessOptions {
    /// `as_of` defaults to today; `tax_year` to the year before `as_of`.
    pub fn new(as_of: Option<NaiveDate>, tax_year: Option<i32>, tools: PopplerTools) -> Self {
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
        Self {
            as_of,
            tax_year: tax_year.unwrap_or(as_of.year() - 1),
            tools,
        }
    }
}

/// Reads the document at `path` and runs the whole extraction.
///
/// Never fails: unsupported input and extraction errors come back as an
/// unsuccessful outcome carrying the message.
pub fn process_document(path: &Path, options: &ProcessOptions) -> ProcessOutcome {
    match try_process_document(path, options) {
        Ok(outcome) => outcome,
        Err(error) => {
            let message = format!("Error: {error:#}");
            warn!(path = %path.display(), message = %message, "document processing failed");
            ProcessOutcome::failure(message)
        }
    }
}

fn try_process_document(path: &Path, options: &ProcessOptions) -> Result<ProcessOutcome> {
    let Some(kind) = SourceKind::from_path(path) else {
        return Ok(ProcessOutcome::failure(format!(
            "Unsupported file type: {}",
            source::extension_label(path)
        )));
    };

    let pages = source::extract_pages(path, kind, &options.tools)?;
    info!(path = %path.display(), pages = pages.len(), "extracted document");

    let pipeline = Pipeline::new()?;
    Ok(pipeline.process_pages(&pages, options))
}

#[derive(Debug)]
pub struct Pipeline {
    classifier: PageClassifier,
    extractor: ChainExtractor,
    tax: TaxPageParser,
}

impl Pipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: PageClassifier::new()?,
            extractor: ChainExtractor::new()?,
            tax: TaxPageParser::new()?,
        })
    }

    pub fn process_pages(&self, pages: &[ExtractedPage], options: &ProcessOptions) -> ProcessOutcome {
        if !pages.iter().any(ExtractedPage::has_content) {
            return ProcessOutcome::failure("No text extracted from document");
        }

        let split = self.classifier.split(pages);
        info!(
            chain_pages = ?split.chain_pages,
            tax_pages = ?split.tax_pages,
            "classified pages"
        );

        let chain_pages = if split.chain_pages.is_empty() {
            warn!("no chain pages identified, treating the whole document as the chain abstract");
            pages.iter().collect::<Vec<&ExtractedPage>>()
        } else {
            select_pages(pages, &split.chain_pages)
        };

        let tax = self.read_tax(pages, &split, options.tax_year);

        let tables = chain_pages
            .iter()
            .flat_map(|page| page.tables.iter().cloned())
            .collect::<Vec<_>>();
        let mut entries = self.extractor.extract_table_entries(&tables);
        if entries.is_empty() {
            let text = chain_pages
                .iter()
                .map(|page| page.text.as_str())
                .collect::<Vec<&str>>()
                .join("\n");
            entries = self.extractor.extract_text_entries(&text);
        }

        if entries.is_empty() {
            let mut outcome = ProcessOutcome::failure("No chain entries found");
            outcome.pages = split.classifications;
            outcome.tax = tax;
            return outcome;
        }

        let chain = ChainResult::from_entries(entries, Some(options.as_of));
        let mut message = format!("{}. {}", chain_summary(&chain), split.summary());
        if let Some(summary) = &tax {
            message.push_str(". ");
            message.push_str(&tax_message(summary));
        }

        info!(
            all = chain.all.len(),
            kept = chain.kept.len(),
            as_of = %options.as_of,
            "chain extraction finished"
        );

        ProcessOutcome {
            success: true,
            message,
            chain,
            pages: split.classifications,
            tax,
        }
    }

    fn read_tax(&self, pages: &[ExtractedPage], split: &PageSplit, tax_year: i32) -> Option<TaxSummary> {
        if split.tax_pages.is_empty() {
            return None;
        }

        let text = select_pages(pages, &split.tax_pages)
            .into_iter()
            .map(page_text_with_rows)
            .collect::<Vec<String>>()
            .join("\n");
        let summary = self.tax.parse(&text, tax_year);
        if summary.is_none() {
            warn!(tax_year, pages = ?split.tax_pages, "tax pages carry no row for the tax year");
        }
        summary
    }
}

fn select_pages<'a>(pages: &'a [ExtractedPage], numbers: &[usize]) -> Vec<&'a ExtractedPage> {
    pages
        .iter()
        .filter(|page| numbers.contains(&page.number))
        .collect()
}

/// Table rows as ` | `-joined lines ahead of the page text.
fn page_text_with_rows(page: &ExtractedPage) -> String {
    let mut lines = page
        .tables
        .iter()
        .flatten()
        .map(|row| row.join(" | "))
        .collect::<Vec<String>>();
    lines.push(page.text.clone());
    lines.join("\n")
}

/// Leading sentence of every successful outcome message.
pub(crate) fn chain_summary(chain: &ChainResult) -> String {
    format!(
        "Found {} total entries, {} vesting deeds in 24-month chain",
        chain.all.len(),
        chain.kept.len()
    )
}

fn tax_message(summary: &TaxSummary) -> String {
    format!(
        "tax {} total {} paid {}",
        summary.tax_year,
        summary.total_amount.as_deref().unwrap_or("unknown"),
        summary.date_paid.as_deref().unwrap_or("unknown")
    )
}

#[cfg(test)]
mod tests;
