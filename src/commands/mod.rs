pub mod classify;
pub mod extract;
pub mod review;
pub mod select;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::model::{ChainEntry, ExtractionReport, ProcessOutcome};
use crate::pipeline::chain_summary;
use crate::util::{now_utc_string, read_json, write_json_pretty};

pub const REPORT_VERSION: u32 = 1;

pub(crate) fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn write_outcome_text(outcome: &ProcessOutcome) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "{}", outcome.message)?;
    if let Some(tax) = &outcome.tax {
        writeln!(
            output,
            "Tax {}: total={} paid={}",
            tax.tax_year,
            tax.total_amount.as_deref().unwrap_or("-"),
            tax.date_paid.as_deref().unwrap_or("-")
        )?;
    }

    write_entries(&mut output, "Kept (24-month chain)", outcome.chain.kept.iter())?;
    write_entries(&mut output, "Other entries", outcome.chain.other().into_iter())?;

    output.flush()?;
    Ok(())
}

/// Rewrites the chain counts that lead a successful outcome message.
pub(crate) fn refresh_chain_message(outcome: &mut ProcessOutcome) {
    if !outcome.success {
        return;
    }
    let summary = chain_summary(&outcome.chain);
    outcome.message = match outcome.message.split_once(". ") {
        Some((_, rest)) => format!("{summary}. {rest}"),
        None => summary,
    };
}

fn write_entries<'a, W, I>(output: &mut W, title: &str, entries: I) -> Result<()>
where
    W: Write,
    I: ExactSizeIterator<Item = &'a ChainEntry>,
{
    writeln!(output)?;
    writeln!(output, "{title}: {}", entries.len())?;
    for entry in entries {
        writeln!(
            output,
            "{}\t{}\t{}\t{}\t{}\tvesting={}",
            entry.date_string,
            entry.grantor,
            entry.grantee,
            entry.instrument,
            entry.book_page,
            entry.is_vesting
        )?;
        if let Some(remark) = &entry.remark {
            writeln!(output, "\tremark: {remark}")?;
        }
        writeln!(output, "\tkey: {}", entry.key())?;
    }
    Ok(())
}

pub(crate) fn load_report(path: &Path) -> Result<ExtractionReport> {
    let report: ExtractionReport = read_json(path)?;
    if report.report_version != REPORT_VERSION {
        bail!(
            "unsupported report version {} in {} (expected {})",
            report.report_version,
            path.display(),
            REPORT_VERSION
        );
    }
    Ok(report)
}

/// Stamps `updated_at` and writes the report to `output`, or back over `source`.
pub(crate) fn save_report(
    report: &mut ExtractionReport,
    source: &Path,
    output: Option<&Path>,
) -> Result<()> {
    report.updated_at = now_utc_string();
    write_json_pretty(output.unwrap_or(source), report)
}
