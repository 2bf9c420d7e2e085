use anyhow::Result;
use tracing::{info, warn};

use super::{REPORT_VERSION, write_json_stdout, write_outcome_text};
use crate::cli::ExtractArgs;
use crate::model::ExtractionReport;
use crate::pipeline::{ProcessOptions, process_document};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let options = ProcessOptions::new(args.as_of, args.tax_year, args.poppler.tools());
    info!(
        path = %args.document.display(),
        as_of = %options.as_of,
        tax_year = options.tax_year,
        "extraction requested"
    );

    let outcome = process_document(&args.document, &options);
    if !outcome.success {
        warn!(message = %outcome.message, "extraction found no chain");
    }

    let mut notes = Vec::new();
    let source_sha256 = match sha256_file(&args.document) {
        Ok(digest) => Some(digest),
        Err(err) => {
            notes.push(format!("source hash unavailable: {err:#}"));
            None
        }
    };

    let generated_at = now_utc_string();
    let report = ExtractionReport {
        report_version: REPORT_VERSION,
        updated_at: generated_at.clone(),
        generated_at,
        source_path: args.document.display().to_string(),
        source_sha256,
        as_of: options.as_of,
        outcome,
        notes,
    };

    if let Some(output) = &args.output {
        write_json_pretty(output, &report)?;
        info!(path = %output.display(), "wrote extraction report");
    }

    if args.json {
        write_json_stdout(&report)
    } else {
        write_outcome_text(&report.outcome)
    }
}
