use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::info;

use super::{
    load_report, refresh_chain_message, save_report, write_json_stdout, write_outcome_text,
};
use crate::chain::select::select_24_month_chain;
use crate::cli::SelectArgs;
use crate::model::ExtractionReport;

pub fn run(args: SelectArgs) -> Result<()> {
    let mut report = load_report(&args.report)?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let previous = reselect(&mut report, as_of);

    info!(
        path = %args.report.display(),
        %as_of,
        previous,
        kept = report.outcome.chain.kept.len(),
        "re-ran 24-month selection"
    );

    save_report(&mut report, &args.report, args.output.as_deref())?;

    if args.json {
        write_json_stdout(&report)
    } else {
        write_outcome_text(&report.outcome)
    }
}

/// Replaces `kept` with a fresh selection over `all`. Returns the previous
/// kept count.
fn reselect(report: &mut ExtractionReport, as_of: NaiveDate) -> usize {
    let previous = report.outcome.chain.kept.len();
    report.outcome.chain.kept = select_24_month_chain(&report.outcome.chain.all, Some(as_of));
    report.as_of = as_of;
    refresh_chain_message(&mut report.outcome);
    report
        .notes
        .push(format!("24-month chain re-selected as of {as_of}"));
    previous
}
