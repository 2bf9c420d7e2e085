use anyhow::{Result, bail};
use tracing::{info, warn};

use super::{
    load_report, refresh_chain_message, save_report, write_json_stdout, write_outcome_text,
};
use crate::cli::ReviewArgs;
use crate::model::{ChainResult, EntryKey};

pub fn run(args: ReviewArgs) -> Result<()> {
    if args.keep.is_empty() && args.drop.is_empty() {
        bail!("nothing to review: pass at least one --keep or --drop key");
    }

    let mut report = load_report(&args.report)?;
    let changes = apply_overrides(&mut report.outcome.chain, &args.keep, &args.drop);
    for change in &changes {
        report.notes.push(change.clone());
    }
    refresh_chain_message(&mut report.outcome);

    info!(
        path = %args.report.display(),
        changes = changes.len(),
        kept = report.outcome.chain.kept.len(),
        "applied manual review"
    );

    save_report(&mut report, &args.report, args.output.as_deref())?;

    if args.json {
        write_json_stdout(&report)
    } else {
        write_outcome_text(&report.outcome)
    }
}

/// Applies drops, then keeps. Returns one note per membership change.
fn apply_overrides(chain: &mut ChainResult, keep: &[EntryKey], drop: &[EntryKey]) -> Vec<String> {
    let mut changes = Vec::new();

    for key in drop {
        if chain.release(key) {
            changes.push(format!("manually dropped {key}"));
        } else {
            warn!(key = %key, "drop key is not in the kept list");
        }
    }
    for key in keep {
        if chain.keep(key) {
            changes.push(format!("manually kept {key}"));
        } else {
            warn!(key = %key, "keep key is unknown or already kept");
        }
    }

    changes
}
