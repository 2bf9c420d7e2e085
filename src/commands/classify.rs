use std::io::{self, Write};

use anyhow::{Result, bail};
use tracing::info;

use super::write_json_stdout;
use crate::chain::pages::PageClassifier;
use crate::cli::ClassifyArgs;
use crate::source::{self, SourceKind};

pub fn run(args: ClassifyArgs) -> Result<()> {
    let Some(kind) = SourceKind::from_path(&args.document) else {
        bail!(
            "Unsupported file type: {}",
            source::extension_label(&args.document)
        );
    };

    let pages = source::extract_pages(&args.document, kind, &args.poppler.tools())?;
    let split = PageClassifier::new()?.split(&pages);
    info!(
        path = %args.document.display(),
        pages = pages.len(),
        chain_pages = split.chain_pages.len(),
        tax_pages = split.tax_pages.len(),
        "classified document"
    );

    if args.json {
        return write_json_stdout(&split.classifications);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for page in &split.classifications {
        writeln!(
            output,
            "page {}\t{}\tchain={}\ttax={}",
            page.page,
            page.kind.as_str(),
            page.chain_score,
            page.tax_score
        )?;
    }
    writeln!(output, "{}", split.summary())?;
    output.flush()?;
    Ok(())
}
