use std::path::PathBuf;

use super::*;
use crate::model::PageKind;
use crate::source::PageTable;
use crate::source::pdf::parse_layout_xml;

fn options() -> ProcessOptions {
    ProcessOptions::new(
        NaiveDate::from_ymd_opt(2024, 12, 1),
        Some(2024),
        PopplerTools::default(),
    )
}

fn page(number: usize, text: &str, tables: Vec<PageTable>) -> ExtractedPage {
    ExtractedPage {
        number,
        text: text.to_string(),
        tables,
    }
}

fn table(rows: &[&[&str]]) -> PageTable {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn chain_table() -> PageTable {
    table(&[
        &["FILED", "GRANTOR", "GRANTEE", "INSTRUMENT", "BOOK-PAGE"],
        &[
            "10/17/2024",
            "SOUTH",
            "CHERRY TREE DEVELOPMENT, INC",
            "WARRANTY DEED",
            "1024-18978",
        ],
        &["05/15/2023", "JOHN DOE", "FIRST BANK", "DEED OF TRUST", "800-123"],
        &[
            "11/18/2021",
            "SHORT CREEK INVESTMENTS, LLC",
            "SOUTH CHERRY TREE DEVELOPMENT, INC",
            "WARRANTY DEED",
            "979-60",
        ],
    ])
}

fn process(pages: &[ExtractedPage]) -> ProcessOutcome {
    Pipeline::new()
        .expect("regexes compile")
        .process_pages(pages, &options())
}

#[test]
fn blank_document_reports_no_text() {
    let outcome = process(&[page(1, "  \n", Vec::new())]);
    assert!(!outcome.success);
    assert_eq!(outcome.message, "No text extracted from document");
    assert!(outcome.chain.all.is_empty());
    assert!(outcome.chain.kept.is_empty());

    assert_eq!(process(&[]).message, "No text extracted from document");
}

#[test]
fn table_pages_feed_the_selector_and_tax_pages_the_tax_reader() {
    let pages = vec![
        page(
            1,
            "CHAIN OF TITLE\nFILED GRANTOR GRANTEE INSTRUMENT BOOK-PAGE",
            vec![chain_table()],
        ),
        page(
            2,
            "TAX INFORMATION\n2024 | $3,177.00 | $149.74 | PAID 01/29/2025 | $321.91",
            Vec::new(),
        ),
    ];

    let outcome = process(&pages);
    assert!(outcome.success);
    assert_eq!(
        outcome.message,
        "Found 3 total entries, 2 vesting deeds in 24-month chain. \
         Found 1 chain page(s). Found 1 tax page(s). \
         tax 2024 total 321.91 paid 01/29/2025"
    );

    let kept = outcome
        .chain
        .kept
        .iter()
        .map(|entry| entry.book_page.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(kept, vec!["1024-18978", "979-60"]);
    assert_eq!(outcome.chain.all.len(), 3);
    assert_eq!(outcome.chain.all[1].instrument, "DEED OF TRUST");

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.pages[0].kind, PageKind::Chain);
    assert_eq!(outcome.pages[1].kind, PageKind::Tax);

    let tax = outcome.tax.expect("tax summary");
    assert_eq!(tax.total_amount.as_deref(), Some("321.91"));
    assert_eq!(tax.date_paid.as_deref(), Some("01/29/2025"));
}

const WRAPPED_LAYOUT_TEXT: &str = "\
CHAIN OF TITLE

GRANTOR:            GRANTEE:             INSTRUMENT       DATED:       RECORDING:
SOUTH CHERRY TREE   LEGACY NEW HOMES,    WARRANTY DEED    10/17/2024   1024-18978
DEVELOPMENT, INC    LLC
SHORT CREEK         SOUTH CHERRY TREE    WARRANTY DEED    11/18/2021   979-60
INVESTMENTS, LLC    DEVELOPMENT, INC
";

const WRAPPED_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pdf2xml producer="poppler" version="23.02.0">
<page number="1" position="absolute" top="0" left="0" height="1188" width="918">
<text top="100" left="40" width="90" height="12" font="0"><b>CHAIN OF TITLE</b></text>
<text top="130" left="40" width="60" height="12" font="0">GRANTOR:</text>
<text top="130" left="200" width="60" height="12" font="0">GRANTEE:</text>
<text top="130" left="380" width="70" height="12" font="0">INSTRUMENT</text>
<text top="130" left="520" width="50" height="12" font="0">DATED:</text>
<text top="130" left="620" width="80" height="12" font="0">RECORDING:</text>
<text top="150" left="40" width="120" height="12" font="1">SOUTH CHERRY TREE</text>
<text top="150" left="200" width="115" height="12" font="1">LEGACY NEW HOMES,</text>
<text top="150" left="380" width="95" height="12" font="1">WARRANTY DEED</text>
<text top="150" left="520" width="60" height="12" font="1">10/17/2024</text>
<text top="150" left="620" width="60" height="12" font="1">1024-18978</text>
<text top="163" left="40" width="110" height="12" font="1">DEVELOPMENT, INC</text>
<text top="163" left="200" width="20" height="12" font="1">LLC</text>
<text top="185" left="40" width="75" height="12" font="1">SHORT CREEK</text>
<text top="185" left="200" width="120" height="12" font="1">SOUTH CHERRY TREE</text>
<text top="185" left="380" width="95" height="12" font="1">WARRANTY DEED</text>
<text top="185" left="520" width="60" height="12" font="1">11/18/2021</text>
<text top="185" left="620" width="40" height="12" font="1">979-60</text>
<text top="198" left="40" width="105" height="12" font="1">INVESTMENTS, LLC</text>
<text top="198" left="200" width="110" height="12" font="1">DEVELOPMENT, INC</text>
</page>
</pdf2xml>
"#;

#[test]
fn wrapped_party_names_survive_the_pdf_table_layer() {
    let tables = parse_layout_xml(WRAPPED_LAYOUT_XML).expect("layout xml parses");
    let pages = vec![page(1, WRAPPED_LAYOUT_TEXT, tables)];

    let outcome = process(&pages);
    assert!(outcome.success);
    assert_eq!(
        outcome.message,
        "Found 2 total entries, 2 vesting deeds in 24-month chain. Found 1 chain page(s)"
    );

    let parties = outcome
        .chain
        .all
        .iter()
        .map(|entry| (entry.grantor.as_str(), entry.grantee.as_str()))
        .collect::<Vec<(&str, &str)>>();
    assert_eq!(
        parties,
        vec![
            ("SOUTH CHERRY TREE DEVELOPMENT, INC", "LEGACY NEW HOMES, LLC"),
            ("SHORT CREEK INVESTMENTS, LLC", "SOUTH CHERRY TREE DEVELOPMENT, INC"),
        ]
    );
    assert_eq!(outcome.chain.kept, outcome.chain.all);
}

#[test]
fn tax_page_tables_are_read_as_rows() {
    let pages = vec![
        page(1, "CHAIN OF TITLE\nFILED GRANTOR GRANTEE INSTRUMENT", vec![chain_table()]),
        page(
            2,
            "TAX INFORMATION\nMILLAGE RATE 12.5",
            vec![table(&[
                &["YEAR", "TAXES", "STATUS", "TOTAL"],
                &["2024", "$3,177.00", "PAID 01/29/2025", "$3,326.74"],
            ])],
        ),
    ];

    let tax = process(&pages).tax.expect("tax summary");
    assert_eq!(tax.total_amount.as_deref(), Some("3326.74"));
    assert_eq!(tax.date_paid.as_deref(), Some("01/29/2025"));
}

#[test]
fn unlabelled_document_falls_back_to_text_cascade_over_every_page() {
    let outcome = process(&[page(
        1,
        "10/17/2024 SOUTH LEGACY WARRANTY DEED 1024-18978 RE-RECORDED",
        Vec::new(),
    )]);

    assert!(outcome.success);
    assert_eq!(
        outcome.message,
        "Found 1 total entries, 1 vesting deeds in 24-month chain. \
         No chain or tax pages identified"
    );
    assert_eq!(outcome.chain.all.len(), 1);
    assert_eq!(outcome.chain.all[0].grantor, "SOUTH");
    assert_eq!(outcome.chain.all[0].remark.as_deref(), Some("RE-RECORDED"));
    assert_eq!(outcome.chain.kept, outcome.chain.all);
}

#[test]
fn headerless_tables_fall_through_to_page_text() {
    let pages = vec![page(
        1,
        "CHAIN OF TITLE\n11/18/2021 SHORT CREEK WARRANTY DEED 979-60",
        vec![table(&[&["Prepared by", "ABC Title"]])],
    )];

    let outcome = process(&pages);
    assert!(outcome.success);
    assert_eq!(outcome.chain.all.len(), 1);
    assert_eq!(outcome.chain.all[0].book_page, "979-60");
}

#[test]
fn chain_page_without_records_fails_with_page_votes_kept() {
    let outcome = process(&[page(1, "CHAIN OF TITLE\nNo instruments of record.", Vec::new())]);
    assert!(!outcome.success);
    assert_eq!(outcome.message, "No chain entries found");
    assert!(outcome.chain.all.is_empty());
    assert_eq!(outcome.pages.len(), 1);
}

#[test]
fn unsupported_extension_is_reported() {
    let outcome = process_document(&PathBuf::from("abstract.txt"), &options());
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Unsupported file type: .txt");
}

#[test]
fn unreadable_document_becomes_error_outcome() {
    let missing = std::env::temp_dir().join(format!(
        "titlechain-missing-{}.docx",
        std::process::id()
    ));

    let outcome = process_document(&missing, &options());
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Error: "), "{}", outcome.message);
}

#[test]
fn tax_year_defaults_to_the_year_before_as_of() {
    let defaulted = ProcessOptions::new(
        NaiveDate::from_ymd_opt(2024, 12, 1),
        None,
        PopplerTools::default(),
    );
    assert_eq!(defaulted.tax_year, 2023);

    let explicit = ProcessOptions::new(
        NaiveDate::from_ymd_opt(2025, 3, 1),
        Some(2024),
        PopplerTools::default(),
    );
    assert_eq!(explicit.tax_year, 2024);
}
