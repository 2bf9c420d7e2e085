use std::io::{Cursor, Read};
use std::mem;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use super::{ExtractedPage, PageTable};

/// Reads a DOCX package as one page: paragraph text plus every top-level
/// `w:tbl` as a table. Table rows are also appended to the text as
/// `|`-separated lines so text-only parsers still see them.
pub fn extract_docx_page(bytes: &[u8]) -> Result<ExtractedPage> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("failed to open DOCX archive")?;
    let mut document = archive
        .by_name("word/document.xml")
        .context("DOCX archive has no word/document.xml")?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .context("failed to read word/document.xml")?;

    let (lines, tables) = parse_document_xml(&xml)?;
    Ok(ExtractedPage {
        number: 1,
        text: lines.join("\n"),
        tables,
    })
}

fn parse_document_xml(xml: &str) -> Result<(Vec<String>, Vec<PageTable>)> {
    let mut reader = Reader::from_str(xml);

    let mut lines = Vec::<String>::new();
    let mut tables = Vec::<PageTable>::new();

    let mut table_depth = 0usize;
    let mut in_text_run = false;
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row = Vec::<String>::new();
    let mut table = PageTable::new();

    loop {
        let event = reader.read_event().with_context(|| {
            format!(
                "malformed document.xml near byte {}",
                reader.buffer_position()
            )
        })?;

        match event {
            Event::Start(element) => match element.name().as_ref() {
                b"w:tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table.clear();
                    }
                }
                b"w:tr" if table_depth == 1 => row.clear(),
                b"w:tc" if table_depth == 1 => cell.clear(),
                b"w:p" => paragraph.clear(),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                b"w:p" if table_depth == 0 => lines.push(String::new()),
                _ => {}
            },
            Event::Text(text) if in_text_run => {
                let value = text
                    .unescape()
                    .context("failed to decode text run in document.xml")?;
                paragraph.push_str(&value);
            }
            Event::End(element) => match element.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => {
                    let finished = mem::take(&mut paragraph);
                    if table_depth == 0 {
                        lines.push(finished);
                    } else {
                        if !cell.is_empty() {
                            cell.push('\n');
                        }
                        cell.push_str(&finished);
                    }
                }
                b"w:tc" if table_depth == 1 => row.push(mem::take(&mut cell)),
                b"w:tr" if table_depth == 1 => table.push(mem::take(&mut row)),
                b"w:tbl" => {
                    if table_depth == 1 {
                        let finished = mem::take(&mut table);
                        lines.extend(finished.iter().map(|cells| {
                            cells
                                .iter()
                                .map(|value| value.replace('\n', " "))
                                .collect::<Vec<String>>()
                                .join(" | ")
                        }));
                        tables.push(finished);
                    }
                    table_depth = table_depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((lines, tables))
}
