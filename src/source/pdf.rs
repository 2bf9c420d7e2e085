use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use super::{ExtractedPage, PageTable};

/// Fragments whose `top` differs by at most this much share a row.
const ROW_TOLERANCE: i64 = 3;
/// A horizontal gap wider than this starts a new cell.
const CELL_GAP: i64 = 12;
/// A line with at least this many cells defines the column grid.
const MIN_GRID_CELLS: usize = 2;

#[derive(Debug, Clone)]
pub struct PopplerTools {
    pub pdftotext: String,
    pub pdftohtml: String,
}

impl Default for PopplerTools {
    fn default() -> Self {
        Self {
            pdftotext: "pdftotext".to_string(),
            pdftohtml: "pdftohtml".to_string(),
        }
    }
}

pub fn extract_pdf_pages(pdf_path: &Path, tools: &PopplerTools) -> Result<Vec<ExtractedPage>> {
    let texts = extract_pages_with_pdftotext(pdf_path, tools)?;

    let tables = match extract_tables_with_pdftohtml(pdf_path, tools) {
        Ok(tables) => tables,
        Err(error) => {
            warn!(
                path = %pdf_path.display(),
                error = %error,
                "table layer unavailable, continuing with page text only"
            );
            Vec::new()
        }
    };

    let page_count = texts.len().max(tables.len());
    let pages = (0..page_count)
        .map(|index| ExtractedPage {
            number: index + 1,
            text: texts.get(index).cloned().unwrap_or_default(),
            tables: tables
                .get(index)
                .filter(|table| !table.is_empty())
                .map(|table| vec![table.clone()])
                .unwrap_or_default(),
        })
        .collect::<Vec<ExtractedPage>>();

    debug!(path = %pdf_path.display(), pages = pages.len(), "extracted pdf pages");
    Ok(pages)
}

fn extract_pages_with_pdftotext(pdf_path: &Path, tools: &PopplerTools) -> Result<Vec<String>> {
    let output = Command::new(&tools.pdftotext)
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_form_feed_pages(&String::from_utf8_lossy(&output.stdout)))
}

fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

fn extract_tables_with_pdftohtml(pdf_path: &Path, tools: &PopplerTools) -> Result<Vec<PageTable>> {
    let output = Command::new(&tools.pdftohtml)
        .arg("-xml")
        .arg("-i")
        .arg("-stdout")
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftohtml returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    parse_layout_xml(&String::from_utf8_lossy(&output.stdout))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextFragment {
    top: i64,
    left: i64,
    width: i64,
    text: String,
}

/// A run of fragments on one visual line, keyed by its left edge.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineCell {
    left: i64,
    text: String,
}

/// One row-segmented table per page, indexed by page number - 1.
pub(crate) fn parse_layout_xml(xml: &str) -> Result<Vec<PageTable>> {
    let mut reader = Reader::from_str(xml);
    let mut pages = Vec::<Vec<TextFragment>>::new();
    let mut current_page = None::<usize>;
    let mut open_fragment = None::<TextFragment>;

    loop {
        let event = reader.read_event().with_context(|| {
            format!(
                "failed to parse pdftohtml xml at byte {}",
                reader.buffer_position()
            )
        })?;

        match event {
            Event::Start(element) | Event::Empty(element) if element.name().as_ref() == b"page" => {
                current_page = numeric_attribute(&element, "number")?
                    .filter(|number| *number > 0)
                    .map(|number| number as usize - 1);
                if let Some(index) = current_page
                    && pages.len() <= index
                {
                    pages.resize_with(index + 1, Vec::new);
                }
            }
            Event::Start(element) if element.name().as_ref() == b"text" => {
                let top = numeric_attribute(&element, "top")?;
                let left = numeric_attribute(&element, "left")?;
                let width = numeric_attribute(&element, "width")?;
                open_fragment = match (top, left, width) {
                    (Some(top), Some(left), Some(width)) => Some(TextFragment {
                        top,
                        left,
                        width,
                        text: String::new(),
                    }),
                    _ => None,
                };
            }
            Event::Text(text) => {
                if let Some(fragment) = open_fragment.as_mut() {
                    let unescaped = text
                        .unescape()
                        .context("failed to unescape pdftohtml text fragment")?;
                    fragment.text.push_str(&unescaped.replace('\u{00a0}', " "));
                }
            }
            Event::End(element) if element.name().as_ref() == b"text" => {
                let Some(mut fragment) = open_fragment.take() else {
                    continue;
                };
                let Some(index) = current_page else {
                    continue;
                };
                let trimmed = fragment.text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                fragment.text = trimmed.to_string();
                pages[index].push(fragment);
            }
            Event::End(element) if element.name().as_ref() == b"page" => {
                current_page = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages.into_iter().map(rows_from_fragments).collect())
}

fn numeric_attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<i64>> {
    let Some(attribute) = element
        .try_get_attribute(name)
        .with_context(|| format!("malformed '{name}' attribute in pdftohtml xml"))?
    else {
        return Ok(None);
    };
    let value = attribute
        .unescape_value()
        .with_context(|| format!("failed to unescape '{name}' attribute in pdftohtml xml"))?;
    Ok(value.trim().parse::<i64>().ok())
}

fn rows_from_fragments(mut fragments: Vec<TextFragment>) -> PageTable {
    fragments.sort_by(|a, b| a.top.cmp(&b.top).then(a.left.cmp(&b.left)));

    let mut lines = Vec::<Vec<TextFragment>>::new();
    let mut line_top = None::<i64>;
    for fragment in fragments {
        match line_top {
            Some(top) if fragment.top - top <= ROW_TOLERANCE => {
                if let Some(line) = lines.last_mut() {
                    line.push(fragment);
                }
            }
            _ => {
                line_top = Some(fragment.top);
                lines.push(vec![fragment]);
            }
        }
    }

    // Lines with fewer cells than the last full-width line are placed under
    // its columns, so a wrapped second line keeps each piece in its column.
    let mut columns = Vec::<i64>::new();
    let mut table = PageTable::new();
    for line in lines {
        let cells = cells_from_line(line);
        if cells.len() >= MIN_GRID_CELLS && cells.len() >= columns.len() {
            columns = cells.iter().map(|cell| cell.left).collect();
            table.push(cells.into_iter().map(|cell| cell.text).collect());
        } else if columns.is_empty() {
            table.push(cells.into_iter().map(|cell| cell.text).collect());
        } else {
            table.push(align_to_columns(cells, &columns));
        }
    }
    table
}

fn cells_from_line(mut line: Vec<TextFragment>) -> Vec<LineCell> {
    line.sort_by_key(|fragment| fragment.left);

    let mut cells = Vec::<LineCell>::new();
    let mut previous_right = None::<i64>;
    for fragment in line {
        let starts_cell = previous_right
            .map(|right| fragment.left - right > CELL_GAP)
            .unwrap_or(true);
        previous_right = Some(fragment.left + fragment.width);
        match cells.last_mut() {
            Some(cell) if !starts_cell => {
                cell.text.push(' ');
                cell.text.push_str(&fragment.text);
            }
            _ => cells.push(LineCell {
                left: fragment.left,
                text: fragment.text,
            }),
        }
    }
    cells
}

fn align_to_columns(cells: Vec<LineCell>, columns: &[i64]) -> Vec<String> {
    let mut row = vec![String::new(); columns.len()];
    for cell in cells {
        let nearest = columns
            .iter()
            .enumerate()
            .min_by_key(|(_, left)| (cell.left - **left).abs())
            .map(|(index, _)| index)
            .unwrap_or(0);
        let slot = &mut row[nearest];
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&cell.text);
    }
    row
}
