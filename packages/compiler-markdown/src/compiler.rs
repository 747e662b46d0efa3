use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_parser::ast::*;

use crate::inline::{escape_line_starts, longest_run, write_inlines, LineMode};

/// Write a document as markdown. An empty document writes as an empty
/// string.
pub fn to_markdown(document: &Document) -> String {
    let body = write_blocks(&document.blocks, false);
    if body.is_empty() {
        body
    } else {
        format!("{}\n", body)
    }
}

fn write_blocks(blocks: &[Block], tight: bool) -> String {
    let mut out = String::new();
    let mut prev: Option<&Block> = None;
    let mut alternate = false;

    for block in blocks {
        // adjacent lists of the same kind would merge into one
        alternate = match (&block.kind, prev.map(|b| &b.kind)) {
            (
                BlockKind::List { ordered, .. },
                Some(BlockKind::List {
                    ordered: prev_ordered,
                    ..
                }),
            ) if ordered == prev_ordered => !alternate,
            _ => false,
        };

        let text = write_block(block, alternate);
        if text.is_empty() {
            continue;
        }

        if let Some(prev) = prev {
            let join_tight = tight
                && matches!(prev.kind, BlockKind::Paragraph { align: None, .. })
                && can_interrupt_paragraph(block);
            out.push_str(if join_tight { "\n" } else { "\n\n" });
        }
        out.push_str(&text);
        prev = Some(block);
    }

    out
}

fn can_interrupt_paragraph(block: &Block) -> bool {
    match &block.kind {
        BlockKind::List {
            ordered, start, items, ..
        } => {
            let first_has_content = items
                .first()
                .map_or(false, |item| !write_blocks(&item.blocks, true).is_empty());
            first_has_content && (!ordered || start.unwrap_or(1) == 1)
        }
        _ => false,
    }
}

fn write_block(block: &Block, alternate: bool) -> String {
    match &block.kind {
        BlockKind::Paragraph {
            inlines,
            align: None,
        } => escape_line_starts(&write_inlines(inlines, LineMode::Multi)),

        BlockKind::Heading {
            level,
            inlines,
            align: None,
        } => {
            let hashes = "#".repeat((*level).clamp(1, 6) as usize);
            let text = write_inlines(inlines, LineMode::Single);
            if text.is_empty() {
                hashes
            } else {
                format!("{} {}", hashes, protect_closing_hashes(&text))
            }
        }

        BlockKind::BlockQuote { blocks } => prefix_lines(&write_blocks(blocks, false)),

        BlockKind::Callout { variant, blocks } => {
            let label = match variant {
                CalloutVariant::Info => "NOTE",
                CalloutVariant::Success => "TIP",
                CalloutVariant::Warning => "WARNING",
                CalloutVariant::Error => "CAUTION",
            };
            let body = write_blocks(blocks, false);
            if body.is_empty() {
                format!("> [!{}]", label)
            } else {
                format!("> [!{}]\n{}", label, prefix_lines(&body))
            }
        }

        BlockKind::List {
            ordered,
            start,
            items,
        } => write_list(*ordered, *start, items, alternate),

        BlockKind::CodeBlock { language, code } => {
            let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
            let info = language.as_deref().unwrap_or("");
            if code.is_empty() {
                format!("{}{}\n{}", fence, info, fence)
            } else {
                format!("{}{}\n{}\n{}", fence, info, code, fence)
            }
        }

        BlockKind::HorizontalRule => "---".to_string(),

        BlockKind::Table { rows } => match gfm_table(rows) {
            Some(table) => table,
            None => html_block(block),
        },

        BlockKind::Media {
            media: Media::Image { src, alt },
        } => write_inlines(
            &[Inline::Image {
                src: src.clone(),
                alt: alt.clone(),
            }],
            LineMode::Multi,
        ),

        // no markdown syntax: written as flat markup the reader lowers back
        BlockKind::Paragraph { .. }
        | BlockKind::Heading { .. }
        | BlockKind::Columns { .. }
        | BlockKind::Collapsible { .. }
        | BlockKind::Media { .. } => html_block(block),
    }
}

/// Single-line HTML block; newlines inside code are kept as entities
fn html_block(block: &Block) -> String {
    let document = Document::new(vec![block.clone()]);
    to_flat_markup(&document, &CompileOptions::compact()).replace('\n', "&#10;")
}

fn prefix_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_list(ordered: bool, start: Option<u64>, items: &[ListItem], alternate: bool) -> String {
    let first = start.unwrap_or(1);
    let mut rendered = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let marker = match (ordered, alternate) {
            (true, false) => format!("{}. ", first + i as u64),
            (true, true) => format!("{}) ", first + i as u64),
            (false, false) => "- ".to_string(),
            (false, true) => "* ".to_string(),
        };

        let body = write_blocks(&item.blocks, true);
        if body.is_empty() {
            rendered.push(marker.trim_end().to_string());
            continue;
        }

        let indent = " ".repeat(marker.len());
        let mut text = String::new();
        for (n, line) in body.split('\n').enumerate() {
            if n == 0 {
                text.push_str(&marker);
                text.push_str(line);
            } else {
                text.push('\n');
                if !line.is_empty() {
                    text.push_str(&indent);
                    text.push_str(line);
                }
            }
        }
        rendered.push(text);
    }

    let loose = rendered.iter().any(|item| item.contains("\n\n"));
    rendered.join(if loose { "\n\n" } else { "\n" })
}

/// GFM pipe table, or `None` when the rows cannot be expressed as one
/// (no leading header row, a header row later on, ragged rows)
fn gfm_table(rows: &[TableRow]) -> Option<String> {
    let (head, body) = rows.split_first()?;
    let width = head.cells.len();

    if !head.header || width == 0 {
        return None;
    }
    if body.iter().any(|row| row.header || row.cells.len() != width) {
        return None;
    }

    let row_line = |row: &TableRow| {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| write_inlines(cell, LineMode::Cell))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = vec![row_line(head)];
    lines.push(format!("|{}", " --- |".repeat(width)));
    lines.extend(body.iter().map(row_line));

    Some(lines.join("\n"))
}

/// A heading ending in `#` would lose it to the closing sequence
fn protect_closing_hashes(text: &str) -> String {
    let trimmed = text.trim_end_matches('#');
    if trimmed.len() == text.len() {
        return text.to_string();
    }
    format!("{}\\{}", trimmed, &text[trimmed.len()..])
}
