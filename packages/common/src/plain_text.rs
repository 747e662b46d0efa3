use inkpress_parser::ast::*;

use crate::visitor::{walk_block, Visitor};

/// Text of every block-level text container, markup stripped, in
/// document order. Paragraphs, headings, code blocks, collapsible
/// summaries and table cells each count as one container.
#[derive(Debug, Default)]
pub struct PlainTextCollector {
    pub containers: Vec<String>,
}

impl Visitor for PlainTextCollector {
    fn visit_block(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
                self.containers.push(inline_plain_text(inlines));
            }
            BlockKind::CodeBlock { code, .. } => self.containers.push(code.clone()),
            BlockKind::Collapsible { summary, .. } => {
                self.containers.push(inline_plain_text(summary));
                walk_block(self, block);
            }
            _ => walk_block(self, block),
        }
    }

    fn visit_table_row(&mut self, row: &TableRow) {
        for cell in &row.cells {
            self.containers.push(inline_plain_text(cell));
        }
    }
}

/// Inline content as readable text: images contribute nothing, line
/// breaks become newlines
pub fn inline_plain_text(inlines: &[Inline]) -> String {
    fn write(inlines: &[Inline], out: &mut String) {
        for inline in inlines {
            match inline {
                Inline::Text { text, .. } => out.push_str(text),
                Inline::Code { code } => out.push_str(code),
                Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                    write(children, out)
                }
                Inline::Image { .. } => {}
                Inline::LineBreak => out.push('\n'),
            }
        }
    }

    let mut out = String::new();
    write(inlines, &mut out);
    out
}

pub fn text_containers(doc: &Document) -> Vec<String> {
    let mut collector = PlainTextCollector::default();
    collector.visit_document(doc);
    collector.containers
}

/// Plain-text projection, one container per line
pub fn plain_text(doc: &Document) -> String {
    text_containers(doc).join("\n")
}
