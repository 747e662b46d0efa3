use std::collections::HashSet;

use inkpress_parser::ast::*;

use crate::plain_text::inline_plain_text;
use crate::visitor::{
    walk_block_mut, walk_inline, walk_inline_mut, walk_table_row_mut, Visitor, VisitorMut,
};

/// A comment anchor found in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorInfo {
    pub id: String,
    pub resolved: bool,
    /// Text the anchor wraps
    pub text: String,
}

#[derive(Debug, Default)]
pub struct AnchorCollector {
    pub anchors: Vec<AnchorInfo>,
}

impl Visitor for AnchorCollector {
    fn visit_inline(&mut self, inline: &Inline) {
        if let Inline::Anchor {
            id,
            resolved,
            children,
        } = inline
        {
            self.anchors.push(AnchorInfo {
                id: id.clone(),
                resolved: *resolved,
                text: inline_plain_text(children),
            });
        }
        walk_inline(self, inline);
    }
}

/// Every anchor, in document order
pub fn collect_anchors(doc: &Document) -> Vec<AnchorInfo> {
    let mut collector = AnchorCollector::default();
    collector.visit_document(doc);
    collector.anchors
}

pub fn anchor_ids(doc: &Document) -> HashSet<String> {
    collect_anchors(doc).into_iter().map(|a| a.id).collect()
}

struct SetResolved<'a> {
    id: &'a str,
    resolved: bool,
    found: bool,
}

impl VisitorMut for SetResolved<'_> {
    fn visit_inline_mut(&mut self, inline: &mut Inline) {
        if let Inline::Anchor { id, resolved, .. } = inline {
            if id == self.id {
                *resolved = self.resolved;
                self.found = true;
            }
        }
        walk_inline_mut(self, inline);
    }
}

/// Set the resolved marker on an anchor. Returns false when no anchor
/// has that id.
pub fn set_anchor_resolved(doc: &mut Document, id: &str, resolved: bool) -> bool {
    let mut visitor = SetResolved {
        id,
        resolved,
        found: false,
    };
    visitor.visit_document_mut(doc);
    visitor.found
}

struct Unwrap<'a> {
    id: &'a str,
    found: bool,
}

impl Unwrap<'_> {
    fn unwrap_in(&mut self, inlines: &mut Vec<Inline>) {
        let mut hit = false;
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines.drain(..) {
            match inline {
                Inline::Anchor { id, children, .. } if id == self.id => {
                    hit = true;
                    out.extend(children);
                }
                other => out.push(other),
            }
        }
        *inlines = out;

        if hit {
            self.found = true;
            normalize_inlines(inlines);
        }
    }
}

impl VisitorMut for Unwrap<'_> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
        if let Some(inlines) = block.inlines_mut() {
            self.unwrap_in(inlines);
        }
    }

    fn visit_table_row_mut(&mut self, row: &mut TableRow) {
        walk_table_row_mut(self, row);
        for cell in &mut row.cells {
            self.unwrap_in(cell);
        }
    }

    fn visit_inline_mut(&mut self, inline: &mut Inline) {
        walk_inline_mut(self, inline);
        if let Some(children) = inline.children_mut() {
            self.unwrap_in(children);
        }
    }
}

/// Replace an anchor by its children, keeping the text. Returns false
/// when no anchor has that id.
pub fn unwrap_anchor(doc: &mut Document, id: &str) -> bool {
    let mut visitor = Unwrap { id, found: false };
    visitor.visit_document_mut(doc);
    visitor.found
}
