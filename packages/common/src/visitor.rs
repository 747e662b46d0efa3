use inkpress_parser::ast::*;

/// Visitor pattern for traversing the structured tree immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_table_row(&mut self, row: &TableRow) {
        walk_table_row(self, row);
    }

    fn visit_media(&mut self, _media: &Media) {
        // Leaf node, no children to walk
    }

    fn visit_inline(&mut self, inline: &Inline) {
        walk_inline(self, inline);
    }
}

/// Mutable visitor pattern for transforming the tree
///
/// Similar to Visitor, but provides mutable access to nodes.
/// Use this when you need to modify the tree during traversal.
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_table_row_mut(&mut self, row: &mut TableRow) {
        walk_table_row_mut(self, row);
    }

    fn visit_media_mut(&mut self, _media: &mut Media) {
        // Leaf node, no children to walk
    }

    fn visit_inline_mut(&mut self, inline: &mut Inline) {
        walk_inline_mut(self, inline);
    }
}

// Default walk implementations for immutable visitor

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for block in &doc.blocks {
        visitor.visit_block(block);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    match &block.kind {
        BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
            for inline in inlines {
                visitor.visit_inline(inline);
            }
        }
        BlockKind::Collapsible {
            summary, blocks, ..
        } => {
            for inline in summary {
                visitor.visit_inline(inline);
            }
            for child in blocks {
                visitor.visit_block(child);
            }
        }
        BlockKind::BlockQuote { blocks } | BlockKind::Callout { blocks, .. } => {
            for child in blocks {
                visitor.visit_block(child);
            }
        }
        BlockKind::List { items, .. } => {
            for item in items {
                for child in &item.blocks {
                    visitor.visit_block(child);
                }
            }
        }
        BlockKind::Columns { columns } => {
            for column in columns {
                for child in column {
                    visitor.visit_block(child);
                }
            }
        }
        BlockKind::Table { rows } => {
            for row in rows {
                visitor.visit_table_row(row);
            }
        }
        BlockKind::Media { media } => visitor.visit_media(media),
        BlockKind::CodeBlock { .. } | BlockKind::HorizontalRule => {
            // No children to walk
        }
    }
}

pub fn walk_table_row<V: Visitor>(visitor: &mut V, row: &TableRow) {
    for cell in &row.cells {
        for inline in cell {
            visitor.visit_inline(inline);
        }
    }
}

pub fn walk_inline<V: Visitor>(visitor: &mut V, inline: &Inline) {
    if let Some(children) = inline.children() {
        for child in children {
            visitor.visit_inline(child);
        }
    }
}

// Default walk implementations for mutable visitor

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    for block in &mut doc.blocks {
        visitor.visit_block_mut(block);
    }
}

pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut Block) {
    match &mut block.kind {
        BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
            for inline in inlines {
                visitor.visit_inline_mut(inline);
            }
        }
        BlockKind::Collapsible {
            summary, blocks, ..
        } => {
            for inline in summary {
                visitor.visit_inline_mut(inline);
            }
            for child in blocks {
                visitor.visit_block_mut(child);
            }
        }
        BlockKind::BlockQuote { blocks } | BlockKind::Callout { blocks, .. } => {
            for child in blocks {
                visitor.visit_block_mut(child);
            }
        }
        BlockKind::List { items, .. } => {
            for item in items {
                for child in &mut item.blocks {
                    visitor.visit_block_mut(child);
                }
            }
        }
        BlockKind::Columns { columns } => {
            for column in columns {
                for child in column {
                    visitor.visit_block_mut(child);
                }
            }
        }
        BlockKind::Table { rows } => {
            for row in rows {
                visitor.visit_table_row_mut(row);
            }
        }
        BlockKind::Media { media } => visitor.visit_media_mut(media),
        BlockKind::CodeBlock { .. } | BlockKind::HorizontalRule => {
            // No children to walk
        }
    }
}

pub fn walk_table_row_mut<V: VisitorMut>(visitor: &mut V, row: &mut TableRow) {
    for cell in &mut row.cells {
        for inline in cell {
            visitor.visit_inline_mut(inline);
        }
    }
}

pub fn walk_inline_mut<V: VisitorMut>(visitor: &mut V, inline: &mut Inline) {
    if let Some(children) = inline.children_mut() {
        for child in children {
            visitor.visit_inline_mut(child);
        }
    }
}
