//! Typing primitives on the tree: insert at a caret, delete a selection,
//! backspace and block splitting. Each returns the caret to use next.

use inkpress_parser::ast::*;
use inkpress_parser::IDGenerator;

use crate::inline_ops::{delete_chars, delete_range, insert_str_at, insert_text, split_run};
use crate::selection::{Position, Selection};

/// Insert text at a caret. Newlines become line breaks in inline leaves.
pub fn insert_at(doc: &mut Document, at: &Position, text: &str) -> Option<Position> {
    let inserted = match doc.leaf_mut(&at.leaf)? {
        LeafMut::Inlines(inlines) => insert_text(inlines, at.offset, text),
        LeafMut::Code(code) => {
            insert_str_at(code, at.offset, text);
            text.chars().count()
        }
    };
    Some(Position::new(at.leaf.clone(), at.offset + inserted))
}

/// Remove the selected content. Block leaves fully inside the selection
/// are removed, and the first and last leaf are joined when both are
/// paragraphs or headings. Returns the collapsed caret.
pub fn delete_selection(doc: &mut Document, selection: &Selection) -> Option<Position> {
    let (start, _) = selection.ordered(doc)?;
    let ranges = selection.leaf_ranges(doc);

    for range in &ranges {
        match doc.leaf_mut(&range.leaf) {
            Some(LeafMut::Inlines(inlines)) => delete_range(inlines, range.start, range.end),
            Some(LeafMut::Code(code)) => delete_chars(code, range.start, range.end),
            None => {}
        }
    }

    if ranges.len() > 1 {
        let first = &ranges[0].leaf;
        let last = &ranges[ranges.len() - 1].leaf;

        for middle in &ranges[1..ranges.len() - 1] {
            if middle.leaf.cell.is_none() && !is_summary(doc, &middle.leaf.block) {
                doc.remove_block(&middle.leaf.block);
            }
        }

        if first.cell.is_none() && last.cell.is_none() {
            join_blocks(doc, &first.block, &last.block);
        }
        prune_empty(&mut doc.blocks);
    }

    Some(start)
}

/// Backspace at a caret. At the start of a paragraph or heading the block
/// is joined onto the previous one.
pub fn delete_backward(doc: &mut Document, at: &Position) -> Option<Position> {
    if at.offset > 0 {
        match doc.leaf_mut(&at.leaf)? {
            LeafMut::Inlines(inlines) => delete_range(inlines, at.offset - 1, at.offset),
            LeafMut::Code(code) => delete_chars(code, at.offset - 1, at.offset),
        }
        return Some(Position::new(at.leaf.clone(), at.offset - 1));
    }

    if at.leaf.cell.is_some() {
        return None;
    }

    let leaves = doc.leaves();
    let index = leaves.iter().position(|leaf| *leaf == at.leaf)?;
    let prev = leaves[..index]
        .iter()
        .rev()
        .find(|leaf| leaf.cell.is_none())?
        .clone();

    let prev_len = doc.leaf(&prev)?.char_len();
    if join_blocks(doc, &prev.block, &at.leaf.block) {
        prune_empty(&mut doc.blocks);
        Some(Position::new(prev, prev_len))
    } else {
        None
    }
}

/// Enter at a caret. Paragraphs and headings split in two; a split list
/// item paragraph starts a new item. Code blocks and table cells get a
/// newline instead.
pub fn split_block(doc: &mut Document, at: &Position, ids: &mut IDGenerator) -> Option<Position> {
    if at.leaf.cell.is_some() || matches!(doc.leaf(&at.leaf)?, Leaf::Code(_)) {
        return insert_at(doc, at, "\n");
    }

    let block = doc.find_block_mut(&at.leaf.block)?;
    let new_kind = match &mut block.kind {
        BlockKind::Paragraph { inlines, align } => {
            let (left, right) = split_run(inlines, at.offset);
            *inlines = left;
            BlockKind::Paragraph {
                inlines: right,
                align: *align,
            }
        }
        BlockKind::Heading {
            level,
            inlines,
            align,
        } => {
            let (left, right) = split_run(inlines, at.offset);
            *inlines = left;
            if right.is_empty() {
                BlockKind::Paragraph {
                    inlines: right,
                    align: None,
                }
            } else {
                BlockKind::Heading {
                    level: *level,
                    inlines: right,
                    align: *align,
                }
            }
        }
        _ => return None,
    };

    let new_block = Block::new(ids.new_id(), new_kind);
    let new_id = new_block.id.clone();

    if let Err(new_block) = insert_list_item_after(&mut doc.blocks, &at.leaf.block, new_block) {
        doc.insert_after(&at.leaf.block, vec![new_block]);
    }

    Some(Position::start_of(&new_id))
}

fn is_summary(doc: &Document, block_id: &str) -> bool {
    matches!(
        doc.find_block(block_id).map(|b| &b.kind),
        Some(BlockKind::Collapsible { .. })
    )
}

/// Append the inlines of `from` to `into` and remove `from`. Only
/// paragraphs and headings take part.
fn join_blocks(doc: &mut Document, into: &str, from: &str) -> bool {
    let joinable = |doc: &Document, id: &str| {
        matches!(
            doc.find_block(id).map(|b| &b.kind),
            Some(BlockKind::Paragraph { .. } | BlockKind::Heading { .. })
        )
    };
    if into == from || !joinable(doc, into) || !joinable(doc, from) {
        return false;
    }

    let Some(removed) = doc.remove_block(from) else {
        return false;
    };
    let tail = match removed.kind {
        BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => inlines,
        _ => Vec::new(),
    };

    if let Some(inlines) = doc.find_block_mut(into).and_then(Block::inlines_mut) {
        inlines.extend(tail);
        normalize_inlines(inlines);
    }
    true
}

/// Start a new list item after the item whose first block is `block_id`.
/// Hands the block back when `block_id` does not lead a list item.
fn insert_list_item_after(
    blocks: &mut Vec<Block>,
    block_id: &str,
    new_block: Block,
) -> Result<(), Block> {
    let mut new_block = new_block;
    for block in blocks.iter_mut() {
        if let BlockKind::List { items, .. } = &mut block.kind {
            if let Some(index) = items
                .iter()
                .position(|item| item.blocks.first().map_or(false, |b| b.id == block_id))
            {
                items.insert(
                    index + 1,
                    ListItem {
                        blocks: vec![new_block],
                    },
                );
                return Ok(());
            }
        }
        for list in block.child_lists_mut() {
            match insert_list_item_after(list, block_id, new_block) {
                Ok(()) => return Ok(()),
                Err(back) => new_block = back,
            }
        }
    }
    Err(new_block)
}

/// Remove containers a deletion left without content
pub fn prune_empty(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        if let BlockKind::List { items, .. } = &mut block.kind {
            for item in items.iter_mut() {
                prune_empty(&mut item.blocks);
            }
            items.retain(|item| !item.blocks.is_empty());
        } else {
            for list in block.child_lists_mut() {
                prune_empty(list);
            }
        }
    }

    blocks.retain(|block| match &block.kind {
        BlockKind::List { items, .. } => !items.is_empty(),
        BlockKind::BlockQuote { blocks } | BlockKind::Callout { blocks, .. } => !blocks.is_empty(),
        _ => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_parser::from_flat_markup;

    fn parse(source: &str, ids: &mut IDGenerator) -> Document {
        from_flat_markup(source, ids).document
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.leaves()
            .iter()
            .filter_map(|leaf| doc.leaf(leaf).map(|l| l.text()))
            .collect()
    }

    #[test]
    fn test_insert_in_code_block() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<pre><code>ab</code></pre>", &mut ids);
        let at = Position::start_of(&doc.blocks[0].id.clone());

        let caret = insert_at(&mut doc, &Position::new(at.leaf, 1), "\n").unwrap();
        assert_eq!(caret.offset, 2);
        assert_eq!(texts(&doc), vec!["a\nb"]);
    }

    #[test]
    fn test_delete_across_paragraphs_joins_them() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<p>one two</p><p>middle</p><h2>three four</h2>", &mut ids);
        let sel = Selection::range(
            Position::new(LeafRef::block(&doc.blocks[0].id), 3),
            Position::new(LeafRef::block(&doc.blocks[2].id), 5),
        );

        let caret = delete_selection(&mut doc, &sel).unwrap();
        assert_eq!(caret.offset, 3);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(texts(&doc), vec!["one four"]);
    }

    #[test]
    fn test_backspace_at_start_joins_previous() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<p>ab</p><ul><li>cd</li></ul>", &mut ids);
        let item = doc.leaves()[1].clone();

        let caret = delete_backward(&mut doc, &Position::new(item, 0)).unwrap();
        assert_eq!(caret.offset, 2);
        assert_eq!(doc.outline(), vec!["paragraph"]);
        assert_eq!(texts(&doc), vec!["abcd"]);
    }

    #[test]
    fn test_split_paragraph() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<p>hello world</p>", &mut ids);
        let leaf = doc.leaves()[0].clone();

        let caret = split_block(&mut doc, &Position::new(leaf, 5), &mut ids).unwrap();
        assert_eq!(texts(&doc), vec!["hello", " world"]);
        assert_eq!(caret.leaf.block, doc.blocks[1].id);
    }

    #[test]
    fn test_split_heading_at_end_gives_paragraph() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<h1>Title</h1>", &mut ids);
        let leaf = doc.leaves()[0].clone();

        split_block(&mut doc, &Position::new(leaf, 5), &mut ids).unwrap();
        assert_eq!(doc.outline(), vec!["heading", "paragraph"]);
    }

    #[test]
    fn test_split_list_item_starts_new_item() {
        let mut ids = IDGenerator::new("edit");
        let mut doc = parse("<ul><li>ab</li></ul>", &mut ids);
        let leaf = doc.leaves()[0].clone();

        split_block(&mut doc, &Position::new(leaf, 1), &mut ids).unwrap();
        match &doc.blocks[0].kind {
            BlockKind::List { items, .. } => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
        assert_eq!(texts(&doc), vec!["a", "b"]);
    }
}
