//! Caret and selection addressing over the tree's text leaves.
//!
//! Offsets count chars of a leaf's text; inline images and line breaks
//! occupy one char each.

use inkpress_parser::ast::{Document, LeafRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub leaf: LeafRef,
    pub offset: usize,
}

impl Position {
    pub fn new(leaf: LeafRef, offset: usize) -> Self {
        Self { leaf, offset }
    }

    /// Start of a block leaf
    pub fn start_of(block_id: &str) -> Self {
        Self::new(LeafRef::block(block_id), 0)
    }
}

/// Part of one leaf covered by a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRange {
    pub leaf: LeafRef,
    pub start: usize,
    pub end: usize,
}

impl LeafRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Anchor is where the selection started, head where it ends; a caret is
/// a collapsed selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            head: position,
        }
    }

    pub fn range(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Selection over `start..end` of a single leaf
    pub fn within(leaf: LeafRef, start: usize, end: usize) -> Self {
        Self::range(Position::new(leaf.clone(), start), Position::new(leaf, end))
    }

    /// Select the first occurrence of `needle` in any leaf
    pub fn find(doc: &Document, needle: &str) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        for leaf in doc.leaves() {
            let text = doc.leaf(&leaf)?.text();
            if let Some(byte) = text.find(needle) {
                let start = text[..byte].chars().count();
                let end = start + needle.chars().count();
                return Some(Self::within(leaf, start, end));
            }
        }
        None
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Start and end in document order, offsets clamped to their leaves.
    /// `None` when either end points at a leaf that no longer exists.
    pub fn ordered(&self, doc: &Document) -> Option<(Position, Position)> {
        let leaves = doc.leaves();
        let a = leaves.iter().position(|leaf| *leaf == self.anchor.leaf)?;
        let h = leaves.iter().position(|leaf| *leaf == self.head.leaf)?;

        let anchor = clamp(doc, &self.anchor)?;
        let head = clamp(doc, &self.head)?;

        if (a, anchor.offset) <= (h, head.offset) {
            Some((anchor, head))
        } else {
            Some((head, anchor))
        }
    }

    /// Per-leaf pieces of the selection, in document order
    pub fn leaf_ranges(&self, doc: &Document) -> Vec<LeafRange> {
        let Some((start, end)) = self.ordered(doc) else {
            return Vec::new();
        };

        if start.leaf == end.leaf {
            return vec![LeafRange {
                leaf: start.leaf,
                start: start.offset,
                end: end.offset,
            }];
        }

        let leaves = doc.leaves();
        let mut ranges = Vec::new();
        let mut inside = false;

        for leaf in leaves {
            let len = doc.leaf(&leaf).map_or(0, |l| l.char_len());
            if leaf == start.leaf {
                inside = true;
                ranges.push(LeafRange {
                    leaf,
                    start: start.offset,
                    end: len,
                });
            } else if leaf == end.leaf {
                ranges.push(LeafRange {
                    leaf,
                    start: 0,
                    end: end.offset,
                });
                break;
            } else if inside {
                ranges.push(LeafRange {
                    leaf,
                    start: 0,
                    end: len,
                });
            }
        }

        ranges
    }
}

fn clamp(doc: &Document, position: &Position) -> Option<Position> {
    let len = doc.leaf(&position.leaf)?.char_len();
    Some(Position::new(position.leaf.clone(), position.offset.min(len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_parser::{from_flat_markup, IDGenerator};

    fn doc() -> Document {
        let mut ids = IDGenerator::new("sel");
        from_flat_markup("<p>first line</p><p>second</p><p>third one</p>", &mut ids).document
    }

    #[test]
    fn test_find_counts_chars() {
        let d = doc();
        let sel = Selection::find(&d, "line").unwrap();
        assert_eq!(sel.anchor.offset, 6);
        assert_eq!(sel.head.offset, 10);
        assert_eq!(sel.anchor.leaf, LeafRef::block(&d.blocks[0].id));
    }

    #[test]
    fn test_backwards_selection_is_ordered() {
        let d = doc();
        let sel = Selection::range(
            Position::new(LeafRef::block(&d.blocks[2].id), 3),
            Position::new(LeafRef::block(&d.blocks[0].id), 6),
        );

        let ranges = sel.leaf_ranges(&d);
        assert_eq!(ranges.len(), 3);
        assert_eq!((ranges[0].start, ranges[0].end), (6, 10));
        assert_eq!((ranges[1].start, ranges[1].end), (0, 6));
        assert_eq!((ranges[2].start, ranges[2].end), (0, 3));
    }

    #[test]
    fn test_offsets_are_clamped() {
        let d = doc();
        let sel = Selection::within(LeafRef::block(&d.blocks[1].id), 2, 99);
        assert_eq!(sel.leaf_ranges(&d)[0].end, 6);
    }

    #[test]
    fn test_missing_leaf_gives_no_ranges() {
        let d = doc();
        let sel = Selection::caret(Position::start_of("nope"));
        assert!(sel.leaf_ranges(&d).is_empty());
    }
}
