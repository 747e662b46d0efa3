use crate::id_generator::IDGenerator;
use serde::{Deserialize, Serialize};

/// Root of the structured markup tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Block-level node. The id is unique within a document and never written
/// to either flat encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(flatten)]
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph {
        inlines: Vec<Inline>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<Alignment>,
    },

    Heading {
        level: u8,
        inlines: Vec<Inline>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<Alignment>,
    },

    BlockQuote { blocks: Vec<Block> },

    List {
        ordered: bool,
        /// First number of an ordered list, `None` for bullets
        start: Option<u64>,
        items: Vec<ListItem>,
    },

    CodeBlock {
        language: Option<String>,
        code: String,
    },

    HorizontalRule,

    Table { rows: Vec<TableRow> },

    Callout {
        variant: CalloutVariant,
        blocks: Vec<Block>,
    },

    /// Side-by-side layout, one block list per column
    Columns { columns: Vec<Vec<Block>> },

    Collapsible {
        summary: Vec<Inline>,
        open: bool,
        blocks: Vec<Block>,
    },

    Media { media: Media },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<Vec<Inline>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalloutVariant {
    Info,
    Warning,
    Success,
    Error,
}

impl CalloutVariant {
    pub const ALL: [CalloutVariant; 4] = [
        CalloutVariant::Info,
        CalloutVariant::Warning,
        CalloutVariant::Success,
        CalloutVariant::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalloutVariant::Info => "info",
            CalloutVariant::Warning => "warning",
            CalloutVariant::Success => "success",
            CalloutVariant::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Media {
    Image { src: String, alt: String },
    Video { provider: VideoProvider, video_id: String },
    File { href: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoProvider {
    YouTube,
    Vimeo,
}

impl VideoProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoProvider::YouTube => "youtube",
            VideoProvider::Vimeo => "vimeo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "youtube" => Some(VideoProvider::YouTube),
            "vimeo" => Some(VideoProvider::Vimeo),
            _ => None,
        }
    }

    pub fn embed_url(&self, video_id: &str) -> String {
        match self {
            VideoProvider::YouTube => format!("https://www.youtube.com/embed/{}", video_id),
            VideoProvider::Vimeo => format!("https://player.vimeo.com/video/{}", video_id),
        }
    }
}

/// Inline formatting flags carried by a text run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text {
        text: String,
        #[serde(default)]
        marks: Marks,
    },

    Code { code: String },

    Link { href: String, children: Vec<Inline> },

    /// Comment anchor span
    Anchor {
        id: String,
        resolved: bool,
        children: Vec<Inline>,
    },

    Image { src: String, alt: String },

    LineBreak,
}

/// Placeholder char an inline image occupies in leaf text
pub const OBJECT_CHAR: char = '\u{FFFC}';

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Inline::Text {
            text: text.into(),
            marks,
        }
    }

    /// Length in chars as seen by caret offsets
    pub fn char_len(&self) -> usize {
        match self {
            Inline::Text { text, .. } => text.chars().count(),
            Inline::Code { code } => code.chars().count(),
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                inlines_len(children)
            }
            Inline::Image { .. } | Inline::LineBreak => 1,
        }
    }

    pub fn children(&self) -> Option<&[Inline]> {
        match self {
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => Some(children),
            _ => None,
        }
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            Inline::Text { text, .. } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                for child in children {
                    child.write_plain(out);
                }
            }
            Inline::Image { .. } => out.push(OBJECT_CHAR),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

pub fn inlines_len(inlines: &[Inline]) -> usize {
    inlines.iter().map(Inline::char_len).sum()
}

/// Leaf text with one char per caret step
pub fn inlines_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        inline.write_plain(&mut out);
    }
    out
}

/// Merge adjacent runs with equal marks, drop empty runs and remove
/// links or anchors left without content.
pub fn normalize_inlines(inlines: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());

    for mut inline in inlines.drain(..) {
        if let Some(children) = inline.children_mut() {
            normalize_inlines(children);
            if children.is_empty() {
                continue;
            }
        }

        match (&mut inline, out.last_mut()) {
            (Inline::Text { text, .. }, _) if text.is_empty() => continue,
            (Inline::Code { code }, _) if code.is_empty() => continue,
            (
                Inline::Text { text, marks },
                Some(Inline::Text {
                    text: prev_text,
                    marks: prev_marks,
                }),
            ) if marks == prev_marks => {
                prev_text.push_str(text);
                continue;
            }
            (Inline::Code { code }, Some(Inline::Code { code: prev })) => {
                prev.push_str(code);
                continue;
            }
            _ => {}
        }

        out.push(inline);
    }

    *inlines = out;
}

/// Address of a text-bearing leaf: a paragraph, heading, code block or
/// collapsible summary by block id, or a table cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafRef {
    pub block: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<(usize, usize)>,
}

impl LeafRef {
    pub fn block(id: impl Into<String>) -> Self {
        Self {
            block: id.into(),
            cell: None,
        }
    }

    pub fn cell(id: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            block: id.into(),
            cell: Some((row, col)),
        }
    }
}

pub enum Leaf<'a> {
    Inlines(&'a [Inline]),
    Code(&'a str),
}

pub enum LeafMut<'a> {
    Inlines(&'a mut Vec<Inline>),
    Code(&'a mut String),
}

impl Leaf<'_> {
    pub fn char_len(&self) -> usize {
        match self {
            Leaf::Inlines(inlines) => inlines_len(inlines),
            Leaf::Code(code) => code.chars().count(),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Leaf::Inlines(inlines) => inlines_text(inlines),
            Leaf::Code(code) => code.to_string(),
        }
    }
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn paragraph(id: impl Into<String>, inlines: Vec<Inline>) -> Self {
        Self::new(
            id,
            BlockKind::Paragraph {
                inlines,
                align: None,
            },
        )
    }

    /// Nested block lists, in document order
    pub fn child_lists(&self) -> Vec<&Vec<Block>> {
        match &self.kind {
            BlockKind::BlockQuote { blocks }
            | BlockKind::Callout { blocks, .. }
            | BlockKind::Collapsible { blocks, .. } => vec![blocks],
            BlockKind::List { items, .. } => items.iter().map(|item| &item.blocks).collect(),
            BlockKind::Columns { columns } => columns.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Block>> {
        match &mut self.kind {
            BlockKind::BlockQuote { blocks }
            | BlockKind::Callout { blocks, .. }
            | BlockKind::Collapsible { blocks, .. } => vec![blocks],
            BlockKind::List { items, .. } => {
                items.iter_mut().map(|item| &mut item.blocks).collect()
            }
            BlockKind::Columns { columns } => columns.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    /// Inline content of paragraphs, headings and collapsible summaries
    pub fn inlines(&self) -> Option<&Vec<Inline>> {
        match &self.kind {
            BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
                Some(inlines)
            }
            BlockKind::Collapsible { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn inlines_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match &mut self.kind {
            BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
                Some(inlines)
            }
            BlockKind::Collapsible { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::Heading { .. } => "heading",
            BlockKind::BlockQuote { .. } => "blockquote",
            BlockKind::List { .. } => "list",
            BlockKind::CodeBlock { .. } => "codeBlock",
            BlockKind::HorizontalRule => "horizontalRule",
            BlockKind::Table { .. } => "table",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Columns { .. } => "columns",
            BlockKind::Collapsible { .. } => "collapsible",
            BlockKind::Media { .. } => "media",
        }
    }

    fn collect_leaves(&self, out: &mut Vec<LeafRef>) {
        match &self.kind {
            BlockKind::Paragraph { .. } | BlockKind::Heading { .. } | BlockKind::CodeBlock { .. } => {
                out.push(LeafRef::block(&self.id))
            }
            BlockKind::Collapsible { blocks, .. } => {
                out.push(LeafRef::block(&self.id));
                for block in blocks {
                    block.collect_leaves(out);
                }
            }
            BlockKind::Table { rows } => {
                for (r, row) in rows.iter().enumerate() {
                    for c in 0..row.cells.len() {
                        out.push(LeafRef::cell(&self.id, r, c));
                    }
                }
            }
            _ => {
                for list in self.child_lists() {
                    for block in list {
                        block.collect_leaves(out);
                    }
                }
            }
        }
    }

    fn clear_ids(&mut self) {
        self.id.clear();
        for list in self.child_lists_mut() {
            for block in list {
                block.clear_ids();
            }
        }
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// A document holding a single empty paragraph
    pub fn empty(ids: &mut IDGenerator) -> Self {
        Self {
            blocks: vec![Block::paragraph(ids.new_id(), Vec::new())],
        }
    }

    /// Never leave the tree without blocks
    pub fn ensure_not_empty(&mut self, ids: &mut IDGenerator) {
        if self.blocks.is_empty() {
            self.blocks.push(Block::paragraph(ids.new_id(), Vec::new()));
        }
    }

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        fn find<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
            for block in blocks {
                if block.id == id {
                    return Some(block);
                }
                for list in block.child_lists() {
                    if let Some(found) = find(list, id) {
                        return Some(found);
                    }
                }
            }
            None
        }

        find(&self.blocks, id)
    }

    pub fn find_block_mut(&mut self, id: &str) -> Option<&mut Block> {
        let (list, index) = self.locate_mut(id)?;
        list.get_mut(index)
    }

    /// Find the block list that holds `id`, and its index there
    pub fn locate_mut(&mut self, id: &str) -> Option<(&mut Vec<Block>, usize)> {
        fn locate<'a>(blocks: &'a mut Vec<Block>, id: &str) -> Option<(&'a mut Vec<Block>, usize)> {
            if let Some(index) = blocks.iter().position(|b| b.id == id) {
                return Some((blocks, index));
            }
            for block in blocks.iter_mut() {
                for list in block.child_lists_mut() {
                    if let Some(found) = locate(list, id) {
                        return Some(found);
                    }
                }
            }
            None
        }

        locate(&mut self.blocks, id)
    }

    /// Top-level index of the block containing `id` (itself or an ancestor)
    pub fn top_level_index(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| {
            block.id == id || {
                let mut found = false;
                for list in block.child_lists() {
                    if list.iter().any(|b| contains_block(b, id)) {
                        found = true;
                        break;
                    }
                }
                found
            }
        })
    }

    pub fn insert_after(&mut self, id: &str, new_blocks: Vec<Block>) -> bool {
        match self.locate_mut(id) {
            Some((list, index)) => {
                let at = index + 1;
                list.splice(at..at, new_blocks);
                true
            }
            None => false,
        }
    }

    pub fn replace_block(&mut self, id: &str, replacement: Vec<Block>) -> bool {
        match self.locate_mut(id) {
            Some((list, index)) => {
                list.splice(index..=index, replacement);
                true
            }
            None => false,
        }
    }

    pub fn remove_block(&mut self, id: &str) -> Option<Block> {
        let (list, index) = self.locate_mut(id)?;
        Some(list.remove(index))
    }

    /// Every text-bearing leaf, in document order
    pub fn leaves(&self) -> Vec<LeafRef> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.collect_leaves(&mut out);
        }
        out
    }

    pub fn leaf(&self, leaf: &LeafRef) -> Option<Leaf<'_>> {
        let block = self.find_block(&leaf.block)?;
        match (&block.kind, leaf.cell) {
            (BlockKind::Table { rows }, Some((r, c))) => rows
                .get(r)
                .and_then(|row| row.cells.get(c))
                .map(|cell| Leaf::Inlines(cell)),
            (BlockKind::CodeBlock { code, .. }, None) => Some(Leaf::Code(code)),
            (_, None) => block.inlines().map(|inlines| Leaf::Inlines(inlines)),
            _ => None,
        }
    }

    pub fn leaf_mut(&mut self, leaf: &LeafRef) -> Option<LeafMut<'_>> {
        let block = self.find_block_mut(&leaf.block)?;
        let is_code = matches!(block.kind, BlockKind::CodeBlock { .. });

        match leaf.cell {
            Some((r, c)) => match &mut block.kind {
                BlockKind::Table { rows } => rows
                    .get_mut(r)
                    .and_then(|row| row.cells.get_mut(c))
                    .map(LeafMut::Inlines),
                _ => None,
            },
            None if is_code => match &mut block.kind {
                BlockKind::CodeBlock { code, .. } => Some(LeafMut::Code(code)),
                _ => None,
            },
            None => block.inlines_mut().map(LeafMut::Inlines),
        }
    }

    /// Copy with every block id blanked, for structural comparison
    pub fn without_ids(&self) -> Document {
        let mut doc = self.clone();
        for block in &mut doc.blocks {
            block.clear_ids();
        }
        doc
    }

    /// Sequence of block type names, depth first
    pub fn outline(&self) -> Vec<&'static str> {
        fn walk(blocks: &[Block], out: &mut Vec<&'static str>) {
            for block in blocks {
                out.push(block.type_name());
                for list in block.child_lists() {
                    walk(list, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }
}

fn contains_block(block: &Block, id: &str) -> bool {
    block.id == id
        || block
            .child_lists()
            .into_iter()
            .any(|list| list.iter().any(|b| contains_block(b, id)))
}
