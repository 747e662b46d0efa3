//! # Commands
//!
//! Discrete formatting and insertion operations on the structured tree.
//!
//! `Command` enumerates every operation once; `apply_command` is the single
//! handler table. The string API (`Command::from_name`) maps toolbar and
//! palette keys onto it.
//!
//! ## Categories
//!
//! - **Inline toggles** apply per leaf over the selection and need a
//!   non-empty one. A mark is removed when the whole range already has it,
//!   added otherwise.
//! - **Block transforms** act on the blocks the selection touches. Without
//!   a selection they insert a fresh block of that kind at the end.
//! - **Insertions** land after the caret's top-level block, or at the end
//!   of the document when there is no caret.

use std::sync::OnceLock;

use inkpress_common::inline_plain_text;
use inkpress_parser::ast::*;
use inkpress_parser::IDGenerator;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::editing::{delete_selection, insert_at};
use crate::inline_ops::{
    insert_text, map_leaves_in_range, range_all_code, range_all_text, unwrap_links_in_range,
    wrap_range,
};
use crate::selection::{LeafRange, Position, Selection};
use crate::EditorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "argument", rename_all = "camelCase")]
pub enum Command {
    Bold,
    Italic,
    Underline,
    Strike,
    InlineCode,
    /// `None` clears the color
    TextColor(Option<String>),
    BackgroundColor(Option<String>),
    /// An empty href removes links from the selection
    Link(String),

    Heading(u8),
    Paragraph,
    BlockQuote,
    BulletList,
    OrderedList,
    CodeBlock,
    HorizontalRule,
    Table { rows: usize, cols: usize },
    Columns,
    Callout(CalloutVariant),
    Collapsible,

    Image { src: String, alt: String },
    /// Video page URL; the provider and id are read from it
    Video(String),
    File { href: String, name: String },

    Align(Alignment),
    Insert(String),
    Undo,
    Redo,
}

const MAX_TABLE_SIZE: usize = 50;

fn required<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str, EditorError> {
    match arg.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(EditorError::invalid_argument(name, "argument required")),
    }
}

fn color_arg(arg: Option<&str>) -> Option<String> {
    arg.map(str::trim)
        .filter(|value| !value.is_empty() && *value != "none")
        .map(str::to_string)
}

impl Command {
    /// Build a command from its name and optional argument
    pub fn from_name(name: &str, arg: Option<&str>) -> Result<Self, EditorError> {
        let command = match name {
            "bold" => Command::Bold,
            "italic" => Command::Italic,
            "underline" => Command::Underline,
            "strike" | "strikethrough" | "strikeThrough" => Command::Strike,
            "code" | "inlineCode" => Command::InlineCode,
            "foreColor" | "textColor" => Command::TextColor(color_arg(arg)),
            "backColor" | "backgroundColor" | "hiliteColor" => {
                Command::BackgroundColor(color_arg(arg))
            }
            "link" | "createLink" => Command::Link(arg.unwrap_or_default().trim().to_string()),
            "unlink" => Command::Link(String::new()),

            "heading" => {
                let level = required(name, arg)?
                    .trim_start_matches(['h', 'H'])
                    .parse::<u8>()
                    .map_err(|_| EditorError::invalid_argument(name, "level must be 1-6"))?;
                Command::heading(level)?
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                Command::heading(name[1..].parse().unwrap_or(1))?
            }
            "paragraph" => Command::Paragraph,
            "blockquote" | "quote" => Command::BlockQuote,
            "bulletList" | "unorderedList" | "insertUnorderedList" => Command::BulletList,
            "orderedList" | "numberedList" | "insertOrderedList" => Command::OrderedList,
            "codeBlock" => Command::CodeBlock,
            "horizontalRule" | "divider" | "insertHorizontalRule" => Command::HorizontalRule,
            "table" => {
                let (rows, cols) = match arg {
                    Some(size) => parse_table_size(size)
                        .ok_or_else(|| EditorError::invalid_argument(name, "expected RxC"))?,
                    None => (3, 3),
                };
                Command::Table { rows, cols }
            }
            "columns" | "twoColumns" => Command::Columns,
            "callout" => {
                let variant = match arg {
                    Some(value) => CalloutVariant::parse(value).ok_or_else(|| {
                        EditorError::invalid_argument(name, "unknown callout variant")
                    })?,
                    None => CalloutVariant::Info,
                };
                Command::Callout(variant)
            }
            "calloutInfo" => Command::Callout(CalloutVariant::Info),
            "calloutWarning" => Command::Callout(CalloutVariant::Warning),
            "calloutSuccess" => Command::Callout(CalloutVariant::Success),
            "calloutError" => Command::Callout(CalloutVariant::Error),
            "collapsible" | "details" => Command::Collapsible,

            "image" | "insertImage" => Command::Image {
                src: required(name, arg)?.to_string(),
                alt: String::new(),
            },
            "video" => {
                let url = required(name, arg)?;
                if parse_video_url(url).is_none() {
                    return Err(EditorError::invalid_argument(name, "unsupported video URL"));
                }
                Command::Video(url.to_string())
            }
            "file" => {
                let href = required(name, arg)?;
                Command::File {
                    href: href.to_string(),
                    name: file_name(href),
                }
            }

            "align" => Command::Align(
                Alignment::parse(required(name, arg)?)
                    .ok_or_else(|| EditorError::invalid_argument(name, "unknown alignment"))?,
            ),
            "justifyLeft" | "alignLeft" => Command::Align(Alignment::Left),
            "justifyCenter" | "alignCenter" => Command::Align(Alignment::Center),
            "justifyRight" | "alignRight" => Command::Align(Alignment::Right),
            "justifyFull" | "alignJustify" => Command::Align(Alignment::Justify),

            "insert" | "insertText" => Command::Insert(arg.unwrap_or_default().to_string()),
            "undo" => Command::Undo,
            "redo" => Command::Redo,

            _ => return Err(EditorError::UnknownCommand(name.to_string())),
        };

        Ok(command)
    }

    fn heading(level: u8) -> Result<Self, EditorError> {
        if (1..=6).contains(&level) {
            Ok(Command::Heading(level))
        } else {
            Err(EditorError::invalid_argument("heading", "level must be 1-6"))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::Strike => "strike",
            Command::InlineCode => "inlineCode",
            Command::TextColor(_) => "textColor",
            Command::BackgroundColor(_) => "backgroundColor",
            Command::Link(_) => "link",
            Command::Heading(_) => "heading",
            Command::Paragraph => "paragraph",
            Command::BlockQuote => "blockquote",
            Command::BulletList => "bulletList",
            Command::OrderedList => "orderedList",
            Command::CodeBlock => "codeBlock",
            Command::HorizontalRule => "horizontalRule",
            Command::Table { .. } => "table",
            Command::Columns => "columns",
            Command::Callout(_) => "callout",
            Command::Collapsible => "collapsible",
            Command::Image { .. } => "image",
            Command::Video(_) => "video",
            Command::File { .. } => "file",
            Command::Align(_) => "align",
            Command::Insert(_) => "insert",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }

    /// Commands that only restyle existing text
    pub fn is_inline_toggle(&self) -> bool {
        matches!(
            self,
            Command::Bold
                | Command::Italic
                | Command::Underline
                | Command::Strike
                | Command::InlineCode
                | Command::TextColor(_)
                | Command::BackgroundColor(_)
                | Command::Link(_)
        )
    }
}

fn parse_table_size(value: &str) -> Option<(usize, usize)> {
    let (rows, cols) = value.trim().split_once(['x', 'X', '×'])?;
    let rows: usize = rows.trim().parse().ok()?;
    let cols: usize = cols.trim().parse().ok()?;
    let valid = 1..=MAX_TABLE_SIZE;
    (valid.contains(&rows) && valid.contains(&cols)).then_some((rows, cols))
}

fn file_name(href: &str) -> String {
    href.split(['?', '#'])
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or(href)
        .to_string()
}

fn video_patterns() -> &'static [(VideoProvider, Regex)] {
    static PATTERNS: OnceLock<Vec<(VideoProvider, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table = [
            (
                VideoProvider::YouTube,
                r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/)([A-Za-z0-9_-]{6,})",
            ),
            (
                VideoProvider::YouTube,
                r"^(?:https?://)?youtu\.be/([A-Za-z0-9_-]{6,})",
            ),
            (
                VideoProvider::Vimeo,
                r"^(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)",
            ),
        ];
        table
            .into_iter()
            .filter_map(|(provider, pattern)| Regex::new(pattern).ok().map(|re| (provider, re)))
            .collect()
    })
}

/// Provider and video id of a YouTube or Vimeo page URL
pub fn parse_video_url(url: &str) -> Option<(VideoProvider, String)> {
    let url = url.trim();
    video_patterns().iter().find_map(|(provider, re)| {
        re.captures(url)
            .and_then(|caps| caps.get(1))
            .map(|id| (*provider, id.as_str().to_string()))
    })
}

/// Apply a command to the tree. Returns the selection to use afterwards.
pub fn apply_command(
    doc: &mut Document,
    selection: Option<&Selection>,
    command: &Command,
    ids: &mut IDGenerator,
) -> Result<Option<Selection>, EditorError> {
    // a selection whose leaves are gone counts as no selection
    let selection = selection.filter(|sel| sel.ordered(doc).is_some());

    let next = match command {
        Command::Bold => toggle_mark(doc, selection, |m| m.bold, |m, on| m.bold = on)?,
        Command::Italic => toggle_mark(doc, selection, |m| m.italic, |m, on| m.italic = on)?,
        Command::Underline => {
            toggle_mark(doc, selection, |m| m.underline, |m, on| m.underline = on)?
        }
        Command::Strike => toggle_mark(doc, selection, |m| m.strike, |m, on| m.strike = on)?,
        Command::InlineCode => toggle_code(doc, selection)?,
        Command::TextColor(color) => set_marks(doc, selection, |m| m.color = color.clone())?,
        Command::BackgroundColor(color) => {
            set_marks(doc, selection, |m| m.background = color.clone())?
        }
        Command::Link(href) => set_link(doc, selection, href)?,

        Command::Heading(level) => {
            let level = (*level).clamp(1, 6);
            retype_blocks(doc, selection, ids, |kind| match kind {
                BlockKind::Paragraph { inlines, align } | BlockKind::Heading { inlines, align, .. } => {
                    BlockKind::Heading {
                        level,
                        inlines,
                        align,
                    }
                }
                BlockKind::CodeBlock { code, .. } => BlockKind::Heading {
                    level,
                    inlines: text_inlines(&code),
                    align: None,
                },
                other => other,
            })
        }
        Command::Paragraph => retype_blocks(doc, selection, ids, |kind| match kind {
            BlockKind::Heading { inlines, align, .. } => BlockKind::Paragraph { inlines, align },
            BlockKind::CodeBlock { code, .. } => BlockKind::Paragraph {
                inlines: text_inlines(&code),
                align: None,
            },
            other => other,
        }),
        Command::CodeBlock => retype_blocks(doc, selection, ids, |kind| match kind {
            BlockKind::Paragraph { inlines, .. } | BlockKind::Heading { inlines, .. } => {
                BlockKind::CodeBlock {
                    language: None,
                    code: inline_plain_text(&inlines),
                }
            }
            other => other,
        }),
        Command::BlockQuote => {
            wrap_blocks(doc, selection, ids, |blocks| BlockKind::BlockQuote { blocks })
        }
        Command::BulletList => wrap_blocks(doc, selection, ids, |blocks| list_of(false, blocks)),
        Command::OrderedList => wrap_blocks(doc, selection, ids, |blocks| list_of(true, blocks)),
        Command::Callout(variant) => {
            let variant = *variant;
            wrap_blocks(doc, selection, ids, |blocks| BlockKind::Callout { variant, blocks })
        }
        Command::Collapsible => wrap_blocks(doc, selection, ids, |blocks| BlockKind::Collapsible {
            summary: vec![Inline::text("Details")],
            open: true,
            blocks,
        }),

        Command::HorizontalRule => {
            let rule = Block::new(ids.new_id(), BlockKind::HorizontalRule);
            insert_blocks(doc, selection, vec![rule])
        }
        Command::Table { rows, cols } => {
            let table = new_table(ids, *rows, *cols);
            insert_blocks(doc, selection, vec![table])
        }
        Command::Columns => {
            let columns = vec![
                vec![Block::paragraph(ids.new_id(), Vec::new())],
                vec![Block::paragraph(ids.new_id(), Vec::new())],
            ];
            let block = Block::new(ids.new_id(), BlockKind::Columns { columns });
            insert_blocks(doc, selection, vec![block])
        }
        Command::Image { src, alt } => {
            let media = Media::Image {
                src: src.clone(),
                alt: alt.clone(),
            };
            insert_blocks(doc, selection, vec![Block::new(ids.new_id(), BlockKind::Media { media })])
        }
        Command::Video(url) => {
            let (provider, video_id) = parse_video_url(url)
                .ok_or_else(|| EditorError::invalid_argument("video", "unsupported video URL"))?;
            let media = Media::Video { provider, video_id };
            insert_blocks(doc, selection, vec![Block::new(ids.new_id(), BlockKind::Media { media })])
        }
        Command::File { href, name } => {
            let media = Media::File {
                href: href.clone(),
                name: name.clone(),
            };
            insert_blocks(doc, selection, vec![Block::new(ids.new_id(), BlockKind::Media { media })])
        }

        Command::Align(alignment) => {
            let value = match alignment {
                Alignment::Left => None,
                other => Some(*other),
            };
            let sel = selection.ok_or_else(|| EditorError::invalid_selection("nothing to align"))?;
            for id in touched_blocks(doc, sel) {
                if let Some(block) = doc.find_block_mut(&id) {
                    if let BlockKind::Paragraph { align, .. } | BlockKind::Heading { align, .. } =
                        &mut block.kind
                    {
                        *align = value;
                    }
                }
            }
            Some(sel.clone())
        }

        Command::Insert(text) => insert(doc, selection, text, ids),

        // history is restored by the session
        Command::Undo | Command::Redo => selection.cloned(),
    };

    doc.ensure_not_empty(ids);
    Ok(next)
}

fn text_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    insert_text(&mut inlines, 0, text);
    inlines
}

fn list_of(ordered: bool, blocks: Vec<Block>) -> BlockKind {
    BlockKind::List {
        ordered,
        start: ordered.then_some(1),
        items: blocks
            .into_iter()
            .map(|block| ListItem {
                blocks: vec![block],
            })
            .collect(),
    }
}

fn new_table(ids: &mut IDGenerator, rows: usize, cols: usize) -> Block {
    let rows = (0..rows)
        .map(|r| TableRow {
            header: r == 0,
            cells: vec![Vec::new(); cols],
        })
        .collect();
    Block::new(ids.new_id(), BlockKind::Table { rows })
}

/// Non-empty per-leaf ranges of the selection
fn inline_ranges(doc: &Document, selection: Option<&Selection>) -> Result<Vec<LeafRange>, EditorError> {
    let selection = selection.ok_or_else(|| EditorError::invalid_selection("no selection"))?;
    let ranges: Vec<LeafRange> = selection
        .leaf_ranges(doc)
        .into_iter()
        .filter(|range| !range.is_empty())
        .filter(|range| matches!(doc.leaf(&range.leaf), Some(Leaf::Inlines(_))))
        .collect();

    if ranges.is_empty() {
        Err(EditorError::invalid_selection("selection holds no formattable text"))
    } else {
        Ok(ranges)
    }
}

fn toggle_mark(
    doc: &mut Document,
    selection: Option<&Selection>,
    has: fn(&Marks) -> bool,
    set: fn(&mut Marks, bool),
) -> Result<Option<Selection>, EditorError> {
    let ranges = inline_ranges(doc, selection)?;

    let all = ranges.iter().all(|range| match doc.leaf(&range.leaf) {
        Some(Leaf::Inlines(inlines)) => range_all_text(inlines, range.start, range.end, &has),
        _ => true,
    });
    let on = !all;

    for range in &ranges {
        if let Some(LeafMut::Inlines(inlines)) = doc.leaf_mut(&range.leaf) {
            map_leaves_in_range(inlines, range.start, range.end, &mut |inline| match inline {
                Inline::Text { text, mut marks } => {
                    set(&mut marks, on);
                    Inline::Text { text, marks }
                }
                other => other,
            });
        }
    }

    Ok(selection.cloned())
}

fn set_marks(
    doc: &mut Document,
    selection: Option<&Selection>,
    change: impl Fn(&mut Marks),
) -> Result<Option<Selection>, EditorError> {
    let ranges = inline_ranges(doc, selection)?;

    for range in &ranges {
        if let Some(LeafMut::Inlines(inlines)) = doc.leaf_mut(&range.leaf) {
            map_leaves_in_range(inlines, range.start, range.end, &mut |inline| match inline {
                Inline::Text { text, mut marks } => {
                    change(&mut marks);
                    Inline::Text { text, marks }
                }
                other => other,
            });
        }
    }

    Ok(selection.cloned())
}

fn toggle_code(
    doc: &mut Document,
    selection: Option<&Selection>,
) -> Result<Option<Selection>, EditorError> {
    let ranges = inline_ranges(doc, selection)?;

    let all = ranges.iter().all(|range| match doc.leaf(&range.leaf) {
        Some(Leaf::Inlines(inlines)) => range_all_code(inlines, range.start, range.end),
        _ => true,
    });

    for range in &ranges {
        if let Some(LeafMut::Inlines(inlines)) = doc.leaf_mut(&range.leaf) {
            map_leaves_in_range(inlines, range.start, range.end, &mut |inline| {
                match (all, inline) {
                    (true, Inline::Code { code }) => Inline::text(code),
                    (false, Inline::Text { text, .. }) => Inline::Code { code: text },
                    (_, other) => other,
                }
            });
        }
    }

    Ok(selection.cloned())
}

fn set_link(
    doc: &mut Document,
    selection: Option<&Selection>,
    href: &str,
) -> Result<Option<Selection>, EditorError> {
    let ranges = inline_ranges(doc, selection)?;

    for range in &ranges {
        if let Some(LeafMut::Inlines(inlines)) = doc.leaf_mut(&range.leaf) {
            unwrap_links_in_range(inlines, range.start, range.end);
            if !href.is_empty() {
                let href = href.to_string();
                wrap_range(inlines, range.start, range.end, |children| Inline::Link {
                    href,
                    children,
                });
            }
        }
    }

    Ok(selection.cloned())
}

/// Block ids of the leaves a selection touches, table cells excluded
fn touched_blocks(doc: &Document, selection: &Selection) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for range in selection.leaf_ranges(doc) {
        if range.leaf.cell.is_none() && !ids.contains(&range.leaf.block) {
            ids.push(range.leaf.block);
        }
    }
    ids
}

fn empty_block(ids: &mut IDGenerator, make: impl FnOnce(Block) -> BlockKind) -> Block {
    let inner = Block::paragraph(ids.new_id(), Vec::new());
    Block::new(ids.new_id(), make(inner))
}

/// Change the kind of every touched block; without a selection append a
/// new empty block of the target kind
fn retype_blocks(
    doc: &mut Document,
    selection: Option<&Selection>,
    ids: &mut IDGenerator,
    retype: impl Fn(BlockKind) -> BlockKind,
) -> Option<Selection> {
    let Some(selection) = selection else {
        let block = Block::new(
            ids.new_id(),
            retype(BlockKind::Paragraph {
                inlines: Vec::new(),
                align: None,
            }),
        );
        let caret = Selection::caret(Position::start_of(&block.id));
        doc.blocks.push(block);
        return Some(caret);
    };

    for id in touched_blocks(doc, selection) {
        if let Some(block) = doc.find_block_mut(&id) {
            if matches!(block.kind, BlockKind::Collapsible { .. }) {
                continue;
            }
            let kind = std::mem::replace(&mut block.kind, BlockKind::HorizontalRule);
            block.kind = retype(kind);
        }
    }

    Some(selection.clone())
}

/// Wrap the touched blocks in a container. Blocks that are contiguous
/// siblings of the first touched one are wrapped together.
fn wrap_blocks(
    doc: &mut Document,
    selection: Option<&Selection>,
    ids: &mut IDGenerator,
    make: impl FnOnce(Vec<Block>) -> BlockKind,
) -> Option<Selection> {
    let Some(selection) = selection else {
        let block = empty_block(ids, |inner| make(vec![inner]));
        let caret = Document::new(vec![block.clone()])
            .leaves()
            .into_iter()
            .next()
            .map(|leaf| Selection::caret(Position::new(leaf, 0)));
        doc.blocks.push(block);
        return caret;
    };

    let touched = touched_blocks(doc, selection);
    let Some(first) = touched.first() else {
        return Some(selection.clone());
    };
    let wrapper_id = ids.new_id();

    if let Some((list, index)) = doc.locate_mut(first) {
        let mut end = index;
        while end + 1 < list.len() && touched.contains(&list[end + 1].id) {
            end += 1;
        }
        let taken: Vec<Block> = list.drain(index..=end).collect();
        list.insert(index, Block::new(wrapper_id, make(taken)));
    }

    Some(selection.clone())
}

fn is_empty_paragraph(block: &Block) -> bool {
    matches!(&block.kind, BlockKind::Paragraph { inlines, .. } if inlines.is_empty())
}

/// Insert blocks after the caret's top-level block, or at the end. An
/// empty paragraph under the caret is replaced when the new blocks hold
/// text leaves of their own.
fn insert_blocks(
    doc: &mut Document,
    selection: Option<&Selection>,
    blocks: Vec<Block>,
) -> Option<Selection> {
    let first_leaf = Document::new(blocks.clone()).leaves().into_iter().next();
    let caret_top = selection.and_then(|sel| doc.top_level_index(&sel.head.leaf.block));

    match caret_top {
        Some(index) => {
            let at = if first_leaf.is_some() && is_empty_paragraph(&doc.blocks[index]) {
                doc.blocks.remove(index);
                index
            } else {
                index + 1
            };
            let tail = doc.blocks.split_off(at);
            doc.blocks.extend(blocks);
            doc.blocks.extend(tail);
        }
        None => doc.blocks.extend(blocks),
    }

    first_leaf
        .map(|leaf| Selection::caret(Position::new(leaf, 0)))
        .or_else(|| selection.cloned())
}

fn insert(
    doc: &mut Document,
    selection: Option<&Selection>,
    text: &str,
    ids: &mut IDGenerator,
) -> Option<Selection> {
    let caret = match selection {
        Some(sel) if sel.is_collapsed() => sel.ordered(doc).map(|(start, _)| start),
        Some(sel) => delete_selection(doc, sel),
        None => None,
    };

    let caret = match caret {
        Some(caret) => caret,
        None => {
            let block = Block::paragraph(ids.new_id(), Vec::new());
            let caret = Position::start_of(&block.id);
            doc.blocks.push(block);
            caret
        }
    };

    insert_at(doc, &caret, text).map(Selection::caret)
}
