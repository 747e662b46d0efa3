//! Markdown reader
//!
//! pulldown-cmark events are folded into the document tree with an explicit
//! frame stack. Inline HTML the markdown writer emits (`<u>`, styled and
//! comment `<span>`s, `<br>`) is tokenized with the flat-markup lexer; raw
//! HTML blocks are lowered by the flat-markup reader.

use std::collections::HashSet;
use std::ops::Range;

use pulldown_cmark::{BlockQuoteKind, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::ast::{
    inlines_text, normalize_inlines, Block, BlockKind, CalloutVariant, Document, Inline, ListItem,
    Marks, TableRow,
};
use crate::error::{ConversionError, ParseOutput, SourceSpan};
use crate::id_generator::IDGenerator;
use crate::lexer::{decode_entities, lex, parse_tag, Token};
use crate::markup::{lower_fragment, paragraph_block, style_value, trim_end_inlines, QUIET_INLINE_TAGS};

pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_GFM
}

/// Parse markdown into a document. Never fails; the result holds at least
/// one block.
pub fn from_markdown(source: &str, ids: &mut IDGenerator) -> ParseOutput {
    let mut reader = Reader {
        ids,
        frames: vec![Frame::Container {
            kind: ContainerKind::Root,
            blocks: Vec::new(),
        }],
        strong: 0,
        emphasis: 0,
        strike: 0,
        html: Vec::new(),
        anchors: HashSet::new(),
        diagnostics: Vec::new(),
    };

    for (event, range) in Parser::new_ext(source, markdown_options()).into_offset_iter() {
        reader.event(event, range);
    }

    let blocks = reader.finish();
    let Reader {
        ids, diagnostics, ..
    } = reader;

    for diagnostic in &diagnostics {
        tracing::debug!("[Markdown] {}", diagnostic);
    }

    let mut document = Document::new(blocks);
    document.ensure_not_empty(ids);

    ParseOutput {
        document,
        diagnostics,
    }
}

enum ContainerKind {
    Root,
    Quote(Option<BlockQuoteKind>),
    Item,
}

enum InlineKind {
    Paragraph { implicit: bool },
    Heading(u8),
    Cell,
    Link(String),
    HtmlLink(String),
    Anchor { id: String, resolved: bool },
    ImageAlt(String),
}

enum Frame {
    Container {
        kind: ContainerKind,
        blocks: Vec<Block>,
    },
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Inlines {
        kind: InlineKind,
        inlines: Vec<Inline>,
    },
    Table {
        rows: Vec<TableRow>,
    },
    Row {
        header: bool,
        cells: Vec<Vec<Inline>>,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    Html {
        html: String,
        start: usize,
    },
}

/// An inline HTML element still open in the current text container
struct HtmlSpan {
    tag: String,
    overlay: Marks,
    /// Opened an anchor or link frame
    framed: bool,
}

struct Reader<'a> {
    ids: &'a mut IDGenerator,
    frames: Vec<Frame>,
    strong: usize,
    emphasis: usize,
    strike: usize,
    html: Vec<HtmlSpan>,
    anchors: HashSet<String>,
    diagnostics: Vec<ConversionError>,
}

impl Reader<'_> {
    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag),

            Event::Text(text) => match self.frames.last_mut() {
                Some(Frame::Code { code, .. }) => code.push_str(&text),
                Some(Frame::Html { html, .. }) => html.push_str(&text),
                _ => self.push_text(&text),
            },

            Event::Code(code) => self.push_inline(Inline::Code {
                code: code.to_string(),
            }),

            Event::Html(html) => match self.frames.last_mut() {
                Some(Frame::Html { html: buf, .. }) => buf.push_str(&html),
                _ => self.html_block(&html, range.start),
            },

            Event::InlineHtml(html) => self.inline_html(&html, range),

            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_inline(Inline::LineBreak),

            Event::Rule => {
                self.close_implicit();
                let block = Block::new(self.ids.new_id(), BlockKind::HorizontalRule);
                self.push_block(block);
            }

            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " });
            }

            Event::InlineMath(text) | Event::DisplayMath(text) => self.push_text(&text),

            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        match tag {
            Tag::Paragraph => {
                self.close_implicit();
                self.frames.push(Frame::Inlines {
                    kind: InlineKind::Paragraph { implicit: false },
                    inlines: Vec::new(),
                });
            }

            Tag::Heading { level, .. } => {
                self.close_implicit();
                self.frames.push(Frame::Inlines {
                    kind: InlineKind::Heading(level as u8),
                    inlines: Vec::new(),
                });
            }

            Tag::BlockQuote(kind) => {
                self.close_implicit();
                self.frames.push(Frame::Container {
                    kind: ContainerKind::Quote(kind),
                    blocks: Vec::new(),
                });
            }

            Tag::CodeBlock(kind) => {
                self.close_implicit();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string)
                        .filter(|l| !l.is_empty()),
                    CodeBlockKind::Indented => None,
                };
                self.frames.push(Frame::Code {
                    language,
                    code: String::new(),
                });
            }

            Tag::HtmlBlock => {
                self.close_implicit();
                self.frames.push(Frame::Html {
                    html: String::new(),
                    start: range.start,
                });
            }

            Tag::List(start) => {
                self.close_implicit();
                self.frames.push(Frame::List {
                    start,
                    items: Vec::new(),
                });
            }

            Tag::Item => self.frames.push(Frame::Container {
                kind: ContainerKind::Item,
                blocks: Vec::new(),
            }),

            Tag::Table(_) => {
                self.close_implicit();
                self.frames.push(Frame::Table { rows: Vec::new() });
            }
            Tag::TableHead => self.frames.push(Frame::Row {
                header: true,
                cells: Vec::new(),
            }),
            Tag::TableRow => self.frames.push(Frame::Row {
                header: false,
                cells: Vec::new(),
            }),
            Tag::TableCell => self.frames.push(Frame::Inlines {
                kind: InlineKind::Cell,
                inlines: Vec::new(),
            }),

            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strike += 1,

            Tag::Link { dest_url, .. } => {
                self.open_implicit();
                self.frames.push(Frame::Inlines {
                    kind: InlineKind::Link(dest_url.to_string()),
                    inlines: Vec::new(),
                });
            }

            Tag::Image { dest_url, .. } => {
                self.open_implicit();
                self.frames.push(Frame::Inlines {
                    kind: InlineKind::ImageAlt(dest_url.to_string()),
                    inlines: Vec::new(),
                });
            }

            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => {
                self.close_html_frames();
                self.finish_text_block();
            }

            TagEnd::BlockQuote(_) => {
                self.close_implicit();
                if let Some(Frame::Container {
                    kind: ContainerKind::Quote(kind),
                    mut blocks,
                }) = self.frames.pop()
                {
                    if blocks.is_empty() {
                        blocks.push(Block::paragraph(self.ids.new_id(), Vec::new()));
                    }
                    let kind = match kind.map(callout_variant) {
                        Some(variant) => BlockKind::Callout { variant, blocks },
                        None => BlockKind::BlockQuote { blocks },
                    };
                    let block = Block::new(self.ids.new_id(), kind);
                    self.push_block(block);
                }
            }

            TagEnd::CodeBlock => {
                if let Some(Frame::Code { language, mut code }) = self.frames.pop() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    let block = Block::new(self.ids.new_id(), BlockKind::CodeBlock { language, code });
                    self.push_block(block);
                }
            }

            TagEnd::HtmlBlock => {
                if let Some(Frame::Html { html, start }) = self.frames.pop() {
                    self.html_block(&html, start);
                }
            }

            TagEnd::Item => {
                self.close_implicit();
                if let Some(Frame::Container {
                    kind: ContainerKind::Item,
                    mut blocks,
                }) = self.frames.pop()
                {
                    if blocks.is_empty() {
                        blocks.push(Block::paragraph(self.ids.new_id(), Vec::new()));
                    }
                    if let Some(Frame::List { items, .. }) = self.frames.last_mut() {
                        items.push(ListItem { blocks });
                    }
                }
            }

            TagEnd::List(_) => {
                self.close_implicit();
                if let Some(Frame::List { start, items }) = self.frames.pop() {
                    let block = Block::new(
                        self.ids.new_id(),
                        BlockKind::List {
                            ordered: start.is_some(),
                            start,
                            items,
                        },
                    );
                    self.push_block(block);
                }
            }

            TagEnd::TableCell => {
                self.close_html_frames();
                self.html.clear();
                if let Some(Frame::Inlines {
                    kind: InlineKind::Cell,
                    mut inlines,
                }) = self.frames.pop()
                {
                    normalize_inlines(&mut inlines);
                    if let Some(Frame::Row { cells, .. }) = self.frames.last_mut() {
                        cells.push(inlines);
                    }
                }
            }

            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(Frame::Row { header, cells }) = self.frames.pop() {
                    if let Some(Frame::Table { rows }) = self.frames.last_mut() {
                        rows.push(TableRow { header, cells });
                    }
                }
            }

            TagEnd::Table => {
                if let Some(Frame::Table { rows }) = self.frames.pop() {
                    let block = Block::new(self.ids.new_id(), BlockKind::Table { rows });
                    self.push_block(block);
                }
            }

            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),

            TagEnd::Link | TagEnd::Image => {
                self.close_html_frames();
                self.fold_inline_frame();
            }

            _ => {}
        }
    }

    fn marks(&self) -> Marks {
        let mut marks = Marks {
            bold: self.strong > 0,
            italic: self.emphasis > 0,
            strike: self.strike > 0,
            ..Marks::default()
        };

        for span in &self.html {
            let overlay = &span.overlay;
            marks.bold |= overlay.bold;
            marks.italic |= overlay.italic;
            marks.underline |= overlay.underline;
            marks.strike |= overlay.strike;
            if overlay.color.is_some() {
                marks.color = overlay.color.clone();
            }
            if overlay.background.is_some() {
                marks.background = overlay.background.clone();
            }
        }

        marks
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let marks = self.marks();
        self.push_inline(Inline::styled(text, marks));
    }

    fn push_inline(&mut self, inline: Inline) {
        self.open_implicit();
        if let Some(Frame::Inlines { inlines, .. }) = self.frames.last_mut() {
            inlines.push(inline);
        }
    }

    /// Text directly inside a tight list item gets a paragraph of its own
    fn open_implicit(&mut self) {
        if let Some(Frame::Container { .. }) = self.frames.last() {
            self.frames.push(Frame::Inlines {
                kind: InlineKind::Paragraph { implicit: true },
                inlines: Vec::new(),
            });
        }
    }

    fn close_implicit(&mut self) {
        let implicit_above = self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Inlines {
                kind: InlineKind::Paragraph { implicit },
                ..
            } => Some(*implicit),
            Frame::Inlines { .. } => None,
            _ => Some(false),
        });

        if implicit_above == Some(true) {
            self.close_html_frames();
            self.finish_text_block();
        }
    }

    fn push_block(&mut self, block: Block) {
        for frame in self.frames.iter_mut().rev() {
            if let Frame::Container { blocks, .. } = frame {
                blocks.push(block);
                return;
            }
        }
    }

    /// Pop a paragraph or heading frame into its container
    fn finish_text_block(&mut self) {
        self.html.clear();
        let Some(Frame::Inlines { kind, mut inlines }) = self.frames.pop() else {
            return;
        };

        trim_end_inlines(&mut inlines);
        normalize_inlines(&mut inlines);

        let block = match kind {
            InlineKind::Heading(level) => Block::new(
                self.ids.new_id(),
                BlockKind::Heading {
                    level,
                    inlines,
                    align: None,
                },
            ),
            _ => paragraph_block(self.ids, inlines, None),
        };
        self.push_block(block);
    }

    /// Pop a link, anchor or image frame into its parent's inlines
    fn fold_inline_frame(&mut self) {
        let Some(Frame::Inlines { kind, inlines }) = self.frames.pop() else {
            return;
        };

        let inline = match kind {
            InlineKind::Link(href) | InlineKind::HtmlLink(href) => Inline::Link {
                href,
                children: inlines,
            },
            InlineKind::Anchor { id, resolved } => Inline::Anchor {
                id,
                resolved,
                children: inlines,
            },
            InlineKind::ImageAlt(src) => Inline::Image {
                src,
                alt: inlines_text(&inlines),
            },
            other => {
                self.frames.push(Frame::Inlines {
                    kind: other,
                    inlines,
                });
                return;
            }
        };

        self.push_inline(inline);
    }

    /// Close anchor and link frames opened by inline HTML that are still
    /// open when their markdown parent ends
    fn close_html_frames(&mut self) {
        while let Some(Frame::Inlines {
            kind: InlineKind::Anchor { .. } | InlineKind::HtmlLink(_),
            ..
        }) = self.frames.last()
        {
            self.fold_inline_frame();
        }
        self.html.retain(|span| !span.framed);
    }

    fn html_block(&mut self, html: &str, start: usize) {
        let (blocks, diagnostics) = lower_fragment(html, start, self.ids, &mut self.anchors);
        self.diagnostics.extend(diagnostics);
        for block in blocks {
            self.push_block(block);
        }
    }

    fn inline_html(&mut self, html: &str, range: Range<usize>) {
        let span = SourceSpan::from(range);

        for result in lex(html) {
            match result {
                Ok(spanned) => match spanned.token {
                    Token::Comment(_) | Token::Declaration => {}
                    Token::Text(text) => self.push_text(&decode_entities(text)),
                    Token::OpenTag(raw) => self.open_inline_tag(raw, span),
                    Token::CloseTag(name) => self.close_inline_tag(&name.to_ascii_lowercase(), span),
                },
                Err(err) => self.push_text(&html[err.span.start..err.span.end]),
            }
        }
    }

    fn open_inline_tag(&mut self, raw: &str, span: SourceSpan) {
        let tag = parse_tag(raw);
        let mut overlay = Marks::default();
        let mut framed = false;

        match tag.name.as_str() {
            "br" => {
                self.push_inline(Inline::LineBreak);
                return;
            }
            "img" => {
                self.push_inline(Inline::Image {
                    src: tag.attr("src").unwrap_or_default().to_string(),
                    alt: tag.attr("alt").unwrap_or_default().to_string(),
                });
                return;
            }
            "strong" | "b" => overlay.bold = true,
            "em" | "i" => overlay.italic = true,
            "u" | "ins" => overlay.underline = true,
            "s" | "del" | "strike" => overlay.strike = true,
            "a" if tag.attr("href").is_some() => {
                let href = tag.attr("href").unwrap_or_default().to_string();
                self.open_implicit();
                self.frames.push(Frame::Inlines {
                    kind: InlineKind::HtmlLink(href),
                    inlines: Vec::new(),
                });
                framed = true;
            }
            "span" => {
                if let Some(style) = tag.attr("style") {
                    overlay.color = style_value(style, "color");
                    overlay.background = style_value(style, "background-color")
                        .or_else(|| style_value(style, "background"));
                }

                if let Some(id) = tag.attr("data-comment-id").filter(|id| !id.is_empty()) {
                    if self.anchors.insert(id.to_string()) {
                        let resolved = tag
                            .attr("class")
                            .map_or(false, |c| c.split_whitespace().any(|c| c == "resolved"))
                            || tag.attr("data-resolved") == Some("true");
                        self.open_implicit();
                        self.frames.push(Frame::Inlines {
                            kind: InlineKind::Anchor {
                                id: id.to_string(),
                                resolved,
                            },
                            inlines: Vec::new(),
                        });
                        framed = true;
                    } else {
                        self.diagnostics.push(ConversionError::DuplicateAnchor {
                            id: id.to_string(),
                            span,
                        });
                    }
                }
            }
            name if QUIET_INLINE_TAGS.contains(&name) => {}
            name => {
                self.diagnostics.push(ConversionError::UnknownInline {
                    tag: name.to_string(),
                    span,
                });
                self.push_text(raw);
                return;
            }
        }

        if !tag.self_closing {
            self.html.push(HtmlSpan {
                tag: tag.name,
                overlay,
                framed,
            });
        }
    }

    fn close_inline_tag(&mut self, name: &str, span: SourceSpan) {
        if name == "br" || name == "img" {
            return;
        }

        let Some(index) = self.html.iter().rposition(|s| s.tag == name) else {
            if QUIET_INLINE_TAGS.contains(&name) || is_overlay_tag(name) {
                self.diagnostics.push(ConversionError::StrayCloseTag {
                    tag: name.to_string(),
                    span,
                });
            } else {
                self.push_text(&format!("</{}>", name));
            }
            return;
        };

        let closed: Vec<HtmlSpan> = self.html.drain(index..).collect();
        for open in closed.iter().rev() {
            if open.framed {
                if let Some(Frame::Inlines {
                    kind: InlineKind::Anchor { .. } | InlineKind::HtmlLink(_),
                    ..
                }) = self.frames.last()
                {
                    self.fold_inline_frame();
                }
            }
        }
    }

    fn finish(&mut self) -> Vec<Block> {
        self.close_implicit();
        while self.frames.len() > 1 {
            match self.frames.last() {
                Some(Frame::Inlines { .. }) => {
                    self.close_html_frames();
                    if let Some(Frame::Inlines {
                        kind: InlineKind::Link(_) | InlineKind::ImageAlt(_),
                        ..
                    }) = self.frames.last()
                    {
                        self.fold_inline_frame();
                    } else {
                        self.finish_text_block();
                    }
                }
                _ => {
                    self.frames.pop();
                }
            }
        }

        match self.frames.pop() {
            Some(Frame::Container { blocks, .. }) => blocks,
            _ => Vec::new(),
        }
    }
}

fn is_overlay_tag(name: &str) -> bool {
    matches!(
        name,
        "strong" | "b" | "em" | "i" | "u" | "ins" | "s" | "del" | "strike" | "a" | "span"
    )
}

fn callout_variant(kind: BlockQuoteKind) -> CalloutVariant {
    match kind {
        BlockQuoteKind::Note | BlockQuoteKind::Important => CalloutVariant::Info,
        BlockQuoteKind::Tip => CalloutVariant::Success,
        BlockQuoteKind::Warning => CalloutVariant::Warning,
        BlockQuoteKind::Caution => CalloutVariant::Error,
    }
}
