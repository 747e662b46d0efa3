//! Tolerant flat-markup reader
//!
//! Two passes: tokens are folded into a loose element tree (implicit closes,
//! void elements, stray close tags skipped), then the tree is lowered into
//! document blocks. Nothing here fails; anything outside the supported
//! subset is recorded as a [`ConversionError`] and kept as text.

use std::collections::HashSet;

use crate::ast::{
    Alignment, Block, BlockKind, CalloutVariant, Document, Inline, ListItem, Marks, Media,
    TableRow, VideoProvider, normalize_inlines,
};
use crate::error::{ConversionError, ParseOutput, SourceSpan};
use crate::id_generator::IDGenerator;
use crate::lexer::{decode_entities, lex, parse_tag, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
    pub span: SourceSpan,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map_or(false, |classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            MarkupNode::Element(el) => Some(el),
            MarkupNode::Text(_) => None,
        })
    }

    /// Concatenated text of all descendants, whitespace untouched
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Value of one declaration in the inline `style` attribute
    pub fn style(&self, property: &str) -> Option<String> {
        style_value(self.attr("style")?, property)
    }
}

/// Look up one declaration in an inline style string
pub(crate) fn style_value(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        (key.trim().eq_ignore_ascii_case(property)).then(|| value.trim().to_string())
    })
}

fn collect_text(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Element(el) if el.name == "br" => out.push('\n'),
            MarkupNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

const VOID_TAGS: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "source", "wbr", "col", "area", "embed", "base",
];

/// Elements whose close tag may be omitted
const OPTIONAL_CLOSE: &[&str] = &[
    "p", "li", "td", "th", "tr", "thead", "tbody", "tfoot", "option", "html", "body", "head",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "pre", "blockquote", "hr",
    "table", "div", "section", "article", "details", "figure", "header", "footer", "main",
    "nav", "aside",
];

const INLINE_TAGS: &[&str] = &[
    "strong", "b", "em", "i", "u", "ins", "s", "del", "strike", "code", "a", "br", "img", "span",
];

/// Inline wrappers with no model counterpart that are dropped silently
pub(crate) const QUIET_INLINE_TAGS: &[&str] = &[
    "sub", "sup", "small", "mark", "abbr", "kbd", "cite", "q", "time", "label", "font", "big",
];

const TRANSPARENT_BLOCK_TAGS: &[&str] = &[
    "html", "body", "section", "article", "main", "header", "footer", "nav", "aside", "div",
    "thead", "tbody", "tfoot",
];

const DROPPED_TAGS: &[&str] = &["script", "style", "iframe", "object", "noscript", "template"];

const SILENT_DROPPED_TAGS: &[&str] = &["head", "title", "meta", "link", "base"];

fn is_inline_tag(name: &str) -> bool {
    INLINE_TAGS.contains(&name) || QUIET_INLINE_TAGS.contains(&name)
}

/// Build the loose element tree for `source`
pub fn build_tree(source: &str) -> (Vec<MarkupNode>, Vec<ConversionError>) {
    let mut builder = TreeBuilder {
        stack: vec![Element {
            name: "#root".to_string(),
            ..Element::default()
        }],
        diagnostics: Vec::new(),
    };

    for result in lex(source) {
        match result {
            Ok(spanned) => match spanned.token {
                Token::Comment(_) | Token::Declaration => {}
                Token::Text(text) => builder.push_text(decode_entities(text)),
                Token::OpenTag(raw) => builder.open(raw, spanned.span),
                Token::CloseTag(name) => builder.close(&name.to_ascii_lowercase(), spanned.span),
            },
            Err(err) => builder.push_text(source[err.span.start..err.span.end].to_string()),
        }
    }

    builder.finish()
}

struct TreeBuilder {
    stack: Vec<Element>,
    diagnostics: Vec<ConversionError>,
}

impl TreeBuilder {
    fn top(&mut self) -> &mut Element {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_text(&mut self, text: String) {
        let top = self.top();
        if let Some(MarkupNode::Text(prev)) = top.children.last_mut() {
            prev.push_str(&text);
        } else {
            top.children.push(MarkupNode::Text(text));
        }
    }

    /// Pop the top element into its parent
    fn pop(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(el) = self.stack.pop() {
            self.top().children.push(MarkupNode::Element(el));
        }
    }

    /// Index of the nearest open `name` that is not shielded by `boundary`
    fn find_open(&self, name: &str, boundary: &[&str]) -> Option<usize> {
        for (i, el) in self.stack.iter().enumerate().skip(1).rev() {
            if el.name == name {
                return Some(i);
            }
            if boundary.contains(&el.name.as_str()) {
                return None;
            }
        }
        None
    }

    fn close_to(&mut self, index: usize) {
        while self.stack.len() > index {
            self.pop();
        }
    }

    fn close_implied(&mut self, name: &str) {
        let found = match name {
            "li" => self.find_open("li", &["ul", "ol"]),
            "tr" => self.find_open("tr", &["table", "thead", "tbody", "tfoot"]),
            "td" | "th" => self
                .find_open("td", &["tr", "table"])
                .or_else(|| self.find_open("th", &["tr", "table"])),
            "thead" | "tbody" | "tfoot" => self
                .find_open("thead", &["table"])
                .or_else(|| self.find_open("tbody", &["table"])),
            _ => None,
        };
        if let Some(index) = found {
            self.close_to(index);
        }

        // a block opening ends a paragraph when only inline elements sit above it
        if BLOCK_TAGS.contains(&name) {
            let mut index = None;
            for (i, el) in self.stack.iter().enumerate().skip(1).rev() {
                if el.name == "p" {
                    index = Some(i);
                    break;
                }
                if !is_inline_tag(&el.name) {
                    break;
                }
            }
            if let Some(index) = index {
                self.close_to(index);
            }
        }
    }

    fn open(&mut self, raw: &str, span: SourceSpan) {
        let tag = parse_tag(raw);
        self.close_implied(&tag.name);

        let element = Element {
            name: tag.name,
            attrs: tag.attrs,
            children: Vec::new(),
            span,
        };

        if tag.self_closing || VOID_TAGS.contains(&element.name.as_str()) {
            self.top().children.push(MarkupNode::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn close(&mut self, name: &str, span: SourceSpan) {
        if VOID_TAGS.contains(&name) {
            return;
        }

        let found = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, el)| el.name == name)
            .map(|(i, _)| i);

        match found {
            Some(index) => {
                for el in &self.stack[index + 1..] {
                    if !OPTIONAL_CLOSE.contains(&el.name.as_str()) {
                        self.diagnostics.push(ConversionError::UnclosedElement {
                            tag: el.name.clone(),
                            span: el.span,
                        });
                    }
                }
                self.close_to(index);
            }
            None => self.diagnostics.push(ConversionError::StrayCloseTag {
                tag: name.to_string(),
                span,
            }),
        }
    }

    fn finish(mut self) -> (Vec<MarkupNode>, Vec<ConversionError>) {
        for el in &self.stack[1..] {
            if !OPTIONAL_CLOSE.contains(&el.name.as_str()) {
                self.diagnostics.push(ConversionError::UnclosedElement {
                    tag: el.name.clone(),
                    span: el.span,
                });
            }
        }
        self.close_to(1);

        let root = self.stack.pop().unwrap_or_default();
        (root.children, self.diagnostics)
    }
}

/// Parse flat markup into a document. Never fails; the result holds at
/// least one block.
pub fn from_flat_markup(source: &str, ids: &mut IDGenerator) -> ParseOutput {
    let mut anchors = HashSet::new();
    let (blocks, diagnostics) = lower_fragment(source, 0, ids, &mut anchors);

    for diagnostic in &diagnostics {
        tracing::debug!("[FlatMarkup] {}", diagnostic);
    }

    let mut document = Document::new(blocks);
    document.ensure_not_empty(ids);

    ParseOutput {
        document,
        diagnostics,
    }
}

/// Lower a markup fragment into blocks. Spans in the returned diagnostics
/// are shifted by `base_offset`; `anchors` carries the comment ids already
/// claimed by the surrounding document.
pub(crate) fn lower_fragment(
    source: &str,
    base_offset: usize,
    ids: &mut IDGenerator,
    anchors: &mut HashSet<String>,
) -> (Vec<Block>, Vec<ConversionError>) {
    let (nodes, tree_diagnostics) = build_tree(source);

    let mut lowering = Lowering {
        ids,
        anchors,
        diagnostics: tree_diagnostics,
        prev_space: true,
    };
    let blocks = lowering.blocks(&nodes);

    let diagnostics = lowering
        .diagnostics
        .into_iter()
        .map(|d| d.shifted(base_offset))
        .collect();

    (blocks, diagnostics)
}

/// Build a paragraph, promoting a lone image to a media block
pub(crate) fn paragraph_block(
    ids: &mut IDGenerator,
    inlines: Vec<Inline>,
    align: Option<Alignment>,
) -> Block {
    if align.is_none() {
        if let [Inline::Image { src, alt }] = inlines.as_slice() {
            return Block::new(
                ids.new_id(),
                BlockKind::Media {
                    media: Media::Image {
                        src: src.clone(),
                        alt: alt.clone(),
                    },
                },
            );
        }
    }

    Block::new(ids.new_id(), BlockKind::Paragraph { inlines, align })
}

/// Marks carried by an inline `span` style, if any
pub(crate) fn span_marks(el_style: impl Fn(&str) -> Option<String>, marks: &mut Marks) {
    if let Some(color) = el_style("color") {
        marks.color = Some(color);
    }
    if let Some(background) = el_style("background-color").or_else(|| el_style("background")) {
        marks.background = Some(background);
    }
}

struct Lowering<'a> {
    ids: &'a mut IDGenerator,
    anchors: &'a mut HashSet<String>,
    diagnostics: Vec<ConversionError>,
    prev_space: bool,
}

impl Lowering<'_> {
    fn blocks(&mut self, nodes: &[MarkupNode]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending: Vec<&MarkupNode> = Vec::new();

        for node in nodes {
            let is_block = match node {
                MarkupNode::Text(_) => false,
                MarkupNode::Element(el) => !is_inline_tag(&el.name),
            };

            if is_block {
                self.flush_loose(&mut pending, &mut blocks);
                if let MarkupNode::Element(el) = node {
                    self.block(el, &mut blocks);
                }
            } else {
                pending.push(node);
            }
        }

        self.flush_loose(&mut pending, &mut blocks);
        blocks
    }

    /// Turn loose inline content between blocks into a paragraph
    fn flush_loose(&mut self, pending: &mut Vec<&MarkupNode>, blocks: &mut Vec<Block>) {
        if pending.is_empty() {
            return;
        }

        let nodes: Vec<MarkupNode> = pending.drain(..).cloned().collect();
        let inlines = self.inlines(&nodes);
        if !inlines.is_empty() {
            blocks.push(paragraph_block(self.ids, inlines, None));
        }
    }

    fn block(&mut self, el: &Element, out: &mut Vec<Block>) {
        let align = el
            .style("text-align")
            .or_else(|| el.attr("align").map(str::to_string))
            .and_then(|a| Alignment::parse(&a));

        match el.name.as_str() {
            "p" => {
                let inlines = self.inlines(&el.children);
                out.push(paragraph_block(self.ids, inlines, align));
            }

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.name[1..].parse::<u8>().unwrap_or(1);
                let inlines = self.inlines(&el.children);
                out.push(Block::new(
                    self.ids.new_id(),
                    BlockKind::Heading {
                        level,
                        inlines,
                        align,
                    },
                ));
            }

            "blockquote" => {
                let blocks = self.nested_blocks(&el.children);
                out.push(Block::new(self.ids.new_id(), BlockKind::BlockQuote { blocks }));
            }

            "ul" | "ol" => out.push(self.list(el)),

            "li" => {
                // list item outside a list
                let blocks = self.blocks(&el.children);
                out.extend(blocks);
            }

            "pre" => out.push(self.code_block(el)),

            "hr" => out.push(Block::new(self.ids.new_id(), BlockKind::HorizontalRule)),

            "table" => out.push(self.table(el)),

            "details" => out.push(self.collapsible(el)),

            "figure" => {
                let img = find_descendant(el, "img");
                match img {
                    Some(img) => {
                        let caption = find_descendant(el, "figcaption")
                            .map(|c| collapse(&c.text_content()))
                            .unwrap_or_default();
                        let alt = img
                            .attr("alt")
                            .filter(|a| !a.is_empty())
                            .map(str::to_string)
                            .unwrap_or(caption);
                        out.push(self.media(Media::Image {
                            src: img.attr("src").unwrap_or_default().to_string(),
                            alt,
                        }));
                    }
                    None => out.extend(self.blocks(&el.children)),
                }
            }

            "div" if el.has_class("callout") => {
                let variant = el
                    .attr("data-variant")
                    .and_then(CalloutVariant::parse)
                    .or_else(|| {
                        CalloutVariant::ALL
                            .into_iter()
                            .find(|v| el.has_class(&format!("callout-{}", v.as_str())))
                    })
                    .unwrap_or(CalloutVariant::Info);
                let blocks = self.nested_blocks(&el.children);
                out.push(Block::new(
                    self.ids.new_id(),
                    BlockKind::Callout { variant, blocks },
                ));
            }

            "div" if el.has_class("columns") => {
                let mut columns = Vec::new();
                for child in el.child_elements() {
                    let blocks = if child.has_class("column") {
                        self.nested_blocks(&child.children)
                    } else {
                        let mut blocks = Vec::new();
                        self.block(child, &mut blocks);
                        blocks
                    };
                    columns.push(blocks);
                }
                out.push(Block::new(self.ids.new_id(), BlockKind::Columns { columns }));
            }

            "div" if el.has_class("video-embed") => {
                let provider = el.attr("data-provider").and_then(VideoProvider::parse);
                let video_id = el.attr("data-video-id").filter(|id| !id.is_empty());
                match (provider, video_id) {
                    (Some(provider), Some(video_id)) => out.push(self.media(Media::Video {
                        provider,
                        video_id: video_id.to_string(),
                    })),
                    _ => {
                        self.diagnostics.push(ConversionError::Malformed {
                            message: "video embed without provider or id".to_string(),
                            span: el.span,
                        });
                        out.extend(self.blocks(&el.children));
                    }
                }
            }

            "div" if el.has_class("file-attachment") => match find_descendant(el, "a") {
                Some(link) => {
                    let href = link.attr("href").unwrap_or_default().to_string();
                    let mut name = collapse(&link.text_content()).trim().to_string();
                    if name.is_empty() {
                        name = href.rsplit('/').next().unwrap_or_default().to_string();
                    }
                    out.push(self.media(Media::File { href, name }));
                }
                None => out.extend(self.blocks(&el.children)),
            },

            "img" => out.push(self.media(Media::Image {
                src: el.attr("src").unwrap_or_default().to_string(),
                alt: el.attr("alt").unwrap_or_default().to_string(),
            })),

            name if TRANSPARENT_BLOCK_TAGS.contains(&name) => {
                out.extend(self.blocks(&el.children));
            }

            name if SILENT_DROPPED_TAGS.contains(&name) => {}

            name if DROPPED_TAGS.contains(&name) => {
                self.diagnostics.push(ConversionError::DroppedElement {
                    tag: name.to_string(),
                    span: el.span,
                });
            }

            name => {
                self.diagnostics.push(ConversionError::UnknownElement {
                    tag: name.to_string(),
                    span: el.span,
                });
                let text = collapse(&el.text_content()).trim().to_string();
                if !text.is_empty() {
                    out.push(Block::paragraph(self.ids.new_id(), vec![Inline::text(text)]));
                }
            }
        }
    }

    /// Child blocks of a container, never empty so the caret has a home
    fn nested_blocks(&mut self, nodes: &[MarkupNode]) -> Vec<Block> {
        let mut blocks = self.blocks(nodes);
        if blocks.is_empty() {
            blocks.push(Block::paragraph(self.ids.new_id(), Vec::new()));
        }
        blocks
    }

    fn media(&mut self, media: Media) -> Block {
        Block::new(self.ids.new_id(), BlockKind::Media { media })
    }

    fn list(&mut self, el: &Element) -> Block {
        let ordered = el.name == "ol";
        let start = if ordered {
            Some(el.attr("start").and_then(|s| s.trim().parse().ok()).unwrap_or(1))
        } else {
            None
        };

        let mut items = Vec::new();
        for node in &el.children {
            match node {
                MarkupNode::Element(child) if child.name == "li" => items.push(ListItem {
                    blocks: self.nested_blocks(&child.children),
                }),
                MarkupNode::Text(text) if text.trim().is_empty() => {}
                _ => items.push(ListItem {
                    blocks: self.nested_blocks(std::slice::from_ref(node)),
                }),
            }
        }

        Block::new(
            self.ids.new_id(),
            BlockKind::List {
                ordered,
                start,
                items,
            },
        )
    }

    fn code_block(&mut self, el: &Element) -> Block {
        let code_el = el.child_elements().find(|c| c.name == "code");

        let language = code_el
            .and_then(|c| c.attr("class"))
            .and_then(|classes| {
                classes
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-"))
            })
            .or_else(|| el.attr("data-language"))
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        let mut code = el.text_content();
        if code.starts_with('\n') {
            code.remove(0);
        }
        if code.ends_with('\n') {
            code.pop();
        }

        Block::new(self.ids.new_id(), BlockKind::CodeBlock { language, code })
    }

    fn table(&mut self, el: &Element) -> Block {
        let mut rows = Vec::new();
        self.collect_rows(el, false, &mut rows);
        Block::new(self.ids.new_id(), BlockKind::Table { rows })
    }

    fn collect_rows(&mut self, el: &Element, in_head: bool, rows: &mut Vec<TableRow>) {
        for child in el.child_elements() {
            match child.name.as_str() {
                "thead" => self.collect_rows(child, true, rows),
                "tbody" | "tfoot" => self.collect_rows(child, false, rows),
                "tr" => {
                    let cells: Vec<&Element> = child
                        .child_elements()
                        .filter(|c| c.name == "td" || c.name == "th")
                        .collect();
                    let header =
                        in_head || (!cells.is_empty() && cells.iter().all(|c| c.name == "th"));
                    let cells = cells
                        .into_iter()
                        .map(|cell| self.inlines(&cell.children))
                        .collect();
                    rows.push(TableRow { header, cells });
                }
                "caption" | "colgroup" | "col" => {}
                other => self.diagnostics.push(ConversionError::UnknownElement {
                    tag: other.to_string(),
                    span: child.span,
                }),
            }
        }
    }

    fn collapsible(&mut self, el: &Element) -> Block {
        let open = el.attr("open").is_some();
        let summary = el
            .child_elements()
            .find(|c| c.name == "summary")
            .map(|s| s.children.clone())
            .unwrap_or_default();
        let summary = self.inlines(&summary);

        let body: Vec<MarkupNode> = el
            .children
            .iter()
            .filter(|node| !matches!(node, MarkupNode::Element(c) if c.name == "summary"))
            .cloned()
            .collect();
        let blocks = self.nested_blocks(&body);

        Block::new(
            self.ids.new_id(),
            BlockKind::Collapsible {
                summary,
                open,
                blocks,
            },
        )
    }

    /// Inline content of one text container, whitespace collapsed and trimmed
    fn inlines(&mut self, nodes: &[MarkupNode]) -> Vec<Inline> {
        let mut out = Vec::new();
        self.prev_space = true;
        self.collect_inlines(nodes, &Marks::default(), &mut out);
        trim_end_inlines(&mut out);
        normalize_inlines(&mut out);
        out
    }

    fn collect_inlines(&mut self, nodes: &[MarkupNode], marks: &Marks, out: &mut Vec<Inline>) {
        for node in nodes {
            match node {
                MarkupNode::Text(text) => {
                    let mut collapsed = String::with_capacity(text.len());
                    for c in text.chars() {
                        if c.is_whitespace() && c != '\u{a0}' {
                            if !self.prev_space {
                                collapsed.push(' ');
                                self.prev_space = true;
                            }
                        } else {
                            collapsed.push(c);
                            self.prev_space = false;
                        }
                    }
                    if !collapsed.is_empty() {
                        out.push(Inline::styled(collapsed, marks.clone()));
                    }
                }
                MarkupNode::Element(el) => self.inline_element(el, marks, out),
            }
        }
    }

    fn inline_element(&mut self, el: &Element, marks: &Marks, out: &mut Vec<Inline>) {
        let mut inner = marks.clone();

        match el.name.as_str() {
            "strong" | "b" => inner.bold = true,
            "em" | "i" => inner.italic = true,
            "u" | "ins" => inner.underline = true,
            "s" | "del" | "strike" => inner.strike = true,

            "code" => {
                let code = el.text_content();
                if !code.is_empty() {
                    self.prev_space = false;
                    out.push(Inline::Code { code });
                }
                return;
            }

            "br" => {
                trim_end_inlines(out);
                out.push(Inline::LineBreak);
                self.prev_space = true;
                return;
            }

            "img" => {
                self.prev_space = false;
                out.push(Inline::Image {
                    src: el.attr("src").unwrap_or_default().to_string(),
                    alt: el.attr("alt").unwrap_or_default().to_string(),
                });
                return;
            }

            "a" => {
                if let Some(href) = el.attr("href") {
                    let mut children = Vec::new();
                    self.collect_inlines(&el.children, marks, &mut children);
                    out.push(Inline::Link {
                        href: href.to_string(),
                        children,
                    });
                    return;
                }
            }

            "span" => {
                span_marks(|p| el.style(p), &mut inner);

                if let Some(id) = el.attr("data-comment-id").filter(|id| !id.is_empty()) {
                    if self.anchors.insert(id.to_string()) {
                        let resolved = el.has_class("resolved")
                            || el.attr("data-resolved").map_or(false, |v| v == "true");
                        let mut children = Vec::new();
                        self.collect_inlines(&el.children, &inner, &mut children);
                        out.push(Inline::Anchor {
                            id: id.to_string(),
                            resolved,
                            children,
                        });
                        return;
                    }
                    self.diagnostics.push(ConversionError::DuplicateAnchor {
                        id: id.to_string(),
                        span: el.span,
                    });
                }
            }

            name if QUIET_INLINE_TAGS.contains(&name) => {}

            name if INLINE_TAGS.contains(&name) => {}

            name if BLOCK_TAGS.contains(&name) || TRANSPARENT_BLOCK_TAGS.contains(&name) => {}

            name => self.diagnostics.push(ConversionError::UnknownInline {
                tag: name.to_string(),
                span: el.span,
            }),
        }

        self.collect_inlines(&el.children, &inner, out);
    }
}

fn find_descendant<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    for child in el.child_elements() {
        if child.name == name {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, name) {
            return Some(found);
        }
    }
    None
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip trailing whitespace from the last text run, looking inside links
/// and anchors
pub(crate) fn trim_end_inlines(inlines: &mut Vec<Inline>) {
    while let Some(last) = inlines.last_mut() {
        match last {
            Inline::Text { text, .. } => {
                let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() && c != '\u{a0}');
                if trimmed.is_empty() {
                    inlines.pop();
                    continue;
                }
                let len = trimmed.len();
                text.truncate(len);
            }
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                trim_end_inlines(children);
                if children.is_empty() {
                    inlines.pop();
                    continue;
                }
            }
            _ => {}
        }
        break;
    }
}
