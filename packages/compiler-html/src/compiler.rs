use inkpress_parser::ast::*;
use inkpress_parser::lexer::{escape_attr, escape_text};

/// Options for flat markup output
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// One block per line, nested blocks indented
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

impl CompileOptions {
    /// Single-line output, the form sent to the article store
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::default()
        }
    }
}

struct Context<'a> {
    options: &'a CompileOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        self.start_line();
        self.add(text);
        self.end_line();
    }

    fn start_line(&mut self) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
    }

    fn end_line(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Write a document as flat markup
pub fn to_flat_markup(document: &Document, options: &CompileOptions) -> String {
    let mut ctx = Context::new(options);

    for block in &document.blocks {
        compile_block(block, &mut ctx);
    }

    ctx.get_output()
}

/// Write inline content alone, no surrounding block element
pub fn inlines_to_flat_markup(inlines: &[Inline]) -> String {
    let options = CompileOptions::compact();
    let mut ctx = Context::new(&options);
    compile_inlines(inlines, &mut ctx);
    ctx.get_output()
}

fn align_attr(align: &Option<Alignment>) -> String {
    match align {
        Some(align) => format!(" style=\"text-align: {}\"", align.as_str()),
        None => String::new(),
    }
}

fn compile_block(block: &Block, ctx: &mut Context) {
    match &block.kind {
        BlockKind::Paragraph { inlines, align } => {
            compile_text_block("p", &align_attr(align), inlines, ctx);
        }

        BlockKind::Heading {
            level,
            inlines,
            align,
        } => {
            let tag = format!("h{}", (*level).clamp(1, 6));
            compile_text_block(&tag, &align_attr(align), inlines, ctx);
        }

        BlockKind::BlockQuote { blocks } => {
            compile_container("<blockquote>", "</blockquote>", blocks, ctx);
        }

        BlockKind::List {
            ordered,
            start,
            items,
        } => compile_list(*ordered, *start, items, ctx),

        BlockKind::CodeBlock { language, code } => {
            ctx.start_line();
            match language {
                Some(lang) => ctx.add(&format!(
                    "<pre><code class=\"language-{}\">",
                    escape_attr(lang)
                )),
                None => ctx.add("<pre><code>"),
            }
            // the reader drops one leading and one trailing newline
            if code.starts_with('\n') {
                ctx.add("\n");
            }
            ctx.add(&escape_text(code));
            if code.ends_with('\n') {
                ctx.add("\n");
            }
            ctx.add("</code></pre>");
            ctx.end_line();
        }

        BlockKind::HorizontalRule => ctx.add_line("<hr>"),

        BlockKind::Table { rows } => {
            ctx.add_line("<table>");
            ctx.indent();
            for row in rows {
                let cell_tag = if row.header { "th" } else { "td" };
                ctx.add_line("<tr>");
                ctx.indent();
                for cell in &row.cells {
                    compile_text_block(cell_tag, "", cell, ctx);
                }
                ctx.dedent();
                ctx.add_line("</tr>");
            }
            ctx.dedent();
            ctx.add_line("</table>");
        }

        BlockKind::Callout { variant, blocks } => {
            let open = format!(
                "<div class=\"callout callout-{}\">",
                variant.as_str()
            );
            compile_container(&open, "</div>", blocks, ctx);
        }

        BlockKind::Columns { columns } => {
            ctx.add_line("<div class=\"columns\">");
            ctx.indent();
            for column in columns {
                compile_container("<div class=\"column\">", "</div>", column, ctx);
            }
            ctx.dedent();
            ctx.add_line("</div>");
        }

        BlockKind::Collapsible {
            summary,
            open,
            blocks,
        } => {
            ctx.add_line(if *open { "<details open>" } else { "<details>" });
            ctx.indent();
            compile_text_block("summary", "", summary, ctx);
            for block in blocks {
                compile_block(block, ctx);
            }
            ctx.dedent();
            ctx.add_line("</details>");
        }

        BlockKind::Media { media } => compile_media(media, ctx),
    }
}

fn compile_text_block(tag: &str, attrs: &str, inlines: &[Inline], ctx: &mut Context) {
    ctx.start_line();
    ctx.add(&format!("<{}{}>", tag, attrs));
    compile_inlines(inlines, ctx);
    ctx.add(&format!("</{}>", tag));
    ctx.end_line();
}

fn compile_container(open: &str, close: &str, blocks: &[Block], ctx: &mut Context) {
    ctx.add_line(open);
    ctx.indent();
    for block in blocks {
        compile_block(block, ctx);
    }
    ctx.dedent();
    ctx.add_line(close);
}

fn compile_list(ordered: bool, start: Option<u64>, items: &[ListItem], ctx: &mut Context) {
    let (open, close) = match (ordered, start) {
        (true, Some(n)) if n != 1 => (format!("<ol start=\"{}\">", n), "</ol>"),
        (true, _) => ("<ol>".to_string(), "</ol>"),
        (false, _) => ("<ul>".to_string(), "</ul>"),
    };

    ctx.add_line(&open);
    ctx.indent();

    for item in items {
        // a leading plain paragraph is written inline, as tight lists are
        let (lead, rest) = match item.blocks.split_first() {
            Some((
                Block {
                    kind: BlockKind::Paragraph {
                        inlines,
                        align: None,
                    },
                    ..
                },
                rest,
            )) => (Some(inlines), rest),
            _ => (None, item.blocks.as_slice()),
        };

        ctx.start_line();
        ctx.add("<li>");
        if let Some(inlines) = lead {
            compile_inlines(inlines, ctx);
        }

        if rest.is_empty() {
            ctx.add("</li>");
            ctx.end_line();
            continue;
        }

        ctx.end_line();
        ctx.indent();
        for block in rest {
            compile_block(block, ctx);
        }
        ctx.dedent();
        ctx.add_line("</li>");
    }

    ctx.dedent();
    ctx.add_line(close);
}

fn compile_media(media: &Media, ctx: &mut Context) {
    match media {
        Media::Image { src, alt } => ctx.add_line(&format!(
            "<figure><img src=\"{}\" alt=\"{}\"></figure>",
            escape_attr(src),
            escape_attr(alt)
        )),
        Media::Video { provider, video_id } => ctx.add_line(&format!(
            "<div class=\"video-embed\" data-provider=\"{}\" data-video-id=\"{}\">\
             <iframe src=\"{}\" allowfullscreen></iframe></div>",
            provider.as_str(),
            escape_attr(video_id),
            escape_attr(&provider.embed_url(video_id))
        )),
        Media::File { href, name } => ctx.add_line(&format!(
            "<div class=\"file-attachment\"><a href=\"{}\" download>{}</a></div>",
            escape_attr(href),
            escape_text(name)
        )),
    }
}

fn compile_inlines(inlines: &[Inline], ctx: &mut Context) {
    for inline in inlines {
        compile_inline(inline, ctx);
    }
}

fn compile_inline(inline: &Inline, ctx: &mut Context) {
    match inline {
        Inline::Text { text, marks } => compile_text(text, marks, ctx),

        Inline::Code { code } => {
            ctx.add("<code>");
            ctx.add(&escape_text(code));
            ctx.add("</code>");
        }

        Inline::Link { href, children } => {
            ctx.add(&format!("<a href=\"{}\">", escape_attr(href)));
            compile_inlines(children, ctx);
            ctx.add("</a>");
        }

        Inline::Anchor {
            id,
            resolved,
            children,
        } => {
            let class = if *resolved {
                "comment-anchor resolved"
            } else {
                "comment-anchor"
            };
            ctx.add(&format!(
                "<span class=\"{}\" data-comment-id=\"{}\">",
                class,
                escape_attr(id)
            ));
            compile_inlines(children, ctx);
            ctx.add("</span>");
        }

        Inline::Image { src, alt } => ctx.add(&format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_attr(src),
            escape_attr(alt)
        )),

        Inline::LineBreak => ctx.add("<br>"),
    }
}

fn compile_text(text: &str, marks: &Marks, ctx: &mut Context) {
    let mut close: Vec<&str> = Vec::new();

    let mut style = Vec::new();
    if let Some(color) = &marks.color {
        style.push(format!("color: {}", color));
    }
    if let Some(background) = &marks.background {
        style.push(format!("background-color: {}", background));
    }
    if !style.is_empty() {
        ctx.add(&format!("<span style=\"{}\">", escape_attr(&style.join("; "))));
        close.push("</span>");
    }

    for (on, open, end) in [
        (marks.bold, "<strong>", "</strong>"),
        (marks.italic, "<em>", "</em>"),
        (marks.underline, "<u>", "</u>"),
        (marks.strike, "<s>", "</s>"),
    ] {
        if on {
            ctx.add(open);
            close.push(end);
        }
    }

    ctx.add(&escape_text(text));

    for end in close.iter().rev() {
        ctx.add(end);
    }
}
