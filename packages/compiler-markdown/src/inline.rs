use inkpress_parser::ast::{Inline, Marks};
use inkpress_parser::lexer::escape_attr;

/// How line breaks inside the run can be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineMode {
    /// Backslash hard breaks
    Multi,
    /// Headings: breaks become `<br>`
    Single,
    /// GFM table cells: breaks become `<br>` and pipes inside spans are
    /// escaped so they do not split the cell
    Cell,
}

/// One open emphasis delimiter
#[derive(Debug, Clone, PartialEq)]
enum Delim {
    Style(String),
    Bold,
    Italic,
    Underline,
    Strike,
}

impl Delim {
    fn open(&self) -> String {
        match self {
            Delim::Style(style) => format!("<span style=\"{}\">", escape_attr(style)),
            Delim::Bold => "**".to_string(),
            Delim::Italic => "*".to_string(),
            Delim::Underline => "<u>".to_string(),
            Delim::Strike => "~~".to_string(),
        }
    }

    fn close(&self) -> &'static str {
        match self {
            Delim::Style(_) => "</span>",
            Delim::Bold => "**",
            Delim::Italic => "*",
            Delim::Underline => "</u>",
            Delim::Strike => "~~",
        }
    }
}

/// Delimiters for a set of marks, outermost first
fn delims(marks: &Marks) -> Vec<Delim> {
    let mut out = Vec::new();

    let mut style = Vec::new();
    if let Some(color) = &marks.color {
        style.push(format!("color: {}", color));
    }
    if let Some(background) = &marks.background {
        style.push(format!("background-color: {}", background));
    }
    if !style.is_empty() {
        out.push(Delim::Style(style.join("; ")));
    }

    if marks.bold {
        out.push(Delim::Bold);
    }
    if marks.italic {
        out.push(Delim::Italic);
    }
    if marks.underline {
        out.push(Delim::Underline);
    }
    if marks.strike {
        out.push(Delim::Strike);
    }

    out
}

/// Delimiters every text run below `inlines` carries
fn shared_delims(inlines: &[Inline]) -> Option<Vec<Delim>> {
    let mut shared: Option<Vec<Delim>> = None;

    for inline in inlines {
        let found = match inline {
            Inline::Text { marks, .. } => Some(delims(marks)),
            Inline::Link { children, .. } | Inline::Anchor { children, .. } => {
                shared_delims(children)
            }
            _ => None,
        };

        if let Some(found) = found {
            shared = Some(match shared {
                None => found,
                Some(prev) => prev.into_iter().filter(|d| found.contains(d)).collect(),
            });
        }
    }

    shared
}

/// Writes a run of inlines, opening and closing emphasis only where the
/// marks change. Whitespace at a mark boundary is moved outside the
/// delimiters so they stay left- and right-flanking.
pub(crate) struct InlineWriter {
    out: String,
    open: Vec<Delim>,
    /// Delimiters opened by an enclosing writer
    base: usize,
    pending_ws: String,
    mode: LineMode,
}

impl InlineWriter {
    pub fn new(mode: LineMode) -> Self {
        Self {
            out: String::new(),
            open: Vec::new(),
            base: 0,
            pending_ws: String::new(),
            mode,
        }
    }

    fn nested(&self) -> Self {
        Self {
            out: String::new(),
            open: self.open.clone(),
            base: self.open.len(),
            pending_ws: String::new(),
            mode: self.mode,
        }
    }

    /// Close delimiters that are not wanted, then open the missing ones
    fn transition(&mut self, want: &[Delim]) {
        if let Some(first_unwanted) = self.open.iter().position(|d| !want.contains(d)) {
            let keep = first_unwanted.max(self.base);
            while self.open.len() > keep {
                if let Some(delim) = self.open.pop() {
                    self.out.push_str(delim.close());
                }
            }
        }

        self.out.push_str(&self.pending_ws);
        self.pending_ws.clear();

        for delim in want {
            if !self.open.contains(delim) {
                self.out.push_str(&delim.open());
                self.open.push(delim.clone());
            }
        }
    }

    /// Emit markup that carries no marks of its own inside the current
    /// delimiters
    fn atom(&mut self, text: &str) {
        self.out.push_str(&self.pending_ws);
        self.pending_ws.clear();
        self.out.push_str(text);
    }

    fn text(&mut self, text: &str, marks: &Marks) {
        let core_start = text.len() - text.trim_start().len();
        let core = text.trim();

        if core.is_empty() {
            self.pending_ws.push_str(text);
            return;
        }

        self.pending_ws.push_str(&text[..core_start]);
        self.transition(&delims(marks));
        self.out.push_str(&escape_markdown(core));
        self.pending_ws
            .push_str(&text[core_start + core.len()..]);
    }

    pub fn write(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Text { text, marks } => self.text(text, marks),

                Inline::Code { code } => {
                    let span = self.protect_pipes(code_span(code));
                    self.atom(&span)
                }

                Inline::Image { src, alt } => {
                    let dest = self.protect_pipes(destination(src));
                    self.atom(&format!("![{}]({})", escape_markdown(alt), dest))
                }

                Inline::LineBreak => {
                    self.pending_ws.clear();
                    self.close_to_base();
                    match self.mode {
                        LineMode::Multi => self.out.push_str("\\\n"),
                        LineMode::Single | LineMode::Cell => self.out.push_str("<br>"),
                    }
                }

                Inline::Link { href, children } => {
                    let inner = self.container(children);
                    let dest = self.protect_pipes(destination(href));
                    self.atom(&format!("[{}]({})", inner, dest));
                }

                Inline::Anchor {
                    id,
                    resolved,
                    children,
                } => {
                    let inner = self.container(children);
                    let class = if *resolved {
                        "comment-anchor resolved"
                    } else {
                        "comment-anchor"
                    };
                    self.atom(&format!(
                        "<span class=\"{}\" data-comment-id=\"{}\">{}</span>",
                        class,
                        escape_attr(id),
                        inner
                    ));
                }
            }
        }
    }

    /// Write link or anchor children, hoisting the marks they all share
    /// outside the container
    fn container(&mut self, children: &[Inline]) -> String {
        if let Some(shared) = shared_delims(children) {
            let mut want: Vec<Delim> = self
                .open
                .iter()
                .filter(|d| shared.contains(d))
                .cloned()
                .collect();
            for delim in shared {
                if !want.contains(&delim) {
                    want.push(delim);
                }
            }
            self.transition(&want);
        }

        let mut inner = self.nested();
        inner.write(children);
        inner.finish_keep_whitespace()
    }

    fn protect_pipes(&self, span: String) -> String {
        match self.mode {
            LineMode::Cell => span.replace('|', "\\|"),
            _ => span,
        }
    }

    fn close_to_base(&mut self) {
        while self.open.len() > self.base {
            if let Some(delim) = self.open.pop() {
                self.out.push_str(delim.close());
            }
        }
    }

    /// Close everything; trailing whitespace is dropped
    pub fn finish(mut self) -> String {
        self.close_to_base();
        self.out
    }

    fn finish_keep_whitespace(mut self) -> String {
        self.close_to_base();
        self.out.push_str(&self.pending_ws);
        self.out
    }
}

pub(crate) fn write_inlines(inlines: &[Inline], mode: LineMode) -> String {
    let mut writer = InlineWriter::new(mode);
    writer.write(inlines);
    writer.finish()
}

/// Backslash-escape characters markdown would read as syntax
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for (i, c) in text.char_indices() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '~' | '|' => {
                out.push('\\');
                out.push(c);
            }
            '&' if looks_like_entity(&text[i..]) => out.push_str("\\&"),
            _ => out.push(c),
        }
    }

    out
}

fn looks_like_entity(rest: &str) -> bool {
    let body = &rest[1..];
    match body.find(';') {
        Some(end) if end > 0 && end <= 10 => {
            let name = &body[..end];
            let name = name.strip_prefix('#').unwrap_or(name);
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Escape characters that would start a block at the beginning of a line.
/// Leading blanks are written as character references, otherwise four of
/// them would open an indented code block and fewer would be stripped.
pub(crate) fn escape_line_starts(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let rest = line.trim_start_matches([' ', '\t']);
            let mut out = String::with_capacity(line.len());
            for c in line[..line.len() - rest.len()].chars() {
                out.push_str(if c == '\t' { "&#9;" } else { "&#32;" });
            }
            out.push_str(&escape_block_start(rest));
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_block_start(line: &str) -> String {
    match line.chars().next() {
        Some('#' | '>' | '+' | '-' | '=') => format!("\\{}", line),
        Some(c) if c.is_ascii_digit() => {
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            match line[digits..].chars().next() {
                Some('.' | ')') if digits <= 9 => {
                    format!("{}\\{}", &line[..digits], &line[digits..])
                }
                _ => line.to_string(),
            }
        }
        _ => line.to_string(),
    }
}

/// Link destination, bracketed when it holds characters a bare one cannot
fn destination(href: &str) -> String {
    if href.is_empty() || href.chars().any(|c| c.is_whitespace() || "()<>".contains(c)) {
        let escaped = href.replace('<', "\\<").replace('>', "\\>");
        format!("<{}>", escaped)
    } else {
        href.to_string()
    }
}

fn code_span(code: &str) -> String {
    let longest = longest_run(code, '`');
    let fence = "`".repeat(longest + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());

    if pad {
        format!("{} {} {}", fence, code, fence)
    } else {
        format!("{}{}{}", fence, code, fence)
    }
}

pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
