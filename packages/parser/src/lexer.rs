//! Tokenizer for flat markup (the HTML subset stored by the CMS) using logos
//!
//! Tags are lexed whole; attribute lists are split afterwards by
//! [`parse_tag`]. Anything the lexer rejects (a lone `<`, a tag cut off by
//! end of input) is handed back as an error span and treated as text by the
//! tree builder.

use logos::{Lexer, Logos};

use crate::error::SourceSpan;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    #[token("<!--", lex_comment)]
    Comment(&'src str),

    #[regex(r"<![a-zA-Z][^>]*>")]
    Declaration,

    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", lex_open_tag)]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end()
    })]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Consume everything up to and including `-->`
fn lex_comment<'s>(lex: &mut Lexer<'s, Token<'s>>) -> &'s str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            lex.bump(rest.len());
            rest
        }
    }
}

/// Extend an open tag to its closing `>`, honoring quoted attribute values.
/// A `<` outside quotes or end of input means this was not a tag.
fn lex_open_tag<'s>(lex: &mut Lexer<'s, Token<'s>>) -> Option<&'s str> {
    let rest = lex.remainder();
    let mut quote: Option<char> = None;

    for (i, ch) in rest.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '<') => return None,
            (None, '>') => {
                lex.bump(i + 1);
                return Some(lex.slice());
            }
            _ => {}
        }
    }

    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub span: SourceSpan,
}

pub fn lex(source: &str) -> impl Iterator<Item = Result<SpannedToken<'_>, LexError>> + '_ {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(SpannedToken {
                token,
                span: span.into(),
            }),
            Err(_) => Err(LexError { span: span.into() }),
        })
}

/// Open tag split into name and attributes. Names are lowercased.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl RawTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Split `<name attr="value" flag>` into its parts. Attribute values are
/// entity-decoded; valueless attributes map to an empty string.
pub fn parse_tag(raw: &str) -> RawTag {
    let inner = raw.strip_prefix('<').unwrap_or(raw);
    let inner = inner.strip_suffix('>').unwrap_or(inner);
    let mut chars = inner.char_indices().peekable();

    let mut tag = RawTag::default();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' {
            tag.name.push(c.to_ascii_lowercase());
            chars.next();
        } else {
            break;
        }
    }

    loop {
        while chars.peek().map_or(false, |(_, c)| c.is_whitespace()) {
            chars.next();
        }

        let Some(&(_, c)) = chars.peek() else {
            break;
        };

        if c == '/' {
            chars.next();
            if chars.peek().is_none() {
                tag.self_closing = true;
            }
            continue;
        }

        let mut name = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' || c == '/' {
                break;
            }
            name.push(c.to_ascii_lowercase());
            chars.next();
        }

        if name.is_empty() {
            chars.next();
            continue;
        }

        while chars.peek().map_or(false, |(_, c)| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek().map_or(false, |&(_, c)| c == '=') {
            chars.next();
            while chars.peek().map_or(false, |(_, c)| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().map(|&(_, c)| c) {
                Some(q @ ('"' | '\'')) => {
                    chars.next();
                    for (_, c) in chars.by_ref() {
                        if c == q {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while let Some(&(_, c)) = chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        value.push(c);
                        chars.next();
                    }
                }
            }
        }

        tag.attrs.push((name, decode_entities(&value)));
    }

    tag
}

/// Decode named and numeric character references
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        "copy" => Some('\u{a9}'),
        _ => None,
    }
}

/// Escape text content for flat markup
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for flat markup
pub fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        lex(source).filter_map(|r| r.ok()).map(|t| t.token).collect()
    }

    #[test]
    fn test_lex_tags_and_text() {
        let toks = tokens("<p class=\"a\">Hi <b>there</b></p>");
        assert_eq!(
            toks,
            vec![
                Token::OpenTag("<p class=\"a\">"),
                Token::Text("Hi "),
                Token::OpenTag("<b>"),
                Token::Text("there"),
                Token::CloseTag("b"),
                Token::CloseTag("p"),
            ]
        );
    }

    #[test]
    fn test_lex_quoted_gt_in_attribute() {
        let toks = tokens("<a title=\"1 > 0\" href='x'>y</a>");
        assert_eq!(toks[0], Token::OpenTag("<a title=\"1 > 0\" href='x'>"));
    }

    #[test]
    fn test_lex_comment_and_doctype() {
        let toks = tokens("<!DOCTYPE html><!-- note -->text");
        assert_eq!(
            toks,
            vec![Token::Declaration, Token::Comment(" note "), Token::Text("text")]
        );
    }

    #[test]
    fn test_lone_angle_is_error() {
        let results: Vec<_> = lex("a < b").collect();
        assert!(results.iter().any(|r| r.is_err()));
    }

    #[test]
    fn test_parse_tag_attributes() {
        let tag = parse_tag("<IMG src=\"a.png\" alt='A &amp; B' hidden data-x=1 />");
        assert_eq!(tag.name, "img");
        assert_eq!(tag.attr("src"), Some("a.png"));
        assert_eq!(tag.attr("alt"), Some("A & B"));
        assert_eq!(tag.attr("hidden"), Some(""));
        assert_eq!(tag.attr("data-x"), Some("1"));
        assert!(tag.self_closing);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &bogus; &"), "a <b> AB &bogus; &");
    }
}
