use inkpress_parser::ast::{Block, BlockKind, Inline};
use inkpress_parser::{from_flat_markup, from_markdown, ConversionError, IDGenerator};

fn ids() -> IDGenerator {
    IDGenerator::new("malformed")
}

#[test]
fn test_unclosed_markup_recovers() {
    let out = from_flat_markup("<p>Hello <strong>world", &mut ids());

    assert_eq!(out.document.outline(), vec!["paragraph"]);
    assert!(out
        .diagnostics
        .iter()
        .any(|d| matches!(d, ConversionError::UnclosedElement { tag, .. } if tag == "strong")));
}

#[test]
fn test_broken_tag_is_text() {
    let out = from_flat_markup("<p>1 < 2 and <b</p>", &mut ids());
    let inlines = out.document.blocks[0].inlines().unwrap();
    let text: String = inlines
        .iter()
        .map(|i| match i {
            Inline::Text { text, .. } => text.clone(),
            _ => String::new(),
        })
        .collect();
    assert!(text.starts_with("1 < 2 and"));
}

#[test]
fn test_plain_text_without_tags() {
    let out = from_flat_markup("just some words", &mut ids());
    assert_eq!(
        out.document.blocks[0].inlines().unwrap(),
        &vec![Inline::text("just some words")]
    );
    assert!(out.is_clean());
}

#[test]
fn test_whitespace_only_inputs() {
    let md = from_markdown("   \n\n  ", &mut ids());
    let flat = from_flat_markup("  \n ", &mut ids());

    assert_eq!(md.document.outline(), vec!["paragraph"]);
    assert_eq!(flat.document.outline(), vec!["paragraph"]);
}

fn list_depth(blocks: &[Block]) -> usize {
    for block in blocks {
        if let BlockKind::List { items, .. } = &block.kind {
            return 1 + items.iter().map(|item| list_depth(&item.blocks)).max().unwrap_or(0);
        }
    }
    0
}

#[test]
fn test_deep_list_nesting_preserved() {
    let source = "- a\n  - b\n    - c\n      - d\n        - e\n";
    let out = from_markdown(source, &mut ids());
    assert_eq!(list_depth(&out.document.blocks), 5);
}

#[test]
fn test_block_ids_unique_across_conversions() {
    let mut gen = ids();
    let first = from_markdown("a\n\nb", &mut gen);
    let second = from_flat_markup("<p>c</p>", &mut gen);

    let mut all: Vec<&str> = first
        .document
        .blocks
        .iter()
        .chain(second.document.blocks.iter())
        .map(|b| b.id.as_str())
        .collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 3);
}

#[cfg(feature = "pretty-errors")]
#[test]
fn test_format_diagnostics_mentions_tag() {
    let source = "<p>ok</p><blink>x</blink>";
    let out = from_flat_markup(source, &mut ids());
    let rendered = inkpress_parser::format_diagnostics(source, "post.html", &out.diagnostics);
    assert!(rendered.contains("blink"));
}
