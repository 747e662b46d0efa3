use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_compiler_markdown::to_markdown;
use inkpress_parser::ast::{BlockKind, Document, Inline, Marks};
use inkpress_parser::{from_flat_markup, from_markdown, IDGenerator};

const ARTICLE: &str = r#"
<h1>Title</h1>
<h3>Sub heading</h3>
<p>Hello <strong>world</strong>, <em>italic</em>, <u>under</u> and <s>gone</s>.</p>
<p>A <a href="https://example.com/docs">docs <em>link</em></a> and <code>inline()</code>.</p>
<p style="text-align: right">Right aligned</p>
<ul>
  <li>one</li>
  <li>two
    <ol start="4"><li>four</li><li>five</li></ol>
  </li>
</ul>
<blockquote><p>quoted</p><p>twice</p></blockquote>
<pre><code class="language-js">const a = 1;

if (a &lt; 2) {}</code></pre>
<hr>
<table>
  <tr><th>Name</th><th>Value</th></tr>
  <tr><td>a</td><td><em>1</em></td></tr>
</table>
<div class="callout callout-warning"><p>Careful</p></div>
<div class="columns"><div class="column"><p>left</p></div><div class="column"><pre><code>x

y</code></pre></div></div>
<details open><summary>More</summary><p>hidden text</p></details>
<p>Ask <span class="comment-anchor" data-comment-id="c-1">about <strong>this</strong></span> later.</p>
<p>Colored <span style="color: #d33">warning</span> text.</p>
<figure><img src="/img/a.png" alt="diagram"></figure>
<div class="video-embed" data-provider="youtube" data-video-id="dQw4w9WgXcQ"></div>
<div class="file-attachment"><a href="/files/report.pdf" download>report.pdf</a></div>
"#;

fn from_flat(source: &str) -> Document {
    let mut ids = IDGenerator::new("flat");
    let out = from_flat_markup(source, &mut ids);
    assert!(out.is_clean(), "unexpected diagnostics: {:?}", out.diagnostics);
    out.document
}

fn from_md(source: &str) -> Document {
    let mut ids = IDGenerator::new("md");
    let out = from_markdown(source, &mut ids);
    assert!(out.is_clean(), "unexpected diagnostics: {:?}", out.diagnostics);
    out.document
}

#[test]
fn test_typed_markdown_becomes_heading_and_bold_run() {
    let doc = from_md("# Title\n\nHello **world**.");

    assert_eq!(doc.blocks.len(), 2);
    match &doc.blocks[0].kind {
        BlockKind::Heading { level, inlines, .. } => {
            assert_eq!(*level, 1);
            assert_eq!(inlines, &vec![Inline::text("Title")]);
        }
        other => panic!("expected heading, got {:?}", other),
    }
    assert_eq!(
        doc.blocks[1].inlines().unwrap(),
        &vec![
            Inline::text("Hello "),
            Inline::styled(
                "world",
                Marks {
                    bold: true,
                    ..Marks::default()
                }
            ),
            Inline::text("."),
        ]
    );
}

#[test]
fn test_flat_markup_through_markdown() {
    let doc = from_flat(ARTICLE);
    let markdown = to_markdown(&doc);
    let back = from_md(&markdown);

    assert_eq!(back.without_ids(), doc.without_ids(), "markdown was:\n{}", markdown);
}

#[test]
fn test_markdown_through_flat_markup() {
    let doc = from_flat(ARTICLE);
    let markdown = to_markdown(&doc);
    let from_markdown_doc = from_md(&markdown);

    let html = to_flat_markup(&from_markdown_doc, &CompileOptions::default());
    let back = from_flat(&html);

    assert_eq!(back.without_ids(), doc.without_ids());
}

#[test]
fn test_markdown_output_is_stable() {
    let doc = from_flat(ARTICLE);
    let first = to_markdown(&doc);
    let second = to_markdown(&from_md(&first));

    assert_eq!(first, second);
}

#[test]
fn test_block_sequence_survives_markdown() {
    let source = "## Steps\n\n1. mix\n2. bake\n\n> note\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\n---\n\n```\ncode\n```\n";
    let doc = from_md(source);
    let back = from_md(&to_markdown(&doc));

    assert_eq!(back.outline(), doc.outline());
    assert_eq!(
        doc.outline(),
        vec![
            "heading",
            "list",
            "paragraph",
            "paragraph",
            "blockquote",
            "paragraph",
            "table",
            "horizontalRule",
            "codeBlock"
        ]
    );
}
