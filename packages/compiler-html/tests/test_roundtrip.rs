use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_parser::ast::Document;
use inkpress_parser::{from_flat_markup, IDGenerator};

const ARTICLE: &str = r#"
<h1>Title</h1>
<h4>Small heading</h4>
<p>Hello <strong>world</strong>, <em>italic</em>, <u>under</u> and <s>gone</s>.</p>
<p style="text-align: center">Centered with <a href="https://example.com">a <strong>link</strong></a><br>and a break</p>
<ul>
  <li>one</li>
  <li>two
    <ol start="4"><li>nested <code>code</code></li><li>more</li></ol>
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
<div class="callout callout-success"><p>Done</p></div>
<div class="columns"><div class="column"><p>left</p></div><div class="column"><p>right</p></div></div>
<details><summary>More</summary><p>hidden text</p></details>
<p>Ask <span class="comment-anchor" data-comment-id="c-1">about this</span> later.</p>
<figure><img src="/img/a.png" alt="diagram"></figure>
"#;

fn parse(source: &str) -> Document {
    let mut ids = IDGenerator::new("roundtrip");
    let out = from_flat_markup(source, &mut ids);
    assert!(out.is_clean(), "unexpected diagnostics: {:?}", out.diagnostics);
    out.document
}

#[test]
fn test_roundtrip_pretty() {
    let doc = parse(ARTICLE);
    let html = to_flat_markup(&doc, &CompileOptions::default());
    let back = parse(&html);

    assert_eq!(back.without_ids(), doc.without_ids());
}

#[test]
fn test_roundtrip_compact() {
    let doc = parse(ARTICLE);
    let html = to_flat_markup(&doc, &CompileOptions::compact());
    assert!(!html.contains('\n') || html.contains("<pre>"));

    let back = parse(&html);
    assert_eq!(back.without_ids(), doc.without_ids());
}

#[test]
fn test_output_is_stable() {
    let doc = parse(ARTICLE);
    let first = to_flat_markup(&doc, &CompileOptions::default());
    let second = to_flat_markup(&parse(&first), &CompileOptions::default());

    assert_eq!(first, second);
}

#[test]
fn test_block_sequence_preserved() {
    let doc = parse(ARTICLE);
    assert_eq!(
        doc.outline(),
        vec![
            "heading",
            "heading",
            "paragraph",
            "paragraph",
            "list",
            "paragraph",
            "paragraph",
            "list",
            "paragraph",
            "paragraph",
            "blockquote",
            "paragraph",
            "paragraph",
            "codeBlock",
            "horizontalRule",
            "table",
            "callout",
            "paragraph",
            "columns",
            "paragraph",
            "paragraph",
            "collapsible",
            "paragraph",
            "paragraph",
            "media",
        ]
    );
}
