use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_compiler_markdown::to_markdown;
use inkpress_parser::ast::Document;
use inkpress_parser::{
    from_flat_markup, from_markdown, get_document_id, ConversionError, IDGenerator, ParseOutput,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub struct ConvertResult {
    output: String,
    diagnostics: Vec<String>,
}

#[wasm_bindgen]
impl ConvertResult {
    #[wasm_bindgen(getter)]
    pub fn output(&self) -> String {
        self.output.clone()
    }

    /// One message per segment that was kept as plain text
    #[wasm_bindgen(getter)]
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.clone()
    }
}

#[derive(Serialize)]
struct ParsedTree<'a> {
    document: &'a Document,
    diagnostics: &'a [ConversionError],
}

fn tree_json(parsed: &ParseOutput) -> Result<String, JsValue> {
    let tree = ParsedTree {
        document: &parsed.document,
        diagnostics: &parsed.diagnostics,
    };
    serde_json::to_string(&tree)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn read_tree(tree: &str) -> Result<Document, JsValue> {
    serde_json::from_str(tree).map_err(|e| JsValue::from_str(&format!("Invalid tree: {}", e)))
}

fn converted(output: String, parsed: &ParseOutput) -> ConvertResult {
    ConvertResult {
        output,
        diagnostics: parsed.diagnostics.iter().map(|d| d.to_string()).collect(),
    }
}

/// Parse markdown and return `{ document, diagnostics }` as JSON
#[wasm_bindgen(js_name = fromMarkdown)]
pub fn from_markdown_js(source: &str, file_path: &str) -> Result<String, JsValue> {
    let mut ids = IDGenerator::new(file_path);
    tree_json(&from_markdown(source, &mut ids))
}

/// Parse flat markup and return `{ document, diagnostics }` as JSON
#[wasm_bindgen(js_name = fromFlatMarkup)]
pub fn from_flat_markup_js(source: &str, file_path: &str) -> Result<String, JsValue> {
    let mut ids = IDGenerator::new(file_path);
    tree_json(&from_flat_markup(source, &mut ids))
}

/// Write a JSON document tree as markdown
#[wasm_bindgen(js_name = toMarkdown)]
pub fn to_markdown_js(tree: &str) -> Result<String, JsValue> {
    Ok(to_markdown(&read_tree(tree)?))
}

/// Write a JSON document tree as flat markup
#[wasm_bindgen(js_name = toFlatMarkup)]
pub fn to_flat_markup_js(tree: &str, pretty: bool) -> Result<String, JsValue> {
    let options = if pretty {
        CompileOptions::default()
    } else {
        CompileOptions::compact()
    };
    Ok(to_flat_markup(&read_tree(tree)?, &options))
}

#[wasm_bindgen(js_name = markdownToFlatMarkup)]
pub fn markdown_to_flat_markup_js(source: &str) -> ConvertResult {
    let mut ids = IDGenerator::new("markdown");
    let parsed = from_markdown(source, &mut ids);
    converted(
        to_flat_markup(&parsed.document, &CompileOptions::compact()),
        &parsed,
    )
}

#[wasm_bindgen(js_name = flatMarkupToMarkdown)]
pub fn flat_markup_to_markdown_js(source: &str) -> ConvertResult {
    let mut ids = IDGenerator::new("markup");
    let parsed = from_flat_markup(source, &mut ids);
    converted(to_markdown(&parsed.document), &parsed)
}

/// Get the document id for an article key
#[wasm_bindgen(js_name = getDocumentId)]
pub fn get_document_id_js(key: &str) -> String {
    get_document_id(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_flat_markup() {
        let result = markdown_to_flat_markup_js("# Title\n\nSome *text*\n");
        assert_eq!(result.output(), "<h1>Title</h1><p>Some <em>text</em></p>");
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn test_flat_markup_to_markdown_reports_unknown_elements() {
        let result = flat_markup_to_markdown_js("<p>Hello</p><marquee>there</marquee>");
        assert_eq!(result.output(), "Hello\n\nthere\n");
        assert_eq!(result.diagnostics().len(), 1);
    }

    #[test]
    fn test_tree_json_round_trip() {
        let json = from_markdown_js("A paragraph\n", "/posts/a.md").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["diagnostics"].as_array().unwrap().is_empty());

        let tree = serde_json::to_string(&value["document"]).unwrap();
        assert_eq!(to_markdown_js(&tree).unwrap(), "A paragraph\n");
        assert_eq!(
            to_flat_markup_js(&tree, false).unwrap(),
            "<p>A paragraph</p>"
        );
    }

    #[test]
    fn test_document_id() {
        let id = get_document_id_js("posts/a.md");
        assert_eq!(id, get_document_id_js("posts/a.md"));
    }
}
