//! # Article Handle
//!
//! An `Article` is the document being edited: its persistent identity,
//! title and status, plus the one representation that is currently
//! authoritative.
//!
//! ## Representations
//!
//! ```text
//! Structured(tree) ──to_markdown──────▶ Markdown(text)
//!        ▲  └──────to_flat_markup─────▶ MarkupText(text)
//!        └──from_markdown / from_flat_markup──┘
//! ```
//!
//! Switching mode converts once from the previously authoritative form.
//! The text forms always pivot through the tree, never through each other.

use chrono::{DateTime, Utc};
use inkpress_compiler_html::{to_flat_markup, CompileOptions};
use inkpress_compiler_markdown::to_markdown;
use inkpress_parser::ast::Document;
use inkpress_parser::{from_flat_markup, from_markdown, ConversionError, IDGenerator, ParseOutput};
use serde::{Deserialize, Serialize};

/// Identity assigned by the article store on first save
pub type ArticleId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Review,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Review => "review",
            ArticleStatus::Published => "published",
        }
    }
}

/// Which representation is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorMode {
    Structured,
    Markdown,
    MarkupText,
}

impl EditorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Structured => "structured",
            EditorMode::Markdown => "markdown",
            EditorMode::MarkupText => "markupText",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Structured(Document),
    Markdown(String),
    MarkupText(String),
}

impl Representation {
    pub fn mode(&self) -> EditorMode {
        match self {
            Representation::Structured(_) => EditorMode::Structured,
            Representation::Markdown(_) => EditorMode::Markdown,
            Representation::MarkupText(_) => EditorMode::MarkupText,
        }
    }

    /// Parse the authoritative form into a tree. Text forms are parsed
    /// fresh; the structured form is cloned.
    pub fn to_tree(&self, ids: &mut IDGenerator) -> ParseOutput {
        match self {
            Representation::Structured(doc) => ParseOutput {
                document: doc.clone(),
                diagnostics: Vec::new(),
            },
            Representation::Markdown(text) => from_markdown(text, ids),
            Representation::MarkupText(text) => from_flat_markup(text, ids),
        }
    }

    /// Project a tree into the given mode
    pub fn project(document: Document, mode: EditorMode) -> Self {
        match mode {
            EditorMode::Structured => Representation::Structured(document),
            EditorMode::Markdown => Representation::Markdown(to_markdown(&document)),
            EditorMode::MarkupText => {
                Representation::MarkupText(to_flat_markup(&document, &CompileOptions::default()))
            }
        }
    }
}

/// Editable article
#[derive(Debug, Clone)]
pub struct Article {
    /// Absent until the first successful save
    pub id: Option<ArticleId>,

    pub title: String,

    pub status: ArticleStatus,

    pub last_saved_at: Option<DateTime<Utc>>,

    /// Increments on every content change
    pub version: u64,

    representation: Representation,
}

impl Article {
    /// New, never saved article with an empty body
    pub fn new(title: impl Into<String>, ids: &mut IDGenerator) -> Self {
        Self::from_representation(title, Representation::Structured(Document::empty(ids)))
    }

    pub fn from_representation(title: impl Into<String>, representation: Representation) -> Self {
        Self {
            id: None,
            title: title.into(),
            status: ArticleStatus::Draft,
            last_saved_at: None,
            version: 0,
            representation,
        }
    }

    /// Article already held by the store, content as compact flat markup
    pub fn from_stored(
        id: ArticleId,
        title: impl Into<String>,
        status: ArticleStatus,
        content: &str,
        ids: &mut IDGenerator,
    ) -> (Self, Vec<ConversionError>) {
        let parsed = from_flat_markup(content, ids);
        let mut article = Self::from_representation(title, Representation::Structured(parsed.document));
        article.id = Some(id);
        article.status = status;
        (article, parsed.diagnostics)
    }

    pub fn mode(&self) -> EditorMode {
        self.representation.mode()
    }

    pub fn representation(&self) -> &Representation {
        &self.representation
    }

    pub fn set_representation(&mut self, representation: Representation) {
        self.representation = representation;
    }

    /// Tree view when structured mode is authoritative
    pub fn document(&self) -> Option<&Document> {
        match &self.representation {
            Representation::Structured(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        match &mut self.representation {
            Representation::Structured(doc) => Some(doc),
            _ => None,
        }
    }

    /// Authoritative text when a text mode is active
    pub fn text(&self) -> Option<&str> {
        match &self.representation {
            Representation::Markdown(text) | Representation::MarkupText(text) => Some(text),
            Representation::Structured(_) => None,
        }
    }

    /// Replace the authoritative text. Returns false in structured mode.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.representation {
            Representation::Markdown(current) | Representation::MarkupText(current) => {
                *current = text.into();
                true
            }
            Representation::Structured(_) => false,
        }
    }

    /// Tree of the current content, whatever the mode
    pub fn tree(&self, ids: &mut IDGenerator) -> ParseOutput {
        self.representation.to_tree(ids)
    }

    /// Make `mode` authoritative. Switching to the current mode leaves the
    /// content untouched. Returns diagnostics from reading the previous
    /// text form.
    pub fn switch_mode(&mut self, mode: EditorMode, ids: &mut IDGenerator) -> Vec<ConversionError> {
        if mode == self.mode() {
            return Vec::new();
        }

        tracing::debug!(
            "[Article] switching {} -> {}",
            self.mode().as_str(),
            mode.as_str()
        );

        let parsed = self.representation.to_tree(ids);
        self.representation = Representation::project(parsed.document, mode);
        parsed.diagnostics
    }

    /// Content as sent to the article store: compact flat markup
    pub fn stored_content(&self, ids: &mut IDGenerator) -> String {
        match &self.representation {
            Representation::Structured(doc) => to_flat_markup(doc, &CompileOptions::compact()),
            other => to_flat_markup(&other.to_tree(ids).document, &CompileOptions::compact()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_parser::ast::BlockKind;

    #[test]
    fn test_new_article_is_one_empty_paragraph() {
        let mut ids = IDGenerator::new("doc");
        let article = Article::new("Untitled", &mut ids);

        assert_eq!(article.id, None);
        assert_eq!(article.status, ArticleStatus::Draft);
        assert_eq!(article.mode(), EditorMode::Structured);
        assert_eq!(article.document().unwrap().outline(), vec!["paragraph"]);
    }

    #[test]
    fn test_markdown_to_structured() {
        let mut ids = IDGenerator::new("doc");
        let mut article = Article::from_representation(
            "Post",
            Representation::Markdown("# Title\n\nHello **world**.".to_string()),
        );

        let diagnostics = article.switch_mode(EditorMode::Structured, &mut ids);
        assert!(diagnostics.is_empty());

        let doc = article.document().unwrap();
        assert!(matches!(doc.blocks[0].kind, BlockKind::Heading { level: 1, .. }));
        assert_eq!(doc.outline(), vec!["heading", "paragraph"]);
    }

    #[test]
    fn test_switch_to_same_mode_is_identity() {
        let mut ids = IDGenerator::new("doc");
        let text = "Some *odd*   markdown\n\n\n- x";
        let mut article =
            Article::from_representation("Post", Representation::Markdown(text.to_string()));

        article.switch_mode(EditorMode::Markdown, &mut ids);
        assert_eq!(article.text(), Some(text));
    }

    #[test]
    fn test_text_modes_pivot_through_tree() {
        let mut ids = IDGenerator::new("doc");
        let mut article = Article::from_representation(
            "Post",
            Representation::Markdown("## Sub\n\n- a\n- b\n".to_string()),
        );

        article.switch_mode(EditorMode::MarkupText, &mut ids);
        assert_eq!(
            article.text(),
            Some("<h2>Sub</h2>\n<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n")
        );

        article.switch_mode(EditorMode::Markdown, &mut ids);
        assert_eq!(article.text(), Some("## Sub\n\n- a\n- b\n"));
    }

    #[test]
    fn test_stored_content_is_compact() {
        let mut ids = IDGenerator::new("doc");
        let article = Article::from_representation(
            "Post",
            Representation::Markdown("Hello **you**".to_string()),
        );
        assert_eq!(
            article.stored_content(&mut ids),
            "<p>Hello <strong>you</strong></p>"
        );
    }
}
