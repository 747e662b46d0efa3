//! # Inkpress Parser
//!
//! Readers for the two flat encodings of an article body, producing the
//! structured markup tree every other crate works on.
//!
//! ```text
//! markdown ──pulldown-cmark──┐
//!                            ├──> ast::Document (blocks + inlines)
//! flat markup ──logos──tree──┘
//! ```
//!
//! Both readers are total: malformed input never fails, it is recovered as
//! plain text and reported through [`ParseOutput::diagnostics`]. Both also
//! take the session's [`IDGenerator`] so block ids stay unique across
//! repeated conversions.

pub mod ast;
pub mod error;
pub mod id_generator;
pub mod lexer;
pub mod markdown;
pub mod markup;

pub use ast::{Block, BlockKind, Document, Inline, LeafRef, Marks};
pub use error::{ConversionError, ParseOutput, SourceSpan};
pub use id_generator::{fingerprint, get_document_id, IDGenerator};
pub use markdown::from_markdown;
pub use markup::from_flat_markup;

#[cfg(feature = "pretty-errors")]
pub use error::format_diagnostics;
