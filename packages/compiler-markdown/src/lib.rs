//! Markdown output for inkpress documents
//!
//! CommonMark with GFM tables, strikethrough and alerts. Constructs markdown
//! has no syntax for (underline, colors, comment anchors) are written as the
//! inline HTML the markdown reader understands; blocks with no markdown form
//! (columns, collapsible sections, video and file embeds, aligned text) are
//! written as single-line flat markup HTML blocks.

mod compiler;
mod inline;

pub use compiler::to_markdown;
pub use inline::escape_markdown;
