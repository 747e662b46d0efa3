//! Flat markup output for inkpress documents
//!
//! Writes the HTML subset the CMS stores and the flat-markup reader in
//! `inkpress-parser` understands. Ids are never written.

mod compiler;

pub use compiler::{inlines_to_flat_markup, to_flat_markup, CompileOptions};
