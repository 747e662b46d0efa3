//! # Inkpress Editor
//!
//! Article editing core: one session object per open article.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: markdown / flat markup → tree       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Mode switching between representations   │
//! │  - Commands, typing, undo/redo              │
//! │  - Comment anchors and records              │
//! │  - Quick-insert palette                     │
//! │  - Analytics after every change             │
//! │  - Save state machine                       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ runtime: saves, suggestions, analysis over  │
//! │ HTTP on a single-threaded executor          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth** in structured mode; the
//!    rendered surface is a view of it
//! 2. **One authoritative representation**: the text modes pivot through
//!    the tree, never through each other
//! 3. **No I/O in the session**: saves and service calls are handed out
//!    as data and their outcomes fed back in
//! 4. **Nothing is fatal**: bad input degrades to plain text, failed
//!    saves stay dirty, failed suggestions fall back
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inkpress_editor::{Command, EditSession, EditorConfig, Selection};
//!
//! let mut session = EditSession::blank("Release notes", EditorConfig::default());
//! let selection = Selection::find(session.document().unwrap(), "notes");
//! session.set_selection(selection);
//! session.execute(Command::Bold)?;
//!
//! if let Some(pending) = session.poll_save() {
//!     // send pending.request, then
//!     session.finish_save(&pending, result);
//! }
//! ```

pub mod analytics;
pub mod annotations;
pub mod commands;
pub mod config;
pub mod document;
pub mod editing;
mod errors;
pub mod inline_ops;
pub mod palette;
pub mod persistence;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod suggestions;
mod undo_stack;

#[cfg(feature = "http")]
pub mod http;

pub use analytics::{AnalyticsSnapshot, ContentAnalysis, ContentAnalyzer};
pub use annotations::{AnnotationLayer, CommentRecord};
pub use commands::{apply_command, Command};
pub use config::EditorConfig;
pub use document::{Article, ArticleId, ArticleStatus, EditorMode, Representation};
pub use errors::{EditorError, PersistenceError, SuggestionServiceError};
pub use palette::{MenuPosition, PaletteKey, PaletteOutcome};
pub use persistence::{
    ArticleStore, Clock, ManualClock, SaveRequest, SaveState, SaveTrigger, StoredArticle,
    SystemClock, TokioClock,
};
pub use runtime::EditorRuntime;
pub use selection::{Position, Selection};
pub use session::{AssetReference, EditSession, PendingSave};
pub use suggestions::{SuggestionMode, SuggestionService, SuggestionSet, SuggestionSource};
pub use undo_stack::{MutationBatch, Snapshot, UndoStack};

// Re-export common types for convenience
pub use inkpress_parser::ast::Document;
