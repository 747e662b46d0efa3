//! # Edit Session
//!
//! The one object an editor surface talks to. It owns the article, the
//! id generator, the selection and every subcomponent, and runs the same
//! sequence for every input event:
//!
//! ```text
//! input ──> mutate tree (or text) ──> record undo step
//!                                  └─> content_changed
//!                                        ├─ version += 1, mark dirty
//!                                        ├─ reconcile comments
//!                                        └─ recompute analytics
//! ```
//!
//! Reconciliation and analytics only read the tree, and only run after
//! the mutation has finished.
//!
//! In Markdown and MarkupText modes the text is authoritative. Commands
//! then run against a tree read from the text, which is written back in
//! the same mode afterwards. There is no caret in the text modes, so
//! insertions land at the end.

use std::rc::Rc;
use std::time::Instant;

use inkpress_parser::ast::Document;
use inkpress_parser::{ConversionError, IDGenerator};
use serde::{Deserialize, Serialize};

use crate::analytics::{analyze, AnalyticsSnapshot, Readability, TextProjection};
use crate::annotations::{AnnotationLayer, CommentRecord};
use crate::commands::{apply_command, Command};
use crate::config::EditorConfig;
use crate::document::{Article, ArticleId, ArticleStatus, EditorMode, Representation};
use crate::editing;
use crate::errors::PersistenceError;
use crate::palette::{MenuPosition, Palette, PaletteKey, PaletteOutcome};
use crate::persistence::{
    Clock, SaveController, SaveRequest, SaveState, SaveTicket, SaveTrigger, StoredArticle,
    SystemClock,
};
use crate::selection::{Position, Selection};
use crate::undo_stack::{MutationBatch, Snapshot, UndoStack};
use crate::EditorError;

/// Asset handed over by the external asset library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssetReference {
    Image { src: String, alt: String },
    Video { url: String },
    File { href: String, name: String },
}

impl From<AssetReference> for Command {
    fn from(asset: AssetReference) -> Self {
        match asset {
            AssetReference::Image { src, alt } => Command::Image { src, alt },
            AssetReference::Video { url } => Command::Video(url),
            AssetReference::File { href, name } => Command::File { href, name },
        }
    }
}

/// A save the caller should now perform
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub ticket: SaveTicket,
    /// `None` until the article has been stored once
    pub article_id: Option<ArticleId>,
    pub request: SaveRequest,
    /// Article status when the save started
    pub status_at_poll: ArticleStatus,
}

/// Tree being edited, plus what an edit may touch besides it
struct TreeEdit<'a> {
    doc: &'a mut Document,
    selection: Option<Selection>,
    ids: &'a mut IDGenerator,
    annotations: &'a mut AnnotationLayer,
}

/// How an edit is recorded in history
enum Record<'a> {
    Typing,
    Step(&'a str),
}

pub struct EditSession {
    article: Article,
    ids: IDGenerator,
    selection: Option<Selection>,
    config: EditorConfig,
    undo: UndoStack,
    annotations: AnnotationLayer,
    palette: Palette,
    analytics: AnalyticsSnapshot,
    projection: TextProjection,
    readability: Readability,
    saves: SaveController,
    clock: Rc<dyn Clock>,
    diagnostics: Vec<ConversionError>,
}

impl EditSession {
    pub fn new(article: Article, ids: IDGenerator, config: EditorConfig) -> Self {
        Self::with_clock(article, ids, config, Rc::new(SystemClock))
    }

    pub fn with_clock(
        article: Article,
        ids: IDGenerator,
        config: EditorConfig,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let readability = Readability::new(config.readability_fallback);
        let projection = TextProjection {
            containers: Vec::new(),
            fingerprint: 0,
        };
        let analytics = analyze(&projection, config.words_per_minute, &readability);

        let mut session = Self {
            article,
            ids,
            selection: None,
            undo: UndoStack::with_max_levels(config.undo_levels),
            annotations: AnnotationLayer::new(),
            palette: Palette::new(config.trigger_char),
            analytics,
            projection,
            readability,
            saves: SaveController::new(config.autosave_quiet()),
            clock,
            diagnostics: Vec::new(),
            config,
        };
        session.refresh_derived();
        session
    }

    /// Fresh, never saved article
    pub fn blank(title: &str, config: EditorConfig) -> Self {
        let mut ids = IDGenerator::new(title);
        let article = Article::new(title, &mut ids);
        Self::new(article, ids, config)
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditorMode {
        self.article.mode()
    }

    /// Tree when structured mode is active
    pub fn document(&self) -> Option<&Document> {
        self.article.document()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.undo.break_typing();
        self.selection = selection;
    }

    pub fn comments(&self) -> &[CommentRecord] {
        self.annotations.list()
    }

    pub fn analytics(&self) -> &AnalyticsSnapshot {
        &self.analytics
    }

    pub fn save_state(&self) -> &SaveState {
        self.saves.state()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// Diagnostics from the last conversion of a text form
    pub fn diagnostics(&self) -> &[ConversionError] {
        &self.diagnostics
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.article.title = title.into();
        self.content_changed();
    }

    pub fn set_status(&mut self, status: ArticleStatus) {
        self.article.status = status;
        self.content_changed();
    }

    /// Make another representation authoritative. A no-op for the
    /// current mode.
    pub fn switch_mode(&mut self, mode: EditorMode) {
        if mode == self.mode() {
            return;
        }

        self.palette.on_focus_lost();
        self.undo.break_typing();
        self.selection = None;
        self.diagnostics = self.article.switch_mode(mode, &mut self.ids);
        if !self.diagnostics.is_empty() {
            tracing::warn!(
                "[Session] {} conversion diagnostics while switching to {}",
                self.diagnostics.len(),
                mode.as_str()
            );
        }
        self.refresh_derived();
    }

    /// Replace the authoritative text of a text mode, one keystroke's
    /// worth of typing
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        let text = text.into();
        if self.article.text() == Some(text.as_str()) {
            return Ok(());
        }

        let before = self.snapshot();
        if !self.article.set_text(text) {
            return Err(EditorError::WrongMode(self.mode().as_str()));
        }
        let after = self.snapshot();
        self.undo.record_typing(before, after);
        self.content_changed();
        Ok(())
    }

    /// Run a command against the current selection
    pub fn execute(&mut self, command: Command) -> Result<(), EditorError> {
        tracing::debug!("[Command] {}", command.name());

        match command {
            Command::Undo => {
                self.undo();
                Ok(())
            }
            Command::Redo => {
                self.redo();
                Ok(())
            }
            command => {
                let record = match command {
                    Command::Insert(_) => Record::Typing,
                    _ => Record::Step(command.name()),
                };
                self.edit_tree(record, |edit| {
                    edit.selection =
                        apply_command(edit.doc, edit.selection.as_ref(), &command, edit.ids)?;
                    Ok(())
                })
            }
        }
    }

    /// String form of [`execute`](Self::execute)
    pub fn execute_named(&mut self, name: &str, argument: Option<&str>) -> Result<(), EditorError> {
        let command = Command::from_name(name, argument)?;
        self.execute(command)
    }

    /// Type text at the caret, replacing the selection
    pub fn insert_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.execute(Command::Insert(text.to_string()))
    }

    /// Type one char. The trigger char opens the quick-insert palette at
    /// the caret; `menu` is where the host would draw it.
    pub fn type_char(&mut self, c: char, menu: MenuPosition) -> Result<(), EditorError> {
        if let Some(caret) = self.caret() {
            self.palette.on_char(c, &caret, menu);
        }
        self.insert_text(&c.to_string())
    }

    /// Backspace: deletes the selection, or the char before the caret
    pub fn delete_backward(&mut self) -> Result<(), EditorError> {
        self.require_structured()?;
        self.palette.on_backspace();

        self.edit_tree(Record::Typing, |edit| {
            let Some(selection) = edit.selection.clone() else {
                return Ok(());
            };
            let next = if selection.is_collapsed() {
                editing::delete_backward(edit.doc, &selection.head)
            } else {
                editing::delete_selection(edit.doc, &selection)
            };
            if let Some(caret) = next {
                edit.selection = Some(Selection::caret(caret));
            }
            Ok(())
        })
    }

    /// Enter: split the block at the caret
    pub fn split_block(&mut self) -> Result<(), EditorError> {
        self.require_structured()?;
        self.palette.on_focus_lost();

        self.edit_tree(Record::Step("splitBlock"), |edit| {
            let Some(selection) = edit.selection.clone() else {
                return Ok(());
            };
            let caret = if selection.is_collapsed() {
                selection.ordered(edit.doc).map(|(start, _)| start)
            } else {
                editing::delete_selection(edit.doc, &selection)
            };
            if let Some(caret) = caret {
                if let Some(next) = editing::split_block(edit.doc, &caret, edit.ids) {
                    edit.selection = Some(Selection::caret(next));
                }
            }
            Ok(())
        })
    }

    pub fn palette_key(&mut self, key: PaletteKey) -> Result<PaletteOutcome, EditorError> {
        let outcome = self.palette.on_key(key);

        if let PaletteOutcome::Selected {
            command,
            trigger,
            typed_len,
        } = &outcome
        {
            self.remove_palette_text(trigger, *typed_len)?;
            self.execute(command.clone())?;
        }

        Ok(outcome)
    }

    pub fn palette_focus_lost(&mut self) {
        self.palette.on_focus_lost();
    }

    /// Delete the trigger char and query typed for the palette
    fn remove_palette_text(&mut self, trigger: &Position, typed_len: usize) -> Result<(), EditorError> {
        let trigger_char = self.config.trigger_char;
        let trigger = trigger.clone();

        self.edit_tree(Record::Step("palette"), |edit| {
            let starts_with_trigger = edit
                .doc
                .leaf(&trigger.leaf)
                .map(|leaf| leaf.text().chars().nth(trigger.offset) == Some(trigger_char))
                .unwrap_or(false);

            if starts_with_trigger {
                let typed = Selection::within(
                    trigger.leaf.clone(),
                    trigger.offset,
                    trigger.offset + typed_len,
                );
                if let Some(caret) = editing::delete_selection(edit.doc, &typed) {
                    edit.selection = Some(Selection::caret(caret));
                }
            }
            Ok(())
        })
    }

    /// Comment on the selection
    pub fn add_comment(&mut self, text: &str) -> Result<CommentRecord, EditorError> {
        let author = self.config.author_label.clone();
        let now = self.clock.wall();

        self.edit_tree(Record::Step("addComment"), |edit| {
            edit.annotations
                .add_comment(edit.doc, edit.selection.as_ref(), &author, text, now)
        })
    }

    /// Toggle a comment's resolved flag; returns the new value
    pub fn resolve_comment(&mut self, id: &str) -> Result<bool, EditorError> {
        self.edit_tree(Record::Step("resolveComment"), |edit| {
            edit.annotations.resolve_comment(edit.doc, id)
        })
    }

    pub fn remove_comment(&mut self, id: &str) -> Result<CommentRecord, EditorError> {
        self.edit_tree(Record::Step("removeComment"), |edit| {
            edit.annotations.remove_comment(edit.doc, id)
        })
    }

    /// Insert an asset picked in the external library
    pub fn on_asset_chosen(&mut self, asset: AssetReference) -> Result<(), EditorError> {
        self.execute(asset.into())
    }

    /// Insert a suggestion exactly as typed text would be
    pub fn apply_suggestion(&mut self, text: &str) -> Result<(), EditorError> {
        self.execute(Command::Insert(text.to_string()))
    }

    /// Plain text sent to the suggestion and analysis services
    pub fn plain_text(&self) -> String {
        self.projection.text()
    }

    /// Fingerprint and text to send for a readability analysis
    pub fn readability_request(&self) -> (u32, String) {
        (self.projection.fingerprint, self.projection.text())
    }

    /// Store a remote readability score for the text it was computed on
    pub fn record_readability(&mut self, fingerprint: u32, score: f64) {
        self.readability.record(fingerprint, score);
        self.recompute_analytics();
    }

    pub fn undo(&mut self) -> bool {
        match self.undo.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.undo.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn save_draft(&mut self) {
        self.saves.request(SaveTrigger::Draft);
    }

    pub fn publish(&mut self) {
        self.saves.request(SaveTrigger::Publish);
    }

    /// When the autosave timer should next fire
    pub fn next_autosave_at(&self) -> Option<Instant> {
        self.saves.autosave_due()
    }

    /// Start the save that is due now, if any
    pub fn poll_save(&mut self) -> Option<PendingSave> {
        let ticket = self.saves.poll(self.clock.now())?;
        let status = match ticket.trigger {
            SaveTrigger::Publish => ArticleStatus::Published,
            SaveTrigger::Draft => ArticleStatus::Draft,
            SaveTrigger::Autosave => self.article.status,
        };

        Some(PendingSave {
            ticket,
            article_id: self.article.id.clone(),
            status_at_poll: self.article.status,
            request: SaveRequest {
                title: self.article.title.clone(),
                content: self.article.stored_content(&mut self.ids),
                status,
            },
        })
    }

    /// Report the outcome of a save started with [`poll_save`](Self::poll_save)
    pub fn finish_save(
        &mut self,
        pending: &PendingSave,
        result: Result<StoredArticle, PersistenceError>,
    ) -> bool {
        let now = self.clock.wall();
        let accepted = self
            .saves
            .complete(pending.ticket, result.as_ref().map(|_| now).map_err(|e| e.clone()));
        if !accepted {
            return false;
        }

        if let Ok(stored) = result {
            if self.article.id.is_none() {
                tracing::info!("[Save] article stored as {}", stored.id);
                self.article.id = Some(stored.id);
            }
            // a status set while the save was in flight goes out with the next save
            if pending.ticket.trigger != SaveTrigger::Autosave
                && self.article.status == pending.status_at_poll
            {
                self.article.status = pending.request.status;
            }
            self.article.last_saved_at = Some(now);
        }
        true
    }

    fn caret(&self) -> Option<Position> {
        self.selection
            .as_ref()
            .filter(|sel| sel.is_collapsed())
            .map(|sel| sel.head.clone())
    }

    fn require_structured(&self) -> Result<(), EditorError> {
        match self.mode() {
            EditorMode::Structured => Ok(()),
            mode => Err(EditorError::WrongMode(mode.as_str())),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            representation: self.article.representation().clone(),
            comments: self.annotations.list().to_vec(),
            selection: self.selection.clone(),
        }
    }

    /// Run an edit on the tree. In text modes the tree is read from the
    /// text and written back afterwards. A failed edit leaves everything
    /// as it was.
    fn edit_tree<T>(
        &mut self,
        record: Record<'_>,
        edit: impl FnOnce(&mut TreeEdit<'_>) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let before = self.snapshot();
        let mode = self.article.mode();

        let value = match self.article.document_mut() {
            Some(doc) => {
                let mut scratch = doc.clone();
                let mut annotations = self.annotations.clone();
                let mut tree = TreeEdit {
                    doc: &mut scratch,
                    selection: self.selection.clone(),
                    ids: &mut self.ids,
                    annotations: &mut annotations,
                };
                let value = edit(&mut tree)?;
                self.selection = tree.selection;
                *doc = scratch;
                self.annotations = annotations;
                value
            }
            None => {
                let mut doc = self.article.tree(&mut self.ids).document;
                let mut annotations = self.annotations.clone();
                let mut tree = TreeEdit {
                    doc: &mut doc,
                    selection: None,
                    ids: &mut self.ids,
                    annotations: &mut annotations,
                };
                let value = edit(&mut tree)?;
                self.article
                    .set_representation(Representation::project(doc, mode));
                self.annotations = annotations;
                value
            }
        };

        let after = self.snapshot();
        let changed = after.representation != before.representation
            || after.comments != before.comments;

        if changed {
            match record {
                Record::Typing => self.undo.record_typing(before, after),
                Record::Step(description) => self
                    .undo
                    .record(MutationBatch::new(before, after).with_description(description)),
            }
            self.content_changed();
        } else {
            self.undo.break_typing();
        }

        Ok(value)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let mode = self.mode();
        if snapshot.representation.mode() == mode {
            self.article.set_representation(snapshot.representation);
            self.selection = snapshot.selection;
        } else {
            // history from before a mode switch is replayed in the current mode
            let tree = snapshot.representation.to_tree(&mut self.ids).document;
            self.article
                .set_representation(Representation::project(tree, mode));
            self.selection = None;
        }
        self.annotations.restore(snapshot.comments);
        self.content_changed();
    }

    fn content_changed(&mut self) {
        self.article.version += 1;
        self.saves.mark_edited(self.clock.now());
        self.refresh_derived();
    }

    /// Reconcile comments and recompute analytics against the current
    /// content
    fn refresh_derived(&mut self) {
        let parsed;
        let doc = match self.article.document() {
            Some(doc) => doc,
            None => {
                // ids of a read-only scan never reach the article
                let mut scan = IDGenerator::from_seed("scan".to_string());
                parsed = self.article.tree(&mut scan).document;
                &parsed
            }
        };

        self.annotations.reconcile(doc);
        self.projection = TextProjection::of(doc);
        self.recompute_analytics();
    }

    fn recompute_analytics(&mut self) {
        self.analytics = analyze(
            &self.projection,
            self.config.words_per_minute,
            &self.readability,
        );
    }
}
