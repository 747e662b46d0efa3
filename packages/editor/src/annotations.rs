//! # Annotation Layer
//!
//! Comments anchored to inline spans of the tree.
//!
//! A comment is an anchor inline in the document plus a `CommentRecord`
//! kept here. The anchor id and the record id are the same string. The
//! records are the layer's only state: anchors live in the tree and are
//! edited with it, so after every content change `reconcile` evicts the
//! records whose anchor is gone.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use inkpress_common::{anchor_ids, set_anchor_resolved, unwrap_anchor};
use inkpress_parser::ast::{Document, Inline, Leaf, LeafMut};
use inkpress_parser::IDGenerator;
use serde::{Deserialize, Serialize};

use crate::inline_ops::wrap_range;
use crate::selection::Selection;
use crate::EditorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub anchor_span_id: String,
    pub author_label: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    comments: Vec<CommentRecord>,
    ids: IDGenerator,
}

impl Default for AnnotationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            ids: IDGenerator::from_seed("comment".to_string()),
        }
    }

    /// Comments in creation order
    pub fn list(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn get(&self, id: &str) -> Option<&CommentRecord> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Replace the records wholesale, used when restoring history
    pub fn restore(&mut self, comments: Vec<CommentRecord>) {
        self.comments = comments;
    }

    /// Wrap the selection in a new anchor and record the comment.
    ///
    /// A selection spanning several blocks is clamped to its first
    /// non-empty piece of text.
    pub fn add_comment(
        &mut self,
        doc: &mut Document,
        selection: Option<&Selection>,
        author_label: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<CommentRecord, EditorError> {
        let selection =
            selection.ok_or_else(|| EditorError::invalid_selection("nothing selected"))?;
        if selection.is_collapsed() {
            return Err(EditorError::invalid_selection("selection is empty"));
        }

        let ranges: Vec<_> = selection
            .leaf_ranges(doc)
            .into_iter()
            .filter(|range| !range.is_empty())
            .filter(|range| matches!(doc.leaf(&range.leaf), Some(Leaf::Inlines(_))))
            .collect();

        let Some(range) = ranges.first().cloned() else {
            return Err(EditorError::invalid_selection(
                "selection holds no text a comment can anchor to",
            ));
        };
        if ranges.len() > 1 {
            tracing::warn!(
                "[Comment] selection spans {} blocks, anchoring to the first",
                ranges.len()
            );
        }

        let taken = anchor_ids(doc);
        let id = self.ids.new_unique_id(|candidate| taken.contains(candidate));

        let Some(LeafMut::Inlines(inlines)) = doc.leaf_mut(&range.leaf) else {
            return Err(EditorError::invalid_selection("selected block is gone"));
        };
        let anchor_id = id.clone();
        wrap_range(inlines, range.start, range.end, |children| Inline::Anchor {
            id: anchor_id,
            resolved: false,
            children,
        });

        let record = CommentRecord {
            id: id.clone(),
            anchor_span_id: id,
            author_label: author_label.to_string(),
            text: text.to_string(),
            created_at,
            resolved: false,
        };
        tracing::debug!("[Comment] added {}", record.id);
        self.comments.push(record.clone());

        Ok(record)
    }

    /// Flip the resolved flag on the record and the anchor marker.
    /// Returns the new value.
    pub fn resolve_comment(&mut self, doc: &mut Document, id: &str) -> Result<bool, EditorError> {
        let record = self
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EditorError::CommentNotFound(id.to_string()))?;

        record.resolved = !record.resolved;
        set_anchor_resolved(doc, &record.anchor_span_id, record.resolved);
        tracing::debug!("[Comment] {} resolved={}", id, record.resolved);

        Ok(record.resolved)
    }

    /// Delete the record and unwrap its anchor, keeping the text
    pub fn remove_comment(
        &mut self,
        doc: &mut Document,
        id: &str,
    ) -> Result<CommentRecord, EditorError> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| EditorError::CommentNotFound(id.to_string()))?;

        let record = self.comments.remove(index);
        unwrap_anchor(doc, &record.anchor_span_id);
        tracing::debug!("[Comment] removed {}", id);

        Ok(record)
    }

    /// Evict records whose anchor no longer exists. Reads the tree only.
    pub fn reconcile(&mut self, doc: &Document) -> Vec<CommentRecord> {
        if self.comments.is_empty() {
            return Vec::new();
        }

        let live: HashSet<String> = anchor_ids(doc);
        let (kept, evicted): (Vec<_>, Vec<_>) = self
            .comments
            .drain(..)
            .partition(|c| live.contains(&c.anchor_span_id));
        self.comments = kept;

        for record in &evicted {
            tracing::info!("[Comment] evicted {}, its anchor is gone", record.id);
        }
        evicted
    }
}
