//! # Persistence Controller
//!
//! ```text
//! clean --edit--> dirty --quiet interval | explicit save--> saving
//! saving --success--> clean (last_saved_at = now)
//! saving --failure--> dirty (last_error = msg, autosave suspended)
//! ```
//!
//! The controller never performs I/O. Callers feed it time with
//! [`SaveController::poll`], start the call it hands back a
//! [`SaveTicket`] for, and report the outcome with
//! [`SaveController::complete`]. At most one ticket is out at a time;
//! edits made meanwhile are picked up by the next save.

use std::cell::Cell;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::ArticleStatus;
use crate::errors::PersistenceError;

/// Source of time for the session
pub trait Clock {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock following tokio's timer, so a paused runtime moves it as well
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    start_wall: DateTime<Utc>,
    elapsed: Cell<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            start_wall: Utc::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Move to `at` after the clock was created
    pub fn set(&self, at: Duration) {
        self.elapsed.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn wall(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed.get())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.start_wall + elapsed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub dirty: bool,
    pub in_flight: bool,
    pub last_error: Option<String>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveTrigger {
    Autosave,
    Draft,
    Publish,
}

impl SaveTrigger {
    fn rank(self) -> u8 {
        match self {
            SaveTrigger::Autosave => 0,
            SaveTrigger::Draft => 1,
            SaveTrigger::Publish => 2,
        }
    }
}

/// Identifies one save call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    pub id: u64,
    pub trigger: SaveTrigger,
}

#[derive(Debug, Clone)]
pub struct SaveController {
    state: SaveState,
    quiet: Duration,
    last_edit: Option<Instant>,
    in_flight: Option<SaveTicket>,
    queued: Option<SaveTrigger>,
    /// Set after a failure; cleared by the next edit or explicit save
    suspended: bool,
    next_ticket: u64,
}

impl SaveController {
    pub fn new(quiet: Duration) -> Self {
        Self {
            state: SaveState::default(),
            quiet,
            last_edit: None,
            in_flight: None,
            queued: None,
            suspended: false,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<SaveTicket> {
        self.in_flight
    }

    /// An edit happened at `now`; restarts the quiet interval
    pub fn mark_edited(&mut self, now: Instant) {
        self.state.dirty = true;
        self.last_edit = Some(now);
        self.suspended = false;
    }

    /// Ask for an explicit save. It starts on the next poll, or after
    /// the save in flight resolves. Publish wins over draft.
    pub fn request(&mut self, trigger: SaveTrigger) {
        self.suspended = false;
        self.queued = match self.queued {
            Some(queued) if queued.rank() >= trigger.rank() => Some(queued),
            _ => Some(trigger),
        };
    }

    /// When the autosave would fire, if one is pending
    pub fn autosave_due(&self) -> Option<Instant> {
        if !self.state.dirty || self.suspended || self.in_flight.is_some() {
            return None;
        }
        self.last_edit.map(|at| at + self.quiet)
    }

    /// The save to start now, if any
    pub fn poll(&mut self, now: Instant) -> Option<SaveTicket> {
        if self.in_flight.is_some() {
            return None;
        }

        if let Some(trigger) = self.queued.take() {
            return Some(self.begin(trigger));
        }

        match self.autosave_due() {
            Some(due) if due <= now => Some(self.begin(SaveTrigger::Autosave)),
            _ => None,
        }
    }

    fn begin(&mut self, trigger: SaveTrigger) -> SaveTicket {
        self.next_ticket += 1;
        let ticket = SaveTicket {
            id: self.next_ticket,
            trigger,
        };

        self.in_flight = Some(ticket);
        self.state.in_flight = true;
        self.state.dirty = false;
        tracing::debug!("[Save] begin #{} ({:?})", ticket.id, trigger);

        ticket
    }

    /// Record the outcome of a save. Returns false for a ticket that is
    /// not the one in flight, whose outcome is dropped.
    pub fn complete(
        &mut self,
        ticket: SaveTicket,
        result: Result<DateTime<Utc>, PersistenceError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::debug!("[Save] dropping stale response for #{}", ticket.id);
            return false;
        }

        self.in_flight = None;
        self.state.in_flight = false;

        match result {
            Ok(at) => {
                tracing::info!("[Save] #{} stored", ticket.id);
                self.state.last_saved_at = Some(at);
                self.state.last_error = None;
            }
            Err(err) => {
                tracing::warn!("[Save] #{} failed: {}", ticket.id, err);
                self.state.dirty = true;
                self.state.last_error = Some(err.to_string());
                self.suspended = true;
            }
        }

        true
    }
}

/// Body of a save call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
}

/// Identity the article store answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
}

/// External article store
#[async_trait(?Send)]
pub trait ArticleStore {
    async fn create(&self, request: &SaveRequest) -> Result<StoredArticle, PersistenceError>;

    async fn update(
        &self,
        id: &str,
        request: &SaveRequest,
    ) -> Result<StoredArticle, PersistenceError>;
}

/// Create on the first save, update once the article has an identity
pub async fn save_article(
    store: &dyn ArticleStore,
    id: Option<&str>,
    request: &SaveRequest,
) -> Result<StoredArticle, PersistenceError> {
    match id {
        Some(id) => store.update(id, request).await,
        None => store.create(request).await,
    }
}
