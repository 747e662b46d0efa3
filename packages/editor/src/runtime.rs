//! # Runtime
//!
//! Drives the network side of a session on a single-threaded executor.
//!
//! The session lives in an `Rc<RefCell<_>>` that is only borrowed between
//! awaits, so the surface can keep editing while a save or a suggestion
//! request is pending. Spawned tasks hold a `Weak` and drop their
//! response if the session is gone by the time it arrives.
//!
//! All spawning goes through `tokio::task::spawn_local`, so these methods
//! must be called from inside a `LocalSet`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::analytics::ContentAnalyzer;
use crate::errors::SuggestionServiceError;
use crate::persistence::{save_article, ArticleStore};
use crate::session::{EditSession, PendingSave};
use crate::suggestions::{SuggestionBridge, SuggestionMode, SuggestionService, SuggestionSet};

pub struct EditorRuntime {
    session: Rc<RefCell<EditSession>>,
    store: Rc<dyn ArticleStore>,
    suggestions: SuggestionBridge<Rc<dyn SuggestionService>>,
    analyzer: Option<Rc<dyn ContentAnalyzer>>,
}

impl EditorRuntime {
    pub fn new(
        session: EditSession,
        store: Rc<dyn ArticleStore>,
        suggestions: Rc<dyn SuggestionService>,
    ) -> Self {
        let timeout = session.config().suggestion_timeout();
        Self {
            session: Rc::new(RefCell::new(session)),
            store,
            suggestions: SuggestionBridge::new(suggestions, timeout),
            analyzer: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Rc<dyn ContentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Runtime talking to the HTTP endpoints under the configured base URL
    #[cfg(feature = "http")]
    pub fn connect(session: EditSession) -> Self {
        use crate::http::{HttpArticleStore, HttpContentAnalyzer, HttpSuggestionService};

        let base_url = session.config().api_base_url.clone();
        Self::new(
            session,
            Rc::new(HttpArticleStore::new(base_url.clone())),
            Rc::new(HttpSuggestionService::new(base_url.clone())),
        )
        .with_analyzer(Rc::new(HttpContentAnalyzer::new(base_url)))
    }

    pub fn session(&self) -> &Rc<RefCell<EditSession>> {
        &self.session
    }

    /// Start the save that is due now, if any
    pub fn tick(&self) -> Option<JoinHandle<()>> {
        let pending = self.session.borrow_mut().poll_save()?;
        Some(tokio::task::spawn_local(run_saves(
            Rc::downgrade(&self.session),
            self.store.clone(),
            pending,
        )))
    }

    pub fn save_draft(&self) -> Option<JoinHandle<()>> {
        self.session.borrow_mut().save_draft();
        self.tick()
    }

    pub fn publish(&self) -> Option<JoinHandle<()>> {
        self.session.borrow_mut().publish();
        self.tick()
    }

    /// Ask the suggestion service about the current text. Always yields
    /// something to show.
    pub async fn request_suggestions(&self, mode: SuggestionMode) -> SuggestionSet {
        let content = self.session.borrow().plain_text();
        self.suggestions.request(&content, mode).await
    }

    /// Fetch a readability score for the current text. Returns the score
    /// the session now shows.
    pub async fn refresh_readability(&self) -> Result<f64, SuggestionServiceError> {
        let Some(analyzer) = self.analyzer.clone() else {
            return Ok(self.session.borrow().analytics().readability_score);
        };

        let (fingerprint, content) = self.session.borrow().readability_request();
        let analysis = analyzer.analyze(&content).await?;

        let mut session = self.session.borrow_mut();
        session.record_readability(fingerprint, analysis.readability_score);
        Ok(session.analytics().readability_score)
    }

    /// Background task firing autosaves. Ends when the session is dropped.
    pub fn spawn_autosave_timer(&self) -> JoinHandle<()> {
        let session = Rc::downgrade(&self.session);
        let store = self.store.clone();

        tokio::task::spawn_local(async move {
            loop {
                let Some(strong) = session.upgrade() else {
                    return;
                };
                let (due, quiet) = {
                    let session = strong.borrow();
                    (session.next_autosave_at(), session.config().autosave_quiet())
                };
                drop(strong);

                match due {
                    Some(due) => tokio::time::sleep_until(due.into()).await,
                    None => tokio::time::sleep(quiet.max(Duration::from_millis(50))).await,
                }

                let Some(strong) = session.upgrade() else {
                    return;
                };
                let pending = strong.borrow_mut().poll_save();
                drop(strong);
                if let Some(pending) = pending {
                    run_saves(session.clone(), store.clone(), pending).await;
                }
            }
        })
    }
}

/// Perform a save, then any save that became due while it was in flight
async fn run_saves(
    session: Weak<RefCell<EditSession>>,
    store: Rc<dyn ArticleStore>,
    mut pending: PendingSave,
) {
    loop {
        let result = save_article(
            store.as_ref(),
            pending.article_id.as_deref(),
            &pending.request,
        )
        .await;

        let Some(strong) = session.upgrade() else {
            tracing::debug!("[Save] session closed, dropping response");
            return;
        };

        let mut guard = strong.borrow_mut();
        guard.finish_save(&pending, result);
        match guard.poll_save() {
            Some(next) => pending = next,
            None => return,
        }
    }
}
