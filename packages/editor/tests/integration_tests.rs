//! Integration tests for the editor crate

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use inkpress_common::collect_anchors;
use inkpress_editor::{
    Article, ArticleStatus, ArticleStore, AssetReference, Clock, Command, ContentAnalysis,
    ContentAnalyzer, EditSession, EditorConfig, EditorMode, EditorRuntime, ManualClock,
    MenuPosition, PersistenceError, Position, Representation, SaveRequest, Selection,
    StoredArticle, SuggestionMode, SuggestionService, SuggestionServiceError, TokioClock,
};
use inkpress_parser::ast::{BlockKind, Inline, LeafRef, Marks, Media, VideoProvider};
use inkpress_parser::{from_flat_markup, IDGenerator};
use tokio::sync::Notify;

fn session_from(source: &str, clock: Rc<dyn Clock>) -> EditSession {
    let mut ids = IDGenerator::new("integration");
    let document = from_flat_markup(source, &mut ids).document;
    let article = Article::from_representation("Draft", Representation::Structured(document));
    EditSession::with_clock(article, ids, EditorConfig::default(), clock)
}

fn session(source: &str) -> EditSession {
    session_from(source, Rc::new(ManualClock::new()))
}

fn select(session: &mut EditSession, needle: &str) {
    let selection = Selection::find(session.document().unwrap(), needle);
    assert!(selection.is_some(), "{:?} not found", needle);
    session.set_selection(selection);
}

fn caret_at_end(session: &mut EditSession, block: usize) {
    let doc = session.document().unwrap();
    let block = &doc.blocks[block];
    let len = block.inlines().map(|inlines| inlines_len(inlines)).unwrap_or(0);
    let caret = Position::new(LeafRef::block(block.id.clone()), len);
    session.set_selection(Some(Selection::caret(caret)));
}

fn inlines_len(inlines: &[Inline]) -> usize {
    inlines.iter().map(Inline::char_len).sum()
}

/// Every record has a live anchor and no anchor id appears twice
fn assert_annotation_integrity(session: &EditSession) {
    let anchors = collect_anchors(session.document().unwrap());
    let ids: HashSet<_> = anchors.iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids.len(), anchors.len(), "duplicate anchor ids");

    for record in session.comments() {
        assert!(ids.contains(&record.anchor_span_id), "orphan {}", record.id);
    }
    let records: HashSet<_> = session.comments().iter().map(|c| c.id.clone()).collect();
    assert_eq!(records.len(), session.comments().len());
}

#[test]
fn test_markdown_typed_then_structured() {
    let mut session = EditSession::blank("Post", EditorConfig::default());
    session.switch_mode(EditorMode::Markdown);
    session.set_text("# Title\n\nHello **world**.").unwrap();
    session.switch_mode(EditorMode::Structured);

    let doc = session.document().unwrap();
    assert_eq!(doc.outline(), vec!["heading", "paragraph"]);
    assert!(matches!(
        &doc.blocks[0].kind,
        BlockKind::Heading { level: 1, inlines, .. } if inlines == &vec![Inline::text("Title")]
    ));
    assert_eq!(
        doc.blocks[1].inlines().unwrap(),
        &vec![
            Inline::text("Hello "),
            Inline::styled(
                "world",
                Marks {
                    bold: true,
                    ..Marks::default()
                }
            ),
            Inline::text("."),
        ]
    );
}

#[test]
fn test_switching_to_same_mode_is_identity() {
    let mut session = session("<h2>Heading</h2><p>Some <em>text</em></p>");
    let before = session.article().representation().clone();
    let version = session.article().version;

    session.switch_mode(EditorMode::Structured);
    assert_eq!(session.article().representation(), &before);

    session.switch_mode(EditorMode::Markdown);
    let markdown = session.article().representation().clone();
    session.switch_mode(EditorMode::Markdown);
    assert_eq!(session.article().representation(), &markdown);

    assert_eq!(session.article().version, version);
    assert!(!session.save_state().dirty);
}

#[test]
fn test_comment_then_resolve() {
    let mut session = session("<p>This point is important for readers.</p>");
    select(&mut session, "important");

    let record = session.add_comment("check this").unwrap();
    assert!(!record.resolved);
    assert_eq!(record.text, "check this");
    assert_eq!(record.author_label, "Author");
    assert_eq!(session.comments().len(), 1);

    assert!(session.resolve_comment(&record.id).unwrap());
    assert_eq!(session.comments().len(), 1);
    assert!(session.comments()[0].resolved);
    assert!(collect_anchors(session.document().unwrap())[0].resolved);
    assert!(session.save_state().dirty);
}

#[test]
fn test_comment_without_selection_is_invalid() {
    let mut session = session("<p>text</p>");
    assert!(session.add_comment("x").is_err());
    caret_at_end(&mut session, 0);
    assert!(session.add_comment("x").is_err());
    assert!(session.comments().is_empty());
}

#[test]
fn test_deleting_anchored_text_evicts_comment() {
    let mut session = session("<p>keep this sentence</p><p>remove me entirely</p>");

    select(&mut session, "keep");
    let kept = session.add_comment("first").unwrap();
    select(&mut session, "remove me");
    session.add_comment("second").unwrap();
    assert_eq!(session.comments().len(), 2);
    assert_annotation_integrity(&session);

    select(&mut session, "remove me entirely");
    session.delete_backward().unwrap();

    assert_eq!(session.comments().len(), 1);
    assert_eq!(session.comments()[0].id, kept.id);
    assert_annotation_integrity(&session);

    // undo brings the text and the comment back together
    assert!(session.undo());
    assert_eq!(session.comments().len(), 2);
    assert_annotation_integrity(&session);
}

#[test]
fn test_annotation_integrity_across_edit_sequence() {
    let mut session = session("<p>alpha beta gamma</p><p>delta epsilon</p>");

    select(&mut session, "beta");
    session.add_comment("one").unwrap();
    select(&mut session, "epsilon");
    session.add_comment("two").unwrap();
    assert_annotation_integrity(&session);

    // bold across the anchor, split inside it, type into it
    select(&mut session, "alpha beta");
    session.execute(Command::Bold).unwrap();
    assert_annotation_integrity(&session);

    let selection = Selection::find(session.document().unwrap(), "eps").map(|sel| {
        let head = sel.head.clone();
        Selection::caret(head)
    });
    session.set_selection(selection);
    session.split_block().unwrap();
    assert_annotation_integrity(&session);

    session.insert_text("X").unwrap();
    assert_annotation_integrity(&session);

    // a second comment over the first one's text gets its own id
    select(&mut session, "beta");
    session.add_comment("three").unwrap();
    assert_annotation_integrity(&session);

    session.execute(Command::Heading(2)).unwrap();
    session.switch_mode(EditorMode::MarkupText);
    session.switch_mode(EditorMode::Structured);
    assert_eq!(session.comments().len(), 3);
    assert_annotation_integrity(&session);
}

#[test]
fn test_table_insertion() {
    let mut session = session("<p>Intro</p>");
    caret_at_end(&mut session, 0);

    session
        .execute_named("table", Some("3x3"))
        .unwrap();

    let doc = session.document().unwrap();
    match &doc.blocks[1].kind {
        BlockKind::Table { rows } => {
            assert_eq!(rows.len(), 3);
            assert!(rows.iter().all(|row| row.cells.len() == 3));
            assert!(rows[0].header);
            assert!(rows[1..].iter().all(|row| !row.header));
        }
        other => panic!("expected a table, got {:?}", other),
    }
    assert!(session.save_state().dirty);
}

#[test]
fn test_unknown_command_name() {
    let mut session = session("<p>x</p>");
    assert!(session.execute_named("sparkle", None).is_err());
    assert!(!session.save_state().dirty);
}

#[test]
fn test_asset_insertion() {
    let mut session = session("<p>Intro</p>");
    caret_at_end(&mut session, 0);

    session
        .on_asset_chosen(AssetReference::Video {
            url: "https://vimeo.com/76979871".to_string(),
        })
        .unwrap();

    let doc = session.document().unwrap();
    assert_eq!(
        doc.blocks[1].kind,
        BlockKind::Media {
            media: Media::Video {
                provider: VideoProvider::Vimeo,
                video_id: "76979871".to_string()
            }
        }
    );
}

#[test]
fn test_undo_redo_commands() {
    let mut session = session("<p>plain words</p>");
    select(&mut session, "words");
    session.execute(Command::Italic).unwrap();
    let styled = session.article().representation().clone();

    session.execute(Command::Undo).unwrap();
    assert_eq!(
        session.document().unwrap().blocks[0].inlines().unwrap(),
        &vec![Inline::text("plain words")]
    );

    session.execute(Command::Redo).unwrap();
    assert_eq!(session.article().representation(), &styled);
}

#[test]
fn test_analytics_are_deterministic() {
    let mut session = session("<h1>Title</h1><p>First sentence. Second one!</p>");
    let first = session.analytics().clone();

    session.switch_mode(EditorMode::Markdown);
    session.switch_mode(EditorMode::Structured);
    assert_eq!(session.analytics(), &first);
    assert_eq!(first.word_count, 5);
    assert_eq!(first.sentence_count, 2);
    assert_eq!(first.paragraph_count, 2);
    assert_eq!(first.reading_time_minutes, 1);
}

#[test]
fn test_palette_inserts_callout() {
    let mut session = session("<p>Intro</p><p></p>");
    caret_at_end(&mut session, 1);

    for c in "/warn".chars() {
        session.type_char(c, MenuPosition { x: 4.0, y: 8.0 }).unwrap();
    }
    session
        .palette_key(inkpress_editor::PaletteKey::Enter)
        .unwrap();

    let doc = session.document().unwrap();
    assert_eq!(doc.outline(), vec!["paragraph", "callout", "paragraph"]);
    assert!(!session.palette().is_open());
}

/// Store whose calls stay in flight until released
#[derive(Default)]
struct GatedStore {
    calls: RefCell<Vec<(Option<String>, SaveRequest)>>,
    gate: Notify,
    fail_next: Cell<bool>,
}

impl GatedStore {
    fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    async fn respond(
        &self,
        id: Option<&str>,
        request: &SaveRequest,
    ) -> Result<StoredArticle, PersistenceError> {
        self.calls
            .borrow_mut()
            .push((id.map(str::to_string), request.clone()));
        self.gate.notified().await;

        if self.fail_next.replace(false) {
            return Err(PersistenceError::Status {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(StoredArticle {
            id: id.unwrap_or("article-1").to_string(),
        })
    }
}

#[async_trait(?Send)]
impl ArticleStore for GatedStore {
    async fn create(&self, request: &SaveRequest) -> Result<StoredArticle, PersistenceError> {
        self.respond(None, request).await
    }

    async fn update(
        &self,
        id: &str,
        request: &SaveRequest,
    ) -> Result<StoredArticle, PersistenceError> {
        self.respond(Some(id), request).await
    }
}

struct HangingSuggestions;

#[async_trait(?Send)]
impl SuggestionService for HangingSuggestions {
    async fn suggest(
        &self,
        _content: &str,
        _mode: SuggestionMode,
    ) -> Result<Vec<String>, SuggestionServiceError> {
        std::future::pending().await
    }
}

fn runtime_with(
    source: &str,
    clock: Rc<ManualClock>,
    store: Rc<GatedStore>,
) -> EditorRuntime {
    let session = session_from(source, clock);
    EditorRuntime::new(session, store, Rc::new(HangingSuggestions))
}

#[tokio::test]
async fn test_edits_during_save_schedule_one_follow_up() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let clock = Rc::new(ManualClock::new());
            let store = Rc::new(GatedStore::default());
            let runtime = runtime_with("<p>Start</p>", clock.clone(), store.clone());
            let session = runtime.session().clone();

            {
                let mut session = session.borrow_mut();
                caret_at_end(&mut session, 0);
                session.insert_text(" typing").unwrap();
            }

            clock.set(Duration::from_millis(2_900));
            assert!(runtime.tick().is_none());

            clock.set(Duration::from_secs(3));
            let first = runtime.tick().expect("autosave due");
            tokio::task::yield_now().await;
            assert_eq!(store.calls(), 1);
            assert!(session.borrow().save_state().in_flight);

            for i in 1..=5u64 {
                clock.set(Duration::from_millis(3_000 + i * 100));
                session.borrow_mut().insert_text("!").unwrap();
                assert!(session.borrow().save_state().dirty);
                assert!(runtime.tick().is_none());
            }
            tokio::task::yield_now().await;
            assert_eq!(store.calls(), 1);

            store.release();
            first.await.unwrap();
            assert_eq!(store.calls(), 1);
            assert_eq!(session.borrow().article().id.as_deref(), Some("article-1"));
            assert!(session.borrow().save_state().dirty);

            clock.set(Duration::from_secs(10));
            let second = runtime.tick().expect("follow-up save");
            assert!(runtime.tick().is_none());
            tokio::task::yield_now().await;
            assert_eq!(store.calls(), 2);

            store.release();
            second.await.unwrap();

            let calls = store.calls.borrow();
            assert_eq!(calls[0].0, None);
            assert_eq!(calls[1].0.as_deref(), Some("article-1"));
            assert!(calls[1].1.content.contains("typing!!!!!"));
            assert!(!session.borrow().save_state().dirty);
            assert!(session.borrow().article().last_saved_at.is_some());
        })
        .await;
}

#[tokio::test]
async fn test_failed_save_keeps_buffer_and_allows_retry() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let clock = Rc::new(ManualClock::new());
            let store = Rc::new(GatedStore::default());
            let runtime = runtime_with("<p>Body</p>", clock.clone(), store.clone());
            let session = runtime.session().clone();

            store.fail_next.set(true);
            let save = runtime.save_draft().expect("explicit save starts");
            tokio::task::yield_now().await;
            store.release();
            save.await.unwrap();

            {
                let session = session.borrow();
                let state = session.save_state();
                assert!(state.dirty);
                assert!(state.last_error.as_deref().unwrap().contains("500"));
                assert_eq!(session.article().id, None);
                assert_eq!(session.plain_text(), "Body");
            }

            let retry = runtime.publish().expect("manual retry starts");
            tokio::task::yield_now().await;
            store.release();
            retry.await.unwrap();

            let session = session.borrow();
            assert_eq!(session.save_state().last_error, None);
            assert_eq!(session.article().status, ArticleStatus::Published);
            assert_eq!(store.calls.borrow()[1].1.status, ArticleStatus::Published);
        })
        .await;
}

#[tokio::test]
async fn test_response_after_session_closed_is_dropped() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let clock = Rc::new(ManualClock::new());
            let store = Rc::new(GatedStore::default());
            let runtime = runtime_with("<p>Body</p>", clock, store.clone());

            let save = runtime.save_draft().expect("explicit save starts");
            tokio::task::yield_now().await;
            drop(runtime);

            store.release();
            save.await.unwrap();
            assert_eq!(store.calls(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_suggestion_timeout_shows_fallbacks() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let mut config = EditorConfig::default();
            config.suggestion_timeout_ms = 30;
            let mut ids = IDGenerator::new("suggest");
            let article = Article::new("Draft", &mut ids);
            let session = EditSession::new(article, ids, config);
            let runtime = EditorRuntime::new(
                session,
                Rc::new(GatedStore::default()),
                Rc::new(HangingSuggestions),
            );

            let set = runtime.request_suggestions(SuggestionMode::Completion).await;
            assert!(set.is_fallback());
            assert_eq!(set.suggestions.len(), 3);
            assert_eq!(
                set.suggestions,
                SuggestionMode::Completion
                    .fallback()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
            );

            // applying a suggestion is plain insertion
            let mut session = runtime.session().borrow_mut();
            caret_at_end(&mut session, 0);
            session.apply_suggestion(&set.suggestions[0]).unwrap();
            assert_eq!(session.plain_text(), set.suggestions[0]);
            assert_eq!(session.undo_stack().undo_description(), Some("typing"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_autosave_timer_fires_once_after_quiet_interval() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let store = Rc::new(GatedStore::default());
            let session = session_from("<p>Start</p>", Rc::new(TokioClock));
            let runtime = EditorRuntime::new(session, store.clone(), Rc::new(HangingSuggestions));
            let timer = runtime.spawn_autosave_timer();

            {
                let mut session = runtime.session().borrow_mut();
                caret_at_end(&mut session, 0);
                session.insert_text(" typed").unwrap();
            }

            tokio::time::sleep(Duration::from_millis(2_900)).await;
            assert_eq!(store.calls(), 0);

            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(store.calls(), 1);
            assert!(runtime.session().borrow().save_state().in_flight);

            store.release();
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(!runtime.session().borrow().save_state().dirty);
            assert_eq!(
                runtime.session().borrow().article().id.as_deref(),
                Some("article-1")
            );

            // nothing to save, so the timer stays quiet
            tokio::time::sleep(Duration::from_secs(20)).await;
            assert_eq!(store.calls(), 1);

            drop(runtime);
            tokio::time::sleep(Duration::from_secs(5)).await;
            assert!(timer.is_finished());
        })
        .await;
}

struct FixedAnalyzer {
    score: f64,
    calls: Cell<usize>,
}

#[async_trait(?Send)]
impl ContentAnalyzer for FixedAnalyzer {
    async fn analyze(&self, content: &str) -> Result<ContentAnalysis, SuggestionServiceError> {
        self.calls.set(self.calls.get() + 1);
        Ok(ContentAnalysis {
            word_count: content.split_whitespace().count(),
            sentences: 1,
            paragraphs: 1,
            reading_time: 1,
            readability_score: self.score,
            character_count: content.chars().count(),
        })
    }
}

#[tokio::test]
async fn test_remote_readability_until_next_edit() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let analyzer = Rc::new(FixedAnalyzer {
                score: 82.5,
                calls: Cell::new(0),
            });
            let runtime = runtime_with(
                "<p>Short and clear.</p>",
                Rc::new(ManualClock::new()),
                Rc::new(GatedStore::default()),
            )
            .with_analyzer(analyzer.clone());

            assert_eq!(runtime.session().borrow().analytics().readability_score, 60.0);
            assert_eq!(runtime.refresh_readability().await.unwrap(), 82.5);
            assert_eq!(analyzer.calls.get(), 1);
            assert_eq!(runtime.session().borrow().analytics().readability_score, 82.5);

            let mut session = runtime.session().borrow_mut();
            caret_at_end(&mut session, 0);
            session.insert_text(" More words.").unwrap();
            assert_eq!(session.analytics().readability_score, 60.0);
        })
        .await;
}

#[tokio::test]
async fn test_refresh_readability_without_analyzer_keeps_fallback() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let runtime = runtime_with(
                "<p>Text.</p>",
                Rc::new(ManualClock::new()),
                Rc::new(GatedStore::default()),
            );
            assert_eq!(runtime.refresh_readability().await.unwrap(), 60.0);
        })
        .await;
}

#[cfg(feature = "http")]
#[test]
fn test_connect_uses_configured_base_url() {
    let mut config = EditorConfig::default();
    config.api_base_url = "http://cms.test/api".to_string();
    let session = EditSession::blank("Post", config);

    let runtime = EditorRuntime::connect(session);
    let session = runtime.session().borrow();
    assert_eq!(session.config().api_base_url, "http://cms.test/api");
    assert!(!session.save_state().in_flight);
}
