//! # Suggestion Bridge
//!
//! One call per request to the text generation service, bounded by the
//! configured timeout and never retried. Any failure, and an empty
//! answer, turns into the built-in candidates for the mode so the caller
//! always has something to show.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SuggestionServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionMode {
    Completion,
    Improvement,
    Critique,
}

impl SuggestionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionMode::Completion => "completion",
            SuggestionMode::Improvement => "improvement",
            SuggestionMode::Critique => "critique",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completion" | "complete" => Some(SuggestionMode::Completion),
            "improvement" | "improve" => Some(SuggestionMode::Improvement),
            "critique" => Some(SuggestionMode::Critique),
            _ => None,
        }
    }

    /// Candidates shown when the service cannot answer
    pub fn fallback(&self) -> [&'static str; 3] {
        match self {
            SuggestionMode::Completion => [
                "Continue with a concrete example that illustrates this point.",
                "Add a sentence explaining why this matters to the reader.",
                "Close the section with a short summary of the key idea.",
            ],
            SuggestionMode::Improvement => [
                "Shorten long sentences so each one carries a single idea.",
                "Replace passive constructions with active verbs.",
                "Move the main point to the start of the paragraph.",
            ],
            SuggestionMode::Critique => [
                "The opening could state the article's purpose more directly.",
                "Some claims would be stronger with a source or data point.",
                "Consider whether every section supports the main argument.",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "reason")]
pub enum SuggestionSource {
    Remote,
    /// Built-in candidates, with why the service was not used
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub mode: SuggestionMode,
    pub suggestions: Vec<String>,
    pub source: SuggestionSource,
}

impl SuggestionSet {
    pub fn fallback(mode: SuggestionMode, reason: impl Into<String>) -> Self {
        Self {
            mode,
            suggestions: mode.fallback().iter().map(|s| s.to_string()).collect(),
            source: SuggestionSource::Fallback(reason.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, SuggestionSource::Fallback(_))
    }
}

/// External text generation service
#[async_trait(?Send)]
pub trait SuggestionService {
    async fn suggest(
        &self,
        content: &str,
        mode: SuggestionMode,
    ) -> Result<Vec<String>, SuggestionServiceError>;
}

#[async_trait(?Send)]
impl<T: SuggestionService + ?Sized> SuggestionService for std::rc::Rc<T> {
    async fn suggest(
        &self,
        content: &str,
        mode: SuggestionMode,
    ) -> Result<Vec<String>, SuggestionServiceError> {
        (**self).suggest(content, mode).await
    }
}

pub struct SuggestionBridge<S> {
    service: S,
    timeout: Duration,
}

impl<S: SuggestionService> SuggestionBridge<S> {
    pub fn new(service: S, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn request(&self, content: &str, mode: SuggestionMode) -> SuggestionSet {
        let result = match tokio::time::timeout(self.timeout, self.service.suggest(content, mode))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SuggestionServiceError::Timeout(
                self.timeout.as_millis() as u64,
            )),
        };

        match result {
            Ok(suggestions) => {
                let suggestions: Vec<String> = suggestions
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if suggestions.is_empty() {
                    tracing::warn!("[Suggest] empty answer, using built-in candidates");
                    SuggestionSet::fallback(mode, "no suggestions returned")
                } else {
                    SuggestionSet {
                        mode,
                        suggestions,
                        source: SuggestionSource::Remote,
                    }
                }
            }
            Err(err) => {
                tracing::warn!("[Suggest] {}, using built-in candidates", err);
                SuggestionSet::fallback(mode, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    enum Behaviour {
        Answer(Vec<&'static str>),
        Fail,
        Hang,
    }

    struct FakeService {
        behaviour: Behaviour,
        calls: Cell<usize>,
    }

    impl FakeService {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl SuggestionService for FakeService {
        async fn suggest(
            &self,
            _content: &str,
            _mode: SuggestionMode,
        ) -> Result<Vec<String>, SuggestionServiceError> {
            self.calls.set(self.calls.get() + 1);
            match &self.behaviour {
                Behaviour::Answer(list) => Ok(list.iter().map(|s| s.to_string()).collect()),
                Behaviour::Fail => Err(SuggestionServiceError::Status(503)),
                Behaviour::Hang => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_remote_answer_passes_through() {
        let bridge = SuggestionBridge::new(
            FakeService::new(Behaviour::Answer(vec!["one", " two "])),
            Duration::from_secs(1),
        );
        let set = bridge.request("text", SuggestionMode::Improvement).await;

        assert_eq!(set.source, SuggestionSource::Remote);
        assert_eq!(set.suggestions, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_without_retry() {
        let bridge = SuggestionBridge::new(
            FakeService::new(Behaviour::Hang),
            Duration::from_millis(20),
        );
        let set = bridge.request("text", SuggestionMode::Completion).await;

        assert!(set.is_fallback());
        assert_eq!(set.suggestions.len(), 3);
        assert_eq!(set.suggestions[0], SuggestionMode::Completion.fallback()[0]);
        assert_eq!(bridge.service.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_error_and_empty_fall_back() {
        let bridge = SuggestionBridge::new(
            FakeService::new(Behaviour::Fail),
            Duration::from_secs(1),
        );
        let set = bridge.request("text", SuggestionMode::Critique).await;
        assert!(matches!(&set.source, SuggestionSource::Fallback(reason) if reason.contains("503")));

        let bridge = SuggestionBridge::new(
            FakeService::new(Behaviour::Answer(vec![])),
            Duration::from_secs(1),
        );
        let set = bridge.request("text", SuggestionMode::Critique).await;
        assert!(set.is_fallback());
        assert_eq!(set.suggestions.len(), 3);
    }
}
