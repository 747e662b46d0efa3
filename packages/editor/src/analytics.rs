//! # Analytics Engine
//!
//! Counts over the plain-text projection of the tree, recomputed after
//! every content change. One pass, linear in the text length.
//!
//! The readability score is the one value computed elsewhere: a remote
//! analysis is kept together with the fingerprint of the text it scored,
//! and only used while the text still has that fingerprint.

use async_trait::async_trait;
use inkpress_common::text_containers;
use inkpress_parser::ast::Document;
use inkpress_parser::fingerprint;
use serde::{Deserialize, Serialize};

use crate::errors::SuggestionServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub reading_time_minutes: usize,
    pub readability_score: f64,
}

/// Response of the content-analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub sentences: usize,
    #[serde(default)]
    pub paragraphs: usize,
    #[serde(default)]
    pub reading_time: usize,
    pub readability_score: f64,
    #[serde(default)]
    pub character_count: usize,
}

#[async_trait(?Send)]
pub trait ContentAnalyzer {
    async fn analyze(&self, content: &str) -> Result<ContentAnalysis, SuggestionServiceError>;
}

/// Plain-text projection with its fingerprint
#[derive(Debug, Clone, PartialEq)]
pub struct TextProjection {
    pub containers: Vec<String>,
    pub fingerprint: u32,
}

impl TextProjection {
    pub fn of(doc: &Document) -> Self {
        let containers = text_containers(doc);
        let fingerprint = fingerprint(&containers.join("\n"));
        Self {
            containers,
            fingerprint,
        }
    }

    pub fn text(&self) -> String {
        self.containers.join("\n")
    }
}

/// Last remote readability score and the text it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Readability {
    fallback: f64,
    remote: Option<(u32, f64)>,
}

impl Readability {
    pub fn new(fallback: f64) -> Self {
        Self {
            fallback,
            remote: None,
        }
    }

    pub fn record(&mut self, fingerprint: u32, score: f64) {
        self.remote = Some((fingerprint, score));
    }

    pub fn score_for(&self, fingerprint: u32) -> f64 {
        match self.remote {
            Some((scored, score)) if scored == fingerprint => score,
            _ => self.fallback,
        }
    }
}

/// Compute the snapshot for a projection
pub fn analyze(
    projection: &TextProjection,
    words_per_minute: u32,
    readability: &Readability,
) -> AnalyticsSnapshot {
    let mut word_count = 0;
    let mut char_count = 0;
    let mut sentence_count = 0;
    let mut paragraph_count = 0;

    for container in &projection.containers {
        let mut in_word = false;
        let mut in_terminal = false;
        let mut has_text = false;

        for c in container.chars() {
            char_count += 1;

            if c.is_whitespace() {
                in_word = false;
            } else {
                has_text = true;
                if !in_word {
                    word_count += 1;
                    in_word = true;
                }
            }

            let terminal = matches!(c, '.' | '!' | '?');
            if terminal && !in_terminal {
                sentence_count += 1;
            }
            in_terminal = terminal;
        }

        if has_text {
            paragraph_count += 1;
        }
    }

    let per_minute = words_per_minute.max(1) as usize;

    AnalyticsSnapshot {
        word_count,
        char_count,
        sentence_count,
        paragraph_count: paragraph_count.max(1),
        reading_time_minutes: word_count.div_ceil(per_minute),
        readability_score: readability.score_for(projection.fingerprint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_parser::{from_flat_markup, IDGenerator};

    fn project(source: &str) -> TextProjection {
        let mut ids = IDGenerator::new("stats");
        TextProjection::of(&from_flat_markup(source, &mut ids).document)
    }

    #[test]
    fn test_counts() {
        let projection = project(
            "<h1>Title</h1><p>One sentence. Two <strong>sentences</strong>?! Three...</p><p></p>",
        );
        let snapshot = analyze(&projection, 200, &Readability::new(60.0));

        assert_eq!(snapshot.word_count, 6);
        assert_eq!(snapshot.sentence_count, 3);
        assert_eq!(snapshot.paragraph_count, 2);
        assert_eq!(snapshot.char_count, 5 + 38);
        assert_eq!(snapshot.reading_time_minutes, 1);
        assert_eq!(snapshot.readability_score, 60.0);
    }

    #[test]
    fn test_empty_document_floors() {
        let projection = project("");
        let snapshot = analyze(&projection, 200, &Readability::new(60.0));

        assert_eq!(snapshot.word_count, 0);
        assert_eq!(snapshot.sentence_count, 0);
        assert_eq!(snapshot.paragraph_count, 1);
        assert_eq!(snapshot.reading_time_minutes, 0);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let words = vec!["word"; 201].join(" ");
        let projection = project(&format!("<p>{}</p>", words));
        let snapshot = analyze(&projection, 200, &Readability::new(60.0));

        assert_eq!(snapshot.word_count, 201);
        assert_eq!(snapshot.reading_time_minutes, 2);
    }

    #[test]
    fn test_remote_score_only_for_matching_text() {
        let projection = project("<p>Some text.</p>");
        let mut readability = Readability::new(60.0);
        readability.record(projection.fingerprint, 72.5);

        assert_eq!(analyze(&projection, 200, &readability).readability_score, 72.5);

        let changed = project("<p>Some other text.</p>");
        assert_eq!(analyze(&changed, 200, &readability).readability_score, 60.0);
    }

    #[test]
    fn test_deterministic() {
        let projection = project("<p>Same input. Same output!</p>");
        let readability = Readability::new(60.0);
        assert_eq!(
            analyze(&projection, 200, &readability),
            analyze(&projection, 200, &readability)
        );
    }
}
