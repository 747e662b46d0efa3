//! reqwest clients for the article store, text generation and content
//! analysis endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::analytics::{ContentAnalysis, ContentAnalyzer};
use crate::errors::{PersistenceError, SuggestionServiceError};
use crate::persistence::{ArticleStore, SaveRequest, StoredArticle};
use crate::suggestions::{SuggestionMode, SuggestionService};

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone)]
pub struct HttpArticleStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArticleStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<StoredArticle, PersistenceError> {
        let response = request
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body(status.as_u16(), response.text().await);
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<StoredArticle>()
            .await
            .map_err(|e| PersistenceError::Decode(e.to_string()))
    }
}

/// Body of a failed response, for the error shown to the author
fn error_body<E: std::fmt::Display>(status: u16, body: Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!("[Save] could not read body of {} response: {}", status, err);
            format!("unreadable response body ({})", err)
        }
    }
}

#[async_trait(?Send)]
impl ArticleStore for HttpArticleStore {
    async fn create(&self, request: &SaveRequest) -> Result<StoredArticle, PersistenceError> {
        let url = endpoint(&self.base_url, "articles");
        self.send(self.client.post(url).json(request)).await
    }

    async fn update(
        &self,
        id: &str,
        request: &SaveRequest,
    ) -> Result<StoredArticle, PersistenceError> {
        let url = endpoint(&self.base_url, &format!("articles/{}", id));
        self.send(self.client.put(url).json(request)).await
    }
}

async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
    client: &reqwest::Client,
    url: String,
    body: &B,
) -> Result<R, SuggestionServiceError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| SuggestionServiceError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SuggestionServiceError::Status(status.as_u16()));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| SuggestionServiceError::Decode(e.to_string()))
}

#[derive(Debug, Serialize)]
struct SuggestionRequest<'a> {
    content: &'a str,
    mode: SuggestionMode,
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HttpSuggestionService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSuggestionService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait(?Send)]
impl SuggestionService for HttpSuggestionService {
    async fn suggest(
        &self,
        content: &str,
        mode: SuggestionMode,
    ) -> Result<Vec<String>, SuggestionServiceError> {
        let url = endpoint(&self.base_url, "ai-assistance");
        let response: SuggestionResponse =
            post_json(&self.client, url, &SuggestionRequest { content, mode }).await?;
        Ok(response.suggestions)
    }
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpContentAnalyzer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentAnalyzer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait(?Send)]
impl ContentAnalyzer for HttpContentAnalyzer {
    async fn analyze(&self, content: &str) -> Result<ContentAnalysis, SuggestionServiceError> {
        let url = endpoint(&self.base_url, "content-analysis");
        post_json(&self.client, url, &AnalysisRequest { content }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        assert_eq!(
            endpoint("http://localhost:3000/api/", "/articles"),
            "http://localhost:3000/api/articles"
        );
        assert_eq!(
            endpoint("http://localhost:3000/api", "articles/42"),
            "http://localhost:3000/api/articles/42"
        );
    }

    #[test]
    fn test_error_body_reports_unreadable_response() {
        assert_eq!(error_body::<String>(500, Ok("boom".to_string())), "boom");
        assert_eq!(
            error_body(502, Err("connection reset")),
            "unreadable response body (connection reset)"
        );
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(SuggestionRequest {
            content: "text",
            mode: SuggestionMode::Critique,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"content": "text", "mode": "critique"}));

        let analysis: ContentAnalysis = serde_json::from_str(
            r#"{"wordCount": 3, "sentences": 1, "paragraphs": 1, "readingTime": 1,
                "readabilityScore": 81.5, "characterCount": 14}"#,
        )
        .unwrap();
        assert_eq!(analysis.readability_score, 81.5);
        assert_eq!(analysis.character_count, 14);
    }
}
