use serde::{Deserialize, Serialize};

pub mod classify;
pub mod heuristics;
pub mod retry;
pub mod urlcheck;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("Bot protection detected")]
    BotProtection,
    #[error("Suspicious page title detected")]
    SuspiciousTitle,
    #[error("Page contains insufficient content")]
    InsufficientContent,
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("search failed: {0}")]
    Search(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("failed to reduce screenshot to under 5MB even with minimum settings")]
    ScreenshotOversized,
}

impl Error {
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    Moderate,
    Strict,
}

impl SafeSearch {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "moderate" => Some(Self::Moderate),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Moderate => "moderate",
            Self::Strict => "strict",
        }
    }
}

/// Echoed back to callers in search metadata as the "search context".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub region: String,
    pub safe_search: SafeSearch,
    pub count: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            region: "zh-cn".to_string(),
            safe_search: SafeSearch::Moderate,
            count: 50,
        }
    }
}

/// Raw (title, url, description) triple as scraped by a provider, before
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Documentation,
    Social,
    Article,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub query: String,
    pub timestamp: String,
    pub result_count: usize,
    pub search_context: SearchOptions,
    pub language: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub metadata: SearchMetadata,
}

impl SearchResponse {
    /// Classify raw hits and assemble the response envelope.
    ///
    /// `timestamp` is passed in (ISO-8601) so this stays a pure function.
    pub fn assemble(
        query: &str,
        options: &SearchOptions,
        hits: Vec<SearchHit>,
        timestamp: String,
    ) -> Self {
        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|h| {
                let content_type = classify::content_type_for(&h.url);
                let source = classify::source_host(&h.url);
                SearchResult {
                    title: h.title,
                    url: h.url,
                    description: h.description,
                    content_type,
                    source,
                }
            })
            .collect();
        let topics = classify::detect_topics(results.iter().map(|r| r.title.as_str()));
        let metadata = SearchMetadata {
            query: query.to_string(),
            timestamp,
            result_count: results.len(),
            search_context: options.clone(),
            language: classify::detect_language(query).to_string(),
            topics: topics.into_iter().map(|t| t.to_string()).collect(),
        };
        Self { results, metadata }
    }
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>>;
}
