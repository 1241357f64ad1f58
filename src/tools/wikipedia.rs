//! Wikipedia lookup via the MediaWiki action API.

use super::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const NAME: &str = "Wikipedia";

const DESCRIPTION: &str = "Useful for answering factual questions using Wikipedia. \
Always try this for definitions, historical facts, or well-known info.";

/// Returned when the search yields no page with text.
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// MediaWiki rejects very long search strings.
const MAX_QUERY_CHARS: usize = 300;

/// Encyclopedia lookup returning page summaries capped to a character budget.
#[derive(Debug, Clone)]
pub struct WikipediaTool {
    api_url: String,
    top_k: usize,
    max_chars: usize,
    http: reqwest::Client,
}

// -- MediaWiki response types (formatversion=2) ------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

impl WikipediaTool {
    pub fn new(api_url: &str, top_k: usize, max_chars: usize, http: reqwest::Client) -> Self {
        Self {
            api_url: api_url.to_string(),
            top_k,
            max_chars,
            http,
        }
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = self.top_k.to_string();
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ToolError::backend(NAME, format!("search failed ({}): {}", status, body)));
        }

        let body = resp.text().await?;
        parse_search_titles(&body)
    }

    async fn page_summary(&self, title: &str) -> Result<Option<(String, String)>, ToolError> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ToolError::backend(NAME, format!("extract failed ({}): {}", status, body)));
        }

        let body = resp.text().await?;
        parse_page_summary(&body)
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query: String = input.trim().chars().take(MAX_QUERY_CHARS).collect();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("empty Wikipedia query".into()));
        }

        let titles = self.search_titles(&query).await?;
        debug!("Wikipedia search '{}' -> {:?}", query, titles);

        let mut summaries = Vec::new();
        for title in titles.iter().take(self.top_k) {
            if let Some((page, extract)) = self.page_summary(title).await? {
                summaries.push(format!("Page: {}\nSummary: {}", page, extract));
            }
        }

        if summaries.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        Ok(truncate_chars(&summaries.join("\n\n"), self.max_chars))
    }
}

fn parse_search_titles(body: &str) -> Result<Vec<String>, ToolError> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ToolError::backend(NAME, format!("unparsable search response: {}", e)))?;
    Ok(parsed
        .query
        .map(|q| q.search.into_iter().map(|h| h.title).collect())
        .unwrap_or_default())
}

fn parse_page_summary(body: &str) -> Result<Option<(String, String)>, ToolError> {
    let parsed: ExtractResponse = serde_json::from_str(body)
        .map_err(|e| ToolError::backend(NAME, format!("unparsable extract response: {}", e)))?;
    let page = parsed
        .query
        .and_then(|q| q.pages.into_iter().find(|p| !p.missing));
    Ok(page.and_then(|p| {
        let extract = p.extract?.trim().to_string();
        (!extract.is_empty()).then_some((p.title, extract))
    }))
}

/// Keep at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_titles_from_response() {
        let body = r#"{"batchcomplete":true,"query":{"searchinfo":{"totalhits":2},
            "search":[{"ns":0,"title":"Alan Turing","pageid":1208},
                      {"ns":0,"title":"Turing machine","pageid":30403}]}}"#;
        assert_eq!(
            parse_search_titles(body).unwrap(),
            vec!["Alan Turing".to_string(), "Turing machine".to_string()]
        );
    }

    #[test]
    fn search_without_hits_is_empty() {
        let body = r#"{"batchcomplete":true,"query":{"search":[]}}"#;
        assert!(parse_search_titles(body).unwrap().is_empty());
        assert!(parse_search_titles("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_search_body_is_backend_error() {
        let err = parse_search_titles("<html>").unwrap_err();
        assert!(matches!(err, ToolError::Backend { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn page_summary_skips_missing_pages() {
        let body = r#"{"query":{"pages":[
            {"title":"Nope","missing":true},
            {"pageid":1208,"title":"Alan Turing","extract":"Alan Mathison Turing was an English mathematician."}]}}"#;
        assert_eq!(
            parse_page_summary(body).unwrap(),
            Some((
                "Alan Turing".to_string(),
                "Alan Mathison Turing was an English mathematician.".to_string()
            ))
        );
    }

    #[test]
    fn blank_extract_counts_as_no_summary() {
        let body = r#"{"query":{"pages":[{"pageid":1,"title":"Stub","extract":"  "}]}}"#;
        assert_eq!(parse_page_summary(body).unwrap(), None);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 1000), "short");
        let long = "é".repeat(1500);
        assert_eq!(truncate_chars(&long, 1000).chars().count(), 1000);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_request() {
        let tool = WikipediaTool::new("http://127.0.0.1:9/unused", 1, 1000, reqwest::Client::new());
        let err = tool.invoke("   ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
