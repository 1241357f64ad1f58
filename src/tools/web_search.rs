//! General web search through DuckDuckGo's HTML endpoint (no API key).

use super::{Tool, ToolError};
use async_trait::async_trait;
use tracing::debug;

pub const NAME: &str = "DuckDuckGo Search";

const DESCRIPTION: &str = "Use this to search the web for current or general information \
when Wikipedia isn't enough.";

/// Returned when the results page has no snippets.
pub const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

/// Web search returning result titles, snippets and URLs.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    endpoint: String,
    max_results: usize,
    http: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(endpoint: &str, max_results: usize, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            max_results,
            http,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("empty search query".into()));
        }

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::backend(NAME, format!("HTTP {}", status)));
        }

        let html = resp.text().await?;
        let results = extract_ddg_results(&html, self.max_results);
        debug!("DuckDuckGo '{}' -> {} results", query, results.len());

        if results.is_empty() {
            Ok(NO_RESULT.to_string())
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Extract up to `limit` results from a DuckDuckGo HTML page.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("result__body").skip(1) {
        if results.len() >= limit {
            break;
        }

        let title = inner_text_after(chunk, "class=\"result__a\"");
        let snippet = inner_text_after(chunk, "class=\"result__snippet\"");
        let url = inner_text_after(chunk, "class=\"result__url\"");

        let (Some(title), Some(snippet)) = (title, snippet) else {
            continue;
        };

        let mut entry = format!("{}\n{}", title, snippet);
        if let Some(url) = url {
            entry.push_str("\nURL: ");
            entry.push_str(&url);
        }
        results.push(entry);
    }

    results
}

/// Text content of the element whose opening tag contains `marker`.
///
/// Nested inline tags (`<b>` highlights) are dropped, entities decoded.
/// Void elements (`<br>`, `<img>`, `<wbr>`) never open a level.
fn inner_text_after(chunk: &str, marker: &str) -> Option<String> {
    let rest = chunk.split(marker).nth(1)?;
    let open_end = rest.find('>')?;
    let body = &rest[open_end + 1..];

    let mut text = String::new();
    let mut depth = 0usize;
    let mut in_tag = false;
    let mut tag = String::new();
    for c in body.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if tag.starts_with('/') {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                } else if tag.ends_with('/') || is_void_element(&tag) {
                    text.push(' ');
                } else {
                    depth += 1;
                }
            }
            _ if in_tag => tag.push(c),
            _ => text.push(c),
        }
    }

    let text = html_decode(text.split_whitespace().collect::<Vec<_>>().join(" ").as_str());
    (!text.is_empty()).then_some(text)
}

fn is_void_element(tag: &str) -> bool {
    let name = tag.split_whitespace().next().unwrap_or("");
    ["br", "img", "wbr", "hr"]
        .iter()
        .any(|void| name.eq_ignore_ascii_case(void))
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
