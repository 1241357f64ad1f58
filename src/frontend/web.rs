//! One-page web form: ask a question, read the answer, download it.

use crate::agent::Agent;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct WebState {
    agent: Arc<dyn Agent>,
    downloads: RwLock<DownloadStore>,
}

impl WebState {
    pub fn new(agent: Arc<dyn Agent>, download_capacity: usize) -> Self {
        Self {
            agent,
            downloads: RwLock::new(DownloadStore::new(download_capacity)),
        }
    }
}

/// Recent answers addressable by id, oldest evicted first.
#[derive(Debug)]
struct DownloadStore {
    capacity: usize,
    entries: VecDeque<(String, String)>,
}

impl DownloadStore {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    fn insert(&mut self, body: String) -> String {
        let id = ulid::Ulid::new().to_string();
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((id.clone(), body));
        id
    }

    fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, body)| body.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    #[serde(default)]
    query: Option<String>,
}

pub fn router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/download/:id", get(download))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the web form until `cancel` fires.
pub async fn serve(
    state: Arc<WebState>,
    bind_addr: &str,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

enum Outcome {
    Empty,
    Answer { text: String, download_id: String },
    Failed(String),
}

async fn index(State(state): State<Arc<WebState>>, Query(params): Query<AskParams>) -> Html<String> {
    let query = params.query.unwrap_or_default();
    let trimmed = query.trim();

    let outcome = if trimmed.is_empty() {
        Outcome::Empty
    } else {
        match state.agent.run(trimmed).await {
            Ok(text) => {
                let download_id = state.downloads.write().await.insert(text.clone());
                Outcome::Answer { text, download_id }
            }
            Err(e) => {
                error!("Query failed: {}", e);
                Outcome::Failed(e.user_message())
            }
        }
    };

    Html(render_page(trimmed, &outcome))
}

async fn download(State(state): State<Arc<WebState>>, Path(id): Path<String>) -> Response {
    let downloads = state.downloads.read().await;
    match downloads.get(&id) {
        Some(body) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"response.txt\"",
                ),
            ],
            body.to_string(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Unknown or expired download").into_response(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_page(query: &str, outcome: &Outcome) -> String {
    let result = match outcome {
        Outcome::Empty => String::new(),
        Outcome::Answer { text, download_id } => format!(
            r#"<p class="done">Done!</p>
<h3>Response</h3>
<pre class="answer">{}</pre>
<p><a href="/download/{}" download="response.txt">Download</a></p>"#,
            escape_html(text),
            download_id
        ),
        Outcome::Failed(message) => format!(
            r#"<p class="error">Error: {}</p>"#,
            escape_html(message)
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Research Assistant</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
input[type=text] {{ width: 100%; padding: .5rem; font-size: 1rem; }}
pre.answer {{ white-space: pre-wrap; background: #f6f8fa; padding: 1rem; }}
.done {{ color: #1a7f37; }}
.error {{ color: #cf222e; }}
</style>
</head>
<body>
<h1>Research Assistant</h1>
<form method="get" action="/">
<label for="query">Ask me anything:</label>
<input type="text" id="query" name="query" value="{}" autofocus>
</form>
{}
</body>
</html>
"#,
        escape_html(query),
        result
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
