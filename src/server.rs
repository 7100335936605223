use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::html::PageRenderer;
use crate::page::{PageState, render_page};

#[derive(Clone)]
pub struct AppState {
    page: Arc<PageState>,
    renderer: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(page: PageState) -> Result<Self> {
        let renderer = PageRenderer::new().context("Failed to compile page template")?;
        Ok(Self {
            page: Arc::new(page),
            renderer: Arc::new(renderer),
        })
    }
}

/// The first `q` wins. Pairs are read as a list so repeated keys and invalid
/// UTF-8 (decoded lossily) never reject the request.
fn question_from(pairs: Vec<(String, String)>) -> String {
    pairs
        .into_iter()
        .find_map(|(key, value)| (key == "q").then_some(value))
        .unwrap_or_default()
}

async fn handle_page(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let question = question_from(pairs);
    let view = render_page(&state.page, &question).await;
    state.renderer.render(&view).map(Html).map_err(|err| {
        warn!(error = %err, "page template failed to render");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to render page".to_string(),
        )
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_page))
        .with_state(state)
}

/// Binds the configured address and serves the page until the process ends.
pub async fn serve(state: AppState) -> Result<()> {
    let bind_addr = state.page.config().bind_addr.clone();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind page server to '{bind_addr}'"))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read page server address")?;
    info!(address = %local_addr, "page server listening");

    axum::serve(listener, router(state))
        .await
        .context("Page server stopped unexpectedly")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{AppState, question_from, router};
    use crate::backend::BackendSlot;
    use crate::backend::testing::{StubBackend, StubConnector};
    use crate::config::Config;
    use crate::error::BackendError;
    use crate::page::PageState;

    async fn spawn_app(connector: StubConnector) -> String {
        let page = PageState::with_backend(Config::default(), BackendSlot::new(connector))
            .expect("page state should build");
        let state = AppState::new(page).expect("state should build");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.expect("app server");
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn get_with_question_shows_response() {
        let backend = Arc::new(StubBackend::ok("Machine learning is ..."));
        let url = spawn_app(StubConnector::connected(Arc::clone(&backend))).await;

        let response = reqwest::Client::new()
            .get(&url)
            .query(&[("q", "What is machine learning?")])
            .send()
            .await
            .expect("request should succeed");
        assert!(response.status().is_success());
        let body = response.text().await.expect("body should be text");

        assert!(body.contains("<strong>Response:</strong>"), "body: {body}");
        assert!(body.contains("Machine learning is ..."), "body: {body}");
        assert!(body.contains("Ollama: Connected ✅"), "body: {body}");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_backend_still_renders_page() {
        let url = spawn_app(StubConnector::failing(BackendError::ConnectionRefused {
            url: "http://localhost:11434/api/chat".to_string(),
        }))
        .await;

        let response = reqwest::get(format!("{url}?q=hello"))
            .await
            .expect("request should succeed");
        assert!(response.status().is_success());
        let body = response.text().await.expect("body should be text");

        assert!(body.contains("❌ Failed to connect to Ollama"), "body: {body}");
        assert!(body.contains("<code>ollama serve</code>"), "body: {body}");
        assert!(body.contains("<code>ollama pull llama2</code>"), "body: {body}");
        assert!(!body.contains("Response:"), "body: {body}");
        assert!(body.contains("Ollama: Not Connected ❌"), "body: {body}");
    }

    #[test]
    fn question_is_the_first_q_pair() {
        let pairs = vec![
            ("lang".to_string(), "en".to_string()),
            ("q".to_string(), "first".to_string()),
            ("q".to_string(), "second".to_string()),
        ];
        assert_eq!(question_from(pairs), "first");
        assert_eq!(question_from(Vec::new()), "");
    }

    #[tokio::test]
    async fn odd_query_strings_still_render_page() {
        let backend = Arc::new(StubBackend::ok("answer"));
        let url = spawn_app(StubConnector::connected(Arc::clone(&backend))).await;

        for query in ["q=%FF", "q=a&q=b", "q", "other=1"] {
            let response = reqwest::get(format!("{url}?{query}"))
                .await
                .expect("request should succeed");
            assert!(
                response.status().is_success(),
                "status {} for ?{query}",
                response.status()
            );
            let body = response.text().await.expect("body should be text");
            assert!(body.contains("Ollama: Connected ✅"), "body: {body}");
        }

        // `%FF` decodes to a replacement character and `q=a&q=b` asks "a".
        assert_eq!(backend.call_count(), 2);
        let calls = backend.calls.lock().expect("calls lock");
        assert_eq!(calls[0][1].content, "Question:\u{FFFD}");
        assert_eq!(calls[1][1].content, "Question:a");
    }
}
