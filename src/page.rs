//! The Q&A page as data: one render produces a [`PageView`] that the HTML
//! layer turns into markup.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{BackendSlot, ChatBackend};
use crate::chain::Chain;
use crate::config::Config;
use crate::error::BackendError;
use crate::model::ProviderConnector;
use crate::prompt::{PromptError, PromptTemplate, QUESTION_SLOT};

pub const INPUT_PLACEHOLDER: &str = "e.g., What is machine learning?";
pub const STATUS_CONNECTED: &str = "Ollama: Connected ✅";
pub const STATUS_NOT_CONNECTED: &str = "Ollama: Not Connected ❌";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub command: Option<String>,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            command: None,
        }
    }

    fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSection {
    Response { text: String },
    Failed { notices: Vec<Notice> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupStep {
    pub number: usize,
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sidebar {
    pub steps: Vec<SetupStep>,
    pub connected: bool,
    pub status: &'static str,
}

impl Sidebar {
    fn new(model: &str, connected: bool) -> Self {
        let steps = [
            ("Start Ollama server:".to_string(), "ollama serve".to_string()),
            (
                format!("Pull {} model:", model.to_uppercase()),
                format!("ollama pull {model}"),
            ),
            ("Verify model:".to_string(), "ollama list".to_string()),
        ]
        .into_iter()
        .enumerate()
        .map(|(idx, (label, command))| SetupStep {
            number: idx + 1,
            label,
            command,
        })
        .collect();

        Self {
            steps,
            connected,
            status: if connected {
                STATUS_CONNECTED
            } else {
                STATUS_NOT_CONNECTED
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub title: String,
    pub intro: String,
    pub placeholder: &'static str,
    pub input: String,
    pub connection: Vec<Notice>,
    pub answer: Option<AnswerSection>,
    pub sidebar: Sidebar,
}

/// Everything a render needs that outlives a single request.
pub struct PageState {
    cfg: Config,
    prompt: PromptTemplate,
    backend: BackendSlot,
}

impl PageState {
    pub fn new(cfg: Config) -> Result<Self, PromptError> {
        let connector = ProviderConnector::new(cfg.clone());
        Self::with_backend(cfg, BackendSlot::new(connector))
    }

    pub fn with_backend(cfg: Config, backend: BackendSlot) -> Result<Self, PromptError> {
        let prompt = PromptTemplate::question_answer(&cfg.system_prompt)?;
        Ok(Self {
            cfg,
            prompt,
            backend,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn connection_failure(&self, err: &BackendError) -> Vec<Notice> {
        vec![
            Notice::new(
                NoticeLevel::Error,
                format!("❌ Failed to connect to Ollama: {err}"),
            ),
            Notice::new(NoticeLevel::Info, "Make sure Ollama is running with:")
                .with_command("ollama serve"),
            Notice::new(
                NoticeLevel::Info,
                format!("And that {} model is available:", self.cfg.model),
            )
            .with_command(format!("ollama pull {}", self.cfg.model)),
        ]
    }

    async fn answer(&self, backend: &dyn ChatBackend, question: &str) -> AnswerSection {
        let chain = Chain::new(&self.prompt, backend);
        debug!(question_len = question.len(), "answering question");

        match chain
            .invoke(&HashMap::from([(QUESTION_SLOT, question)]))
            .await
        {
            Ok(text) => {
                info!(response_len = text.len(), "question answered");
                AnswerSection::Response { text }
            }
            Err(err) => {
                warn!(error = %err, "chain invocation failed");
                AnswerSection::Failed {
                    notices: vec![
                        Notice::new(
                            NoticeLevel::Error,
                            format!("Error generating response: {err}"),
                        ),
                        Notice::new(
                            NoticeLevel::Info,
                            format!(
                                "Make sure Ollama server is running and {} model is available.",
                                self.cfg.model
                            ),
                        ),
                    ],
                }
            }
        }
    }
}

/// One page render. Never fails: backend problems become notices.
pub async fn render_page(state: &PageState, input: &str) -> PageView {
    let model_label = state.cfg.model.to_uppercase();
    let backend = state.backend.get_or_connect().await;

    let connection = match &backend {
        Ok(_) => vec![Notice::new(
            NoticeLevel::Success,
            "✅ Connected to Ollama successfully!",
        )],
        Err(err) => state.connection_failure(err),
    };

    let answer = match &backend {
        Ok(backend) if !input.is_empty() => Some(state.answer(&**backend, input).await),
        _ => None,
    };

    PageView {
        title: format!("🦙 Local Q&A Demo With {model_label} API"),
        intro: format!("Ask me anything and I'll respond using {model_label}!"),
        placeholder: INPUT_PLACEHOLDER,
        input: input.to_string(),
        connection,
        answer,
        sidebar: Sidebar::new(&state.cfg.model, backend.is_ok()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::{
        AnswerSection, NoticeLevel, PageState, STATUS_CONNECTED, STATUS_NOT_CONNECTED,
        render_page,
    };
    use crate::backend::BackendSlot;
    use crate::backend::testing::{StubBackend, StubConnector};
    use crate::config::Config;
    use crate::error::BackendError;

    fn state_with(connector: StubConnector) -> PageState {
        PageState::with_backend(Config::default(), BackendSlot::new(connector))
            .expect("page state should build")
    }

    fn refused() -> BackendError {
        BackendError::ConnectionRefused {
            url: "http://localhost:11434/api/chat".to_string(),
        }
    }

    #[tokio::test]
    async fn connected_backend_answers_question_verbatim() {
        let backend = Arc::new(StubBackend::ok("Machine learning is ..."));
        let state = state_with(StubConnector::connected(Arc::clone(&backend)));

        let view = render_page(&state, "What is machine learning?").await;

        assert_eq!(
            view.answer,
            Some(AnswerSection::Response {
                text: "Machine learning is ...".to_string()
            })
        );
        assert_eq!(view.connection[0].level, NoticeLevel::Success);
        assert!(view.sidebar.connected);
        assert_eq!(view.sidebar.status, STATUS_CONNECTED);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_input_never_invokes_backend() {
        let backend = Arc::new(StubBackend::ok("unused"));
        let state = state_with(StubConnector::connected(Arc::clone(&backend)));

        let view = render_page(&state, "").await;

        assert_eq!(view.answer, None);
        assert!(view.sidebar.connected);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_initialization_skips_answer_and_shows_hints() {
        let state = state_with(StubConnector::failing(refused()));

        let view = render_page(&state, "What is machine learning?").await;

        assert_eq!(view.answer, None);
        assert_eq!(view.connection[0].level, NoticeLevel::Error);
        assert!(
            view.connection[0]
                .text
                .starts_with("❌ Failed to connect to Ollama: Connection refused"),
            "unexpected notice: {}",
            view.connection[0].text
        );
        let commands: Vec<_> = view
            .connection
            .iter()
            .filter_map(|notice| notice.command.as_deref())
            .collect();
        assert_eq!(commands, vec!["ollama serve", "ollama pull llama2"]);
        assert!(!view.sidebar.connected);
        assert_eq!(view.sidebar.status, STATUS_NOT_CONNECTED);
    }

    #[tokio::test]
    async fn invocation_failure_is_reported_inline() {
        let backend = Arc::new(StubBackend::err(BackendError::Timeout {
            url: "http://localhost:11434/api/chat".to_string(),
            timeout_secs: 30,
        }));
        let state = state_with(StubConnector::connected(backend));

        let view = render_page(&state, "slow question").await;

        let Some(AnswerSection::Failed { notices }) = view.answer else {
            panic!("expected failed answer section");
        };
        assert!(
            notices[0]
                .text
                .starts_with("Error generating response: Model request timed out"),
            "unexpected notice: {}",
            notices[0].text
        );
        assert_eq!(
            notices[1].text,
            "Make sure Ollama server is running and llama2 model is available."
        );
        assert!(view.sidebar.connected);
    }

    #[tokio::test]
    async fn renders_reuse_the_cached_backend() {
        let connector = StubConnector::connected(Arc::new(StubBackend::ok("answer")));
        let attempts = Arc::clone(&connector.attempts);
        let state = state_with(connector);

        render_page(&state, "").await;
        render_page(&state, "first").await;
        render_page(&state, "second").await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sidebar_lists_setup_steps_for_configured_model() {
        let state = state_with(StubConnector::failing(refused()));

        let view = render_page(&state, "").await;

        let steps: Vec<_> = view
            .sidebar
            .steps
            .iter()
            .map(|step| (step.number, step.label.as_str(), step.command.as_str()))
            .collect();
        assert_eq!(
            steps,
            vec![
                (1, "Start Ollama server:", "ollama serve"),
                (2, "Pull LLAMA2 model:", "ollama pull llama2"),
                (3, "Verify model:", "ollama list"),
            ]
        );
        assert_eq!(view.title, "🦙 Local Q&A Demo With LLAMA2 API");
    }
}
