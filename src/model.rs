use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{BackendConnector, ConnectFuture, SharedBackend};
use crate::config::Config;
use crate::error::BackendError;
use crate::providers::ollama::OllamaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Connects to whichever provider `MODEL_PROVIDER` names.
#[derive(Debug, Clone)]
pub struct ProviderConnector {
    cfg: Config,
}

impl ProviderConnector {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl BackendConnector for ProviderConnector {
    fn connect(&self) -> ConnectFuture<'_> {
        Box::pin(async move {
            let provider = self.cfg.model_provider.trim().to_ascii_lowercase();

            match provider.as_str() {
                "ollama" => {
                    debug!(
                        provider = "ollama",
                        model = %self.cfg.model,
                        base_url = %self.cfg.model_base_url,
                        "connecting to model backend"
                    );
                    let client = OllamaClient::connect(&self.cfg).await?;
                    Ok(Arc::new(client) as SharedBackend)
                }
                other => {
                    warn!(provider = %other, "unsupported model provider configured");
                    Err(BackendError::UnsupportedProvider {
                        provider: other.to_string(),
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageRole, ProviderConnector};
    use crate::backend::BackendConnector;
    use crate::config::Config;
    use crate::error::BackendErrorKind;

    #[test]
    fn message_constructors_tag_roles() {
        assert_eq!(Message::system("s").role, MessageRole::System);
        assert_eq!(Message::user("u").role.as_str(), "user");
        assert_eq!(Message::new(MessageRole::System, "s"), Message::system("s"));
    }

    #[tokio::test]
    async fn unsupported_provider_fails_without_network() {
        let cfg = Config {
            model_provider: "invalid".to_string(),
            ..Config::default()
        };
        let err = match ProviderConnector::new(cfg).connect().await {
            Ok(_) => panic!("connect should fail for unknown provider"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), BackendErrorKind::UnsupportedProvider);
    }
}
