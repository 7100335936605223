use std::error::Error;
use std::fmt;

/// Coarse classification of a backend failure, used for logging and for
/// picking remediation hints on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    ConnectionRefused,
    Unreachable,
    Timeout,
    ModelNotFound,
    UnsupportedProvider,
    Invocation,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRefused => "connection_refused",
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::ModelNotFound => "model_not_found",
            Self::UnsupportedProvider => "unsupported_provider",
            Self::Invocation => "invocation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    ConnectionRefused { url: String },
    Unreachable { url: String, detail: String },
    Timeout { url: String, timeout_secs: u64 },
    ModelNotFound { model: String, detail: String },
    UnsupportedProvider { provider: String },
    Invocation { detail: String },
}

impl BackendError {
    pub fn invocation(detail: impl Into<String>) -> Self {
        Self::Invocation {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::ConnectionRefused { .. } => BackendErrorKind::ConnectionRefused,
            Self::Unreachable { .. } => BackendErrorKind::Unreachable,
            Self::Timeout { .. } => BackendErrorKind::Timeout,
            Self::ModelNotFound { .. } => BackendErrorKind::ModelNotFound,
            Self::UnsupportedProvider { .. } => BackendErrorKind::UnsupportedProvider,
            Self::Invocation { .. } => BackendErrorKind::Invocation,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionRefused { url } => write!(
                f,
                "Connection refused by model API at '{url}'. \
                 Ensure the model provider is running and MODEL_BASE_URL is correct."
            ),
            Self::Unreachable { url, detail } => write!(
                f,
                "Failed to connect to model API at '{url}': {detail}. \
                 Check MODEL_BASE_URL and network connectivity."
            ),
            Self::Timeout { url, timeout_secs } => write!(
                f,
                "Model request timed out after {timeout_secs}s while calling '{url}'. \
                 Increase MODEL_TIMEOUT_SECS or check model responsiveness."
            ),
            Self::ModelNotFound { model, detail } => {
                write!(f, "Model '{model}' is not available on the server: {detail}")
            }
            Self::UnsupportedProvider { provider } => write!(
                f,
                "Unsupported MODEL_PROVIDER='{provider}'. Supported providers: ollama."
            ),
            Self::Invocation { detail } => write!(f, "{detail}"),
        }
    }
}

impl Error for BackendError {}
