use std::env;

const DEFAULT_MODEL_PROVIDER: &str = "ollama";
const DEFAULT_MODEL: &str = "llama2";
const DEFAULT_MODEL_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Please respond to the user queries";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_PROMPT: &str = "Hi";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
const DEFAULT_TLS_ACCEPT_INVALID_CERTS: bool = true;

#[derive(Debug, Clone)]
pub struct Config {
    pub model_provider: String,
    pub model: String,
    pub model_base_url: String,
    pub system_prompt: String,
    pub model_timeout_secs: u64,
    pub probe_prompt: String,
    pub bind_addr: String,
    pub tls_accept_invalid_certs: bool,
    pub tracing_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env_with(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_base_url = parse_non_empty(get_var("MODEL_BASE_URL").as_deref())
            .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string());
        let model_timeout_secs = parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref());
        let tls_accept_invalid_certs = parse_bool(
            get_var("TLS_ACCEPT_INVALID_CERTS").as_deref(),
            DEFAULT_TLS_ACCEPT_INVALID_CERTS,
        );

        Self {
            model_provider: get_var("MODEL_PROVIDER")
                .unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string()),
            model: parse_non_empty(get_var("MODEL").as_deref())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url,
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            model_timeout_secs,
            probe_prompt: parse_non_empty(get_var("PROBE_PROMPT").as_deref())
                .unwrap_or_else(|| DEFAULT_PROBE_PROMPT.to_string()),
            bind_addr: parse_non_empty(get_var("BIND_ADDR").as_deref())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            tls_accept_invalid_certs,
            tracing_api_key: get_var("LANGCHAIN_API_KEY").filter(|key| !key.is_empty()),
        }
    }
}

fn parse_non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
