//! Process-wide environment preparation.
//!
//! Runs exactly once from `main`, before the async runtime starts and before
//! any HTTP client is built. Certificate bundle overrides are dropped and the
//! insecure flags are raised so every later client skips TLS verification.

use std::env;

/// Certificate bundle overrides that are always cleared.
pub const CLEARED_TLS_VARS: [&str; 3] = ["SSL_CERT_FILE", "REQUESTS_CA_BUNDLE", "CURL_CA_BUNDLE"];

/// Flags that tell HTTP tooling in this process and its children to skip
/// certificate verification.
pub const INSECURE_FLAGS: [(&str, &str); 2] =
    [("PYTHONHTTPSVERIFY", "0"), ("CURL_INSECURE", "1")];
const TRACING_KEY_VAR: &str = "LANGCHAIN_API_KEY";
const TRACING_FLAG_VAR: &str = "LANGCHAIN_TRACING_V2";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentPatch {
    pub remove: Vec<&'static str>,
    pub set: Vec<(&'static str, String)>,
}

impl EnvironmentPatch {
    /// Builds the startup patch. The TLS part does not depend on the current
    /// values; only the tracing flag looks at the environment.
    pub fn for_startup(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let mut patch = Self {
            remove: CLEARED_TLS_VARS.to_vec(),
            set: INSECURE_FLAGS
                .iter()
                .map(|(key, value)| (*key, (*value).to_string()))
                .collect(),
        };

        // Any non-empty value counts, whitespace included.
        if let Some(key) = get_var(TRACING_KEY_VAR).filter(|key| !key.is_empty()) {
            patch.set.push((TRACING_FLAG_VAR, "true".to_string()));
            patch.set.push((TRACING_KEY_VAR, key));
        }

        patch
    }

    /// # Safety
    ///
    /// Mutates the process environment. The caller must guarantee no other
    /// thread reads or writes the environment concurrently, which holds when
    /// called from `main` before the runtime is built.
    pub unsafe fn apply(&self) {
        for key in &self.remove {
            // SAFETY: upheld by the caller.
            unsafe { env::remove_var(key) };
        }
        for (key, value) in &self.set {
            // SAFETY: upheld by the caller.
            unsafe { env::set_var(key, value) };
        }
    }
}

/// Loads `.env`, then clears TLS overrides and sets the insecure flags.
///
/// `.env` is read first so that a bundle path declared there is cleared too.
///
/// # Safety
///
/// Same contract as [`EnvironmentPatch::apply`]: single-threaded process.
pub unsafe fn prepare_environment() -> EnvironmentPatch {
    dotenvy::dotenv().ok();
    let patch = EnvironmentPatch::for_startup(|key| env::var(key).ok());
    // SAFETY: forwarded from the caller.
    unsafe { patch.apply() };
    patch
}
