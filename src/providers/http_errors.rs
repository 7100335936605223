use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::BackendError;

fn error_chain_matches(err: &(dyn StdError + 'static), io_kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == io_kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_matches(err, ErrorKind::TimedOut, "timed out")
}

/// Deepest message in the chain; reqwest's own `Display` is usually just
/// "error sending request".
fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Classifies a transport-level reqwest failure.
pub(crate) fn classify_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> BackendError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return BackendError::Timeout {
            url: api_url.to_string(),
            timeout_secs,
        };
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return BackendError::ConnectionRefused {
                url: api_url.to_string(),
            };
        }

        return BackendError::Unreachable {
            url: api_url.to_string(),
            detail: root_cause(&err),
        };
    }

    BackendError::invocation(format!(
        "Failed to call model API at '{}': {}",
        api_url,
        root_cause(&err)
    ))
}
