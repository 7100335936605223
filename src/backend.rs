use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::model::Message;

pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>>;

/// A connected text-generation backend.
pub trait ChatBackend: Send + Sync {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> BackendFuture<'a>;
}

pub type SharedBackend = Arc<dyn ChatBackend>;

pub type ConnectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SharedBackend, BackendError>> + Send + 'a>>;

/// Builds a backend and verifies it is reachable before handing it out.
pub trait BackendConnector: Send + Sync {
    fn connect(&self) -> ConnectFuture<'_>;
}

/// Process-wide backend handle.
///
/// The first successful `connect` is stored and returned to every later
/// caller. The mutex is held across the connect attempt, so at most one
/// initialization runs at a time. Failures are not stored for later renders,
/// but callers that were already waiting while an attempt ran receive that
/// attempt's error instead of starting another one.
pub struct BackendSlot {
    connector: Box<dyn BackendConnector>,
    finished_attempts: AtomicU64,
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    backend: Option<SharedBackend>,
    last_failure: Option<(u64, BackendError)>,
}

impl BackendSlot {
    pub fn new(connector: impl BackendConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            finished_attempts: AtomicU64::new(0),
            state: Mutex::new(SlotState::default()),
        }
    }

    pub async fn get_or_connect(&self) -> Result<SharedBackend, BackendError> {
        let arrived_after = self.finished_attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        if let Some(backend) = state.backend.as_ref() {
            return Ok(Arc::clone(backend));
        }
        if let Some((attempt, err)) = state.last_failure.as_ref()
            && *attempt > arrived_after
        {
            debug!(attempt, "reusing failure of the attempt this render waited on");
            return Err(err.clone());
        }

        let attempt = self.finished_attempts.load(Ordering::Acquire) + 1;
        let outcome = self.connector.connect().await;
        self.finished_attempts.store(attempt, Ordering::Release);

        match outcome {
            Ok(backend) => {
                info!(attempt, "model backend connected");
                state.backend = Some(Arc::clone(&backend));
                state.last_failure = None;
                Ok(backend)
            }
            Err(err) => {
                warn!(
                    attempt,
                    error_kind = err.kind().as_str(),
                    error = %err,
                    "model backend initialization failed"
                );
                state.last_failure = Some((attempt, err.clone()));
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_connected(&self) -> bool {
        self.state.lock().await.backend.is_some()
    }
}
