use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use tracing::debug;

use crate::backend::ChatBackend;
use crate::error::BackendError;
use crate::prompt::{PromptError, PromptTemplate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    Prompt(PromptError),
    Backend(BackendError),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Prompt(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<PromptError> for ChainError {
    fn from(err: PromptError) -> Self {
        Self::Prompt(err)
    }
}

impl From<BackendError> for ChainError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Passes model output through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOutputParser;

impl TextOutputParser {
    pub fn parse(&self, text: String) -> String {
        text
    }
}

/// prompt template -> backend -> output parser. Cheap to build, holds no state.
pub struct Chain<'a> {
    prompt: &'a PromptTemplate,
    backend: &'a dyn ChatBackend,
    parser: TextOutputParser,
}

impl<'a> Chain<'a> {
    pub fn new(prompt: &'a PromptTemplate, backend: &'a dyn ChatBackend) -> Self {
        Self {
            prompt,
            backend,
            parser: TextOutputParser,
        }
    }

    pub async fn invoke(&self, vars: &HashMap<&str, &str>) -> Result<String, ChainError> {
        let messages = self.prompt.render(vars)?;
        debug!(message_count = messages.len(), "invoking chain");
        let raw = self.backend.chat(&messages).await?;
        Ok(self.parser.parse(raw))
    }
}
