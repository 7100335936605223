use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::model::{Message, MessageRole};

pub const QUESTION_SLOT: &str = "question";
const QUESTION_TEMPLATE: &str = "Question:{question}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    MissingVariable { name: String },
    Malformed { template: String, position: usize },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { name } => {
                write!(f, "prompt variable '{name}' was not provided")
            }
            Self::Malformed { template, position } => write!(
                f,
                "malformed prompt template at byte {position}: '{template}'"
            ),
        }
    }
}

impl Error for PromptError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MessageTemplate {
    role: MessageRole,
    segments: Vec<Segment>,
}

/// Role-tagged message templates with `{name}` slots. `{{` and `}}` stand
/// for literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    messages: Vec<MessageTemplate>,
}

impl PromptTemplate {
    pub fn from_messages<'a>(
        messages: impl IntoIterator<Item = (MessageRole, &'a str)>,
    ) -> Result<Self, PromptError> {
        let messages = messages
            .into_iter()
            .map(|(role, template)| -> Result<MessageTemplate, PromptError> {
                Ok(MessageTemplate {
                    role,
                    segments: parse_segments(template)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { messages })
    }

    /// The page's two-message template: the system instruction is taken
    /// literally, the user message carries the `question` slot.
    pub fn question_answer(system_prompt: &str) -> Result<Self, PromptError> {
        let mut template = Self::from_messages([(MessageRole::User, QUESTION_TEMPLATE)])?;
        template.messages.insert(
            0,
            MessageTemplate {
                role: MessageRole::System,
                segments: vec![Segment::Text(system_prompt.to_string())],
            },
        );
        Ok(template)
    }

    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<Vec<Message>, PromptError> {
        self.messages
            .iter()
            .map(|message| -> Result<Message, PromptError> {
                let mut content = String::new();
                for segment in &message.segments {
                    match segment {
                        Segment::Text(text) => content.push_str(text),
                        Segment::Slot(name) => {
                            let value = vars.get(name.as_str()).ok_or_else(|| {
                                PromptError::MissingVariable { name: name.clone() }
                            })?;
                            content.push_str(value);
                        }
                    }
                }
                Ok(Message::new(message.role, content))
            })
            .collect()
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>, PromptError> {
    let malformed = |position: usize| PromptError::Malformed {
        template: template.to_string(),
        position,
    };

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().map(|(_, next)| *next) == Some('{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek().map(|(_, next)| *next) == Some('}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) if c.is_alphanumeric() || c == '_' => name.push(c),
                        _ => return Err(malformed(idx)),
                    }
                }
                if name.is_empty() {
                    return Err(malformed(idx));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Slot(name));
            }
            '}' => return Err(malformed(idx)),
            other => text.push(other),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
