use async_trait::async_trait;

pub mod gemini;
#[cfg(test)]
pub mod scripted;

pub use gemini::Gemini;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Story,
}

/// A single entry of the conversation a story is grounded on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn story(text: impl Into<String>) -> Self {
        Self {
            role: Role::Story,
            text: text.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("failed to reach the story backend: {0}")]
    Request(String),

    #[error("the story backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to decode the story backend response: {0}")]
    Decode(String),
}

/// A generative text provider
///
/// implementations receive the accumulated conversation and a new instruction,
/// and return the raw generated text.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, context: &[Turn], instruction: &str)
        -> Result<String, BackendError>;
}
