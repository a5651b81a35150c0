use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{Backend, BackendError, Turn};

/// An in-memory backend that replays queued answers
///
/// once the queue is empty it answers with a numbered passage.
/// every call is recorded so tests can check what the backend was given.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    answers: VecDeque<Result<String, BackendError>>,
    calls: Vec<Call>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub context: Vec<Turn>,
    pub instruction: String,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    pub fn fail(self, err: BackendError) -> Self {
        self.push(Err(err))
    }

    pub fn push(self, answer: Result<String, BackendError>) -> Self {
        self.inner.lock().unwrap().answers.push_back(answer);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl Backend for Scripted {
    async fn generate(
        &self,
        context: &[Turn],
        instruction: &str,
    ) -> Result<String, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call {
            context: context.to_vec(),
            instruction: instruction.into(),
        });

        let call_number = inner.calls.len();
        inner
            .answers
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Passage number {}.", call_number)))
    }
}
