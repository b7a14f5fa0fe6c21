use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::GenerationError;
use crate::request::{Generation, RepairRequest};

/// Abstraction over text generators that propose repaired scripts.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a candidate along with token usage when the provider reports it.
    async fn generate(&self, request: &RepairRequest) -> Result<Generation, GenerationError>;

    /// Candidate script text for a failing test.
    async fn repair(&self, request: &RepairRequest) -> Result<String, GenerationError> {
        self.generate(request).await.map(|generation| generation.text)
    }

    /// Label used in logs.
    fn name(&self) -> &str {
        "generation"
    }
}

/// Deterministic provider replaying scripted replies in order.
///
/// Every request is recorded so tests can inspect what the refinement loop
/// asked for.
#[derive(Debug, Default)]
pub struct MockGenerationService {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<RepairRequest>>,
}

impl MockGenerationService {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: GenerationError) {
        self.replies.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<RepairRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(&self, request: &RepairRequest) -> Result<Generation, GenerationError> {
        let index = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };
        match self.replies.lock().pop_front() {
            Some(reply) => reply.map(Generation::text),
            None => Err(GenerationError::Exhausted(index)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
