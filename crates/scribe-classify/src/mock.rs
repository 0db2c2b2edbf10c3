use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::ClassifyError;
use crate::service::{CompletionRequest, ReasoningService};

/// Scripted reply for [`MockReasoningService`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fails with `ClassifyError::Transport`.
    Fail(String),
    /// Never resolves; pair with a paused tokio clock.
    Hang,
}

/// Reasoning service that replays scripted replies and counts calls.
/// Once the script runs out every call fails.
pub struct MockReasoningService {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockReasoningService {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReasoningService for MockReasoningService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(msg)) => Err(ClassifyError::Transport(msg)),
            Some(MockReply::Hang) => std::future::pending().await,
            None => Err(ClassifyError::Transport("mock script exhausted".into())),
        }
    }
}
