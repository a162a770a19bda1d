//! Text-generation test double
//!
//! Returns a canned reply (or a canned failure) and records every request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sophono_ai::services::{GenerationRequest, LlmError, TextGenerator};

enum Reply {
    Text(String),
    Unreachable,
}

pub struct ScriptedGenerator {
    reply: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(text.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails with a connection error
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Unreachable,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Unreachable => Err(LlmError::Connection("connection refused".to_string())),
        }
    }
}
