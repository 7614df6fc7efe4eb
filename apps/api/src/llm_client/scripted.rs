//! Scripted `GenerationClient` for tests: replays a fixed sequence of responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{GenerationClient, GenerationError};

pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub fn rate_limited() -> Result<String, GenerationError> {
    Err(GenerationError::RateLimit {
        status: 429,
        message: "Resource has been exhausted".to_string(),
    })
}

pub fn auth_rejected() -> Result<String, GenerationError> {
    Err(GenerationError::Auth {
        status: 400,
        message: "API key not valid".to_string(),
    })
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str, _schema: &Value) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transient("script exhausted".to_string())))
    }
}
