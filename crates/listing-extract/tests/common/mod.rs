//! Scripted in-memory oracle shared by the integration tests

use async_trait::async_trait;
use listing_extract::{ChatMessage, ExtractError, Oracle, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers with canned responses in order and records every conversation
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<String>>,
    conversations: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            conversations: Mutex::new(Vec::new()),
        }
    }

    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.conversations.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.conversations.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExtractError::Oracle("no scripted response left".to_string()))
    }
}
