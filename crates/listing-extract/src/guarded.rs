//! Guarded model call with bounded retries
//!
//! Every attempt screens the outgoing conversation, waits for the model
//! under a deadline, then screens and parses the response. A response that
//! is unsafe or malformed earns one corrective instruction appended to the
//! conversation before the next attempt.

use crate::error::{ExtractError, Result};
use crate::message::ChatMessage;
use crate::oracle::Oracle;
use crate::repair::OutputRepair;
use listing_guard::{Direction, SafetyFilter};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Instruction appended after an unsafe or malformed response
pub const CORRECTIVE_INSTRUCTION: &str = "Your previous response was unsafe or invalid. \
Regenerate a safe, valid JSON output with a single top-level \"car\" key and no extra text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ComposingPrompt,
    AwaitingResponse,
    CheckingOutputSafety,
    CheckingOutputShape,
    Retrying,
    Success,
    PermanentFailure,
}

/// Per-call state; never shared between calls
#[derive(Debug)]
struct RetryState {
    phase: Phase,
    attempt: usize,
    messages: Vec<ChatMessage>,
    last_output: String,
    last_flagged: Vec<String>,
}

impl RetryState {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            phase: Phase::ComposingPrompt,
            attempt: 0,
            messages,
            last_output: String::new(),
            last_flagged: Vec::new(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(attempt = self.attempt, from = ?self.phase, to = ?phase, "Guarded call transition");
        self.phase = phase;
    }
}

/// One guarded extraction against an oracle
pub struct GuardedCall<'a> {
    oracle: &'a dyn Oracle,
    filter: &'a SafetyFilter,
    repair: &'a OutputRepair,
    timeout: Duration,
    corrective: String,
}

impl<'a> GuardedCall<'a> {
    pub fn new(
        oracle: &'a dyn Oracle,
        filter: &'a SafetyFilter,
        repair: &'a OutputRepair,
    ) -> Self {
        Self {
            oracle,
            filter,
            repair,
            timeout: Duration::from_secs(30),
            corrective: CORRECTIVE_INSTRUCTION
                .replace("\"car\"", &format!("\"{}\"", repair.wrapping_key())),
        }
    }

    /// Deadline for each model call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run up to `max_retries` attempts (zero counts as one) and return the
    /// first safe, well-formed record value.
    pub async fn guarded_extract(
        &self,
        messages: Vec<ChatMessage>,
        max_retries: usize,
    ) -> Result<Value> {
        let max_attempts = max_retries.max(1);
        let mut state = RetryState::new(messages);

        while state.attempt < max_attempts {
            state.attempt += 1;

            // Outgoing conversation is screened before every call
            for message in &state.messages {
                let verdict = self.filter.inspect(&message.content, Direction::Input);
                if !verdict.is_safe {
                    state.enter(Phase::PermanentFailure);
                    return Err(ExtractError::UnsafeInput {
                        flagged: verdict.flagged_list(),
                    });
                }
            }

            state.enter(Phase::AwaitingResponse);
            let raw = match self.call_oracle(&state.messages).await {
                Ok(raw) => raw,
                Err(e) => {
                    state.enter(Phase::PermanentFailure);
                    return Err(e);
                }
            };

            state.enter(Phase::CheckingOutputSafety);
            let verdict = self.filter.inspect(&raw, Direction::Output);
            let cleaned = self.filter.sanitize(&raw).trim().to_string();
            state.last_output = cleaned.clone();
            // Flags always describe the latest response
            state.last_flagged = verdict.flagged_list();

            if verdict.is_safe {
                state.enter(Phase::CheckingOutputShape);
                match self.repair.parse_once(&cleaned) {
                    Ok(value) => {
                        state.enter(Phase::Success);
                        info!(attempt = state.attempt, "Extraction succeeded");
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(attempt = state.attempt, error = %e, "Model output is malformed");
                    }
                }
            } else {
                warn!(
                    attempt = state.attempt,
                    flagged = ?verdict.flagged,
                    "Model output failed safety check"
                );
            }

            if state.attempt < max_attempts {
                state.enter(Phase::Retrying);
                state.messages.push(ChatMessage::user(self.corrective.clone()));
            }
        }

        state.enter(Phase::PermanentFailure);
        Err(ExtractError::RetryExhausted {
            attempts: state.attempt,
            flagged: state.last_flagged,
            last_output: state.last_output,
        })
    }

    async fn call_oracle(&self, messages: &[ChatMessage]) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.oracle.complete(messages)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::OracleTimeout(self.timeout.as_secs())),
        }
    }
}
