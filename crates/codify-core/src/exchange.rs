//! One request/response cycle against the completion service.
//!
//! The cycle is split in two so a UI can keep its event loop running while
//! the call is in flight: [`ExchangeController::begin`] validates the input,
//! records the user entry and marks the controller busy;
//! [`ExchangeController::finish`] records the reply (or drops it on failure)
//! and always clears busy. [`ExchangeController::submit`] runs both back to
//! back for callers that can simply await.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::ai::CompletionService;
use crate::error::{ExchangeError, RemoteCallError};
use crate::state::{ChatEntry, Conversation};

/// Proof that a request was dispatched. Hand it back to
/// [`ExchangeController::finish`] once the call resolves.
#[derive(Debug)]
#[must_use = "a pending request must be finished or the controller stays busy"]
pub struct PendingRequest {
    controller_id: u64,
    message: String,
}

impl PendingRequest {
    /// The text to send, exactly as the user typed it.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub enum Submission {
    /// User entry appended; the caller should clear its input buffer and
    /// send the request.
    Dispatched(PendingRequest),
    /// A call is already in flight. Nothing changed.
    Rejected,
}

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct ExchangeController {
    id: u64,
    conversation: Conversation,
    busy: bool,
}

impl Default for ExchangeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeController {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed),
            conversation: Conversation::new(),
            busy: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn begin(&mut self, raw_input: &str) -> Result<Submission, ExchangeError> {
        if self.busy {
            debug!("submission rejected, a request is already in flight");
            return Ok(Submission::Rejected);
        }
        if raw_input.trim().is_empty() {
            return Err(ExchangeError::InvalidInput);
        }

        // The user entry must be visible before anything goes out on the wire
        self.conversation = self.conversation.append(ChatEntry::user(raw_input));
        self.busy = true;
        debug!(chars = raw_input.chars().count(), "dispatching completion request");

        Ok(Submission::Dispatched(PendingRequest {
            controller_id: self.id,
            message: raw_input.to_string(),
        }))
    }

    /// Apply the outcome of `pending`. A request that this controller did
    /// not dispatch is ignored: busy stays as it is and nothing is appended.
    pub fn finish(
        &mut self,
        pending: PendingRequest,
        outcome: Result<String, RemoteCallError>,
    ) -> Result<(), ExchangeError> {
        if pending.controller_id != self.id || !self.busy {
            warn!(
                controller = self.id,
                owner = pending.controller_id,
                "ignoring outcome of a request this controller did not dispatch"
            );
            return Ok(());
        }
        self.busy = false;

        match outcome {
            Ok(reply) => {
                info!(chars = reply.chars().count(), "completion received");
                self.conversation = self.conversation.append(ChatEntry::assistant(reply));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "completion request failed");
                Err(err.into())
            }
        }
    }

    /// Run a whole cycle. Returns `Ok(false)` if the submission was rejected
    /// because another call is in flight.
    pub async fn submit<S>(&mut self, service: &S, raw_input: &str) -> Result<bool, ExchangeError>
    where
        S: CompletionService + ?Sized,
    {
        let pending = match self.begin(raw_input)? {
            Submission::Dispatched(pending) => pending,
            Submission::Rejected => return Ok(false),
        };

        let outcome = service.complete(pending.message()).await;
        self.finish(pending, outcome)?;
        Ok(true)
    }
}
