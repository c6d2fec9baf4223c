use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::{ApiError, Credentials, Message, MessagingApi};
use crate::app::AppContext;
use crate::poll::{PollEvent, PollLoop, PollState};
use crate::router::Route;
use crate::storage::{CredentialStore, StorageError};
use crate::utils::{chat_id, is_phone_input, phone_digits, validate_phone_number};

pub const SEND_FAILED: &str = "Failed to send message. Check the number and try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Type a message first.")]
    EmptyMessage,
    #[error("Enter the recipient's phone number.")]
    MissingPhoneNumber,
    #[error("Phone number must have 10 to 15 digits (got {digits}).")]
    InvalidPhoneNumber { digits: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to send message. Check the number and try again.")]
    Delivery(#[source] ApiError),
    #[error("not logged in")]
    AuthMissing,
}

/// A validated message ready to hand to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
}

pub struct ChatViewModel {
    api: Arc<dyn MessagingApi>,
    store: CredentialStore,
    creds: Credentials,
    messages: Vec<Message>,
    phone: String,
    input: String,
    poll: PollLoop,
    last_error: Option<String>,
}

impl ChatViewModel {
    /// Opens the chat and starts polling. Fails with `AuthMissing` when no
    /// credentials are stored, in which case the caller shows the login screen.
    pub fn mount(ctx: &AppContext, runtime: Handle) -> Result<(Self, UnboundedReceiver<PollEvent>), ChatError> {
        let creds = ctx.store.load().ok_or(ChatError::AuthMissing)?;
        let (mut poll, events) = PollLoop::new(
            ctx.api.clone(),
            creds.clone(),
            ctx.settings.poll_interval(),
            runtime,
        );
        poll.start();
        info!("Chat opened for instance {}", creds.instance_id);
        let vm = Self {
            api: ctx.api.clone(),
            store: ctx.store.clone(),
            creds,
            messages: Vec::new(),
            phone: String::new(),
            input: String::new(),
            poll,
            last_error: None,
        };
        Ok((vm, events))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phone_number(&self) -> &str {
        &self.phone
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    pub fn poll_state(&self) -> PollState {
        self.poll.state()
    }

    /// The inline error to show under the conversation, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Accepts `raw` only if it consists of `+`, digits, spaces and hyphens.
    pub fn set_phone_number(&mut self, raw: &str) -> bool {
        if !is_phone_input(raw) {
            return false;
        }
        self.phone = raw.to_string();
        true
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    /// Validates `raw_text` against the current recipient. A valid message
    /// clears whatever inline error was showing.
    pub fn prepare_send(&mut self, raw_text: &str) -> Result<OutgoingMessage, ChatError> {
        let res = self.validate(raw_text);
        self.last_error = res.as_ref().err().map(ToString::to_string);
        res.map_err(ChatError::from)
    }

    fn validate(&self, raw_text: &str) -> Result<OutgoingMessage, ValidationError> {
        if raw_text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingPhoneNumber);
        }
        let digits = phone_digits(&self.phone);
        if !validate_phone_number(&digits) {
            return Err(ValidationError::InvalidPhoneNumber { digits: digits.len() });
        }
        Ok(OutgoingMessage { chat_id: chat_id(&digits), text: raw_text.to_string() })
    }

    /// Records the outcome of sending `outgoing`.
    pub fn complete_send(&mut self, outgoing: OutgoingMessage, result: Result<String, ApiError>) -> Result<(), ChatError> {
        match result {
            Ok(id) => {
                info!("Sent message {} to {}", id, outgoing.chat_id);
                self.messages.push(Message::outgoing(outgoing.text));
                self.input.clear();
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Sending to {} failed: {}", outgoing.chat_id, e);
                self.last_error = Some(SEND_FAILED.to_string());
                Err(ChatError::Delivery(e))
            }
        }
    }

    pub async fn submit_message(&mut self, raw_text: &str) -> Result<(), ChatError> {
        let outgoing = self.prepare_send(raw_text)?;
        let result = self
            .api
            .send_message(&self.creds, &outgoing.chat_id, &outgoing.text)
            .await;
        self.complete_send(outgoing, result)
    }

    /// Folds a poll event into the conversation. Returns true when the view should redraw.
    pub fn apply(&mut self, event: PollEvent) -> bool {
        match self.poll.observe(event) {
            Some(PollEvent::Incoming { text, .. }) => {
                self.messages.push(Message::incoming(text));
                true
            }
            Some(PollEvent::Failed { error, .. }) => {
                self.last_error = Some(format!("Stopped receiving messages: {}", error));
                true
            }
            None => false,
        }
    }

    /// Pause/resume receiving. Has no effect after a receive failure.
    pub fn toggle_polling(&mut self) -> PollState {
        self.poll.toggle()
    }

    /// The view is going away; no further cycles run.
    pub fn unmount(&mut self) {
        self.poll.shutdown();
    }

    /// Stops polling, forgets the credentials and sends the user back to login.
    pub fn logout(&mut self) -> Result<Route, StorageError> {
        self.poll.shutdown();
        self.store.clear()?;
        info!("Logged out of instance {}", self.creds.instance_id);
        Ok(Route::Login)
    }
}
