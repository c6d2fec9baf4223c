use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::client::MessagingApi;
use crate::api::error::ApiError;
use crate::api::events::{MessageData, Notification, TextMessageData, WebhookBody, INCOMING_MESSAGE};
use crate::api::models::Credentials;

/// Scripted stand-in for the provider. Unscripted receives return an empty queue.
/// With a receive delay, the scripted result is only taken once the delay has
/// passed, so an abandoned receive leaves it queued.
#[derive(Default)]
pub struct FakeApi {
    receives: Mutex<VecDeque<Result<Option<Notification>, ApiError>>>,
    receive_delay: Mutex<Option<Duration>>,
    send_result: Mutex<Option<ApiError>>,
    delete_result: Mutex<Option<ApiError>>,
    pub receive_calls: AtomicUsize,
    pub sent: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<u64>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_receive(&self, res: Result<Option<Notification>, ApiError>) {
        self.receives.lock().unwrap().push_back(res);
    }

    pub fn delay_receives(&self, delay: Duration) {
        *self.receive_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_sends(&self, err: ApiError) {
        *self.send_result.lock().unwrap() = Some(err);
    }

    pub fn fail_deletes(&self, err: ApiError) {
        *self.delete_result.lock().unwrap() = Some(err);
    }

    pub fn receive_count(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }
}

pub fn text_notification(receipt_id: u64, text: &str) -> Notification {
    Notification {
        receipt_id,
        body: WebhookBody {
            type_webhook: INCOMING_MESSAGE.to_string(),
            sender_data: None,
            message_data: Some(MessageData {
                type_message: Some("textMessage".into()),
                text_message_data: Some(TextMessageData { text_message: text.to_string() }),
                extended_text_message_data: None,
            }),
        },
    }
}

pub fn status_notification(receipt_id: u64) -> Notification {
    Notification {
        receipt_id,
        body: WebhookBody {
            type_webhook: "outgoingMessageStatus".into(),
            ..WebhookBody::default()
        },
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn send_message(&self, _creds: &Credentials, chat_id: &str, text: &str) -> Result<String, ApiError> {
        if let Some(err) = self.send_result.lock().unwrap().clone() {
            return Err(err);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id.to_string(), text.to_string()));
        Ok(format!("MSG{}", sent.len()))
    }

    async fn receive_notification(&self, _creds: &Credentials) -> Result<Option<Notification>, ApiError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.receive_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.receives.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    async fn delete_notification(&self, _creds: &Credentials, receipt_id: u64) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(receipt_id);
        match self.delete_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn instance_state(&self, _creds: &Credentials) -> Result<String, ApiError> {
        Ok("authorized".into())
    }
}
