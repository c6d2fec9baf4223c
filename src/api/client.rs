use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::api::error::ApiError;
use crate::api::events::Notification;
use crate::api::models::{Credentials, InstanceStateResponse, SendMessageRequest, SendMessageResponse};

/// The operations the chat needs from the messaging provider.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Sends `text` to `chat_id` and returns the provider's message id.
    async fn send_message(&self, creds: &Credentials, chat_id: &str, text: &str) -> Result<String, ApiError>;

    /// Fetches the next queued notification. `Ok(None)` means the queue is empty.
    async fn receive_notification(&self, creds: &Credentials) -> Result<Option<Notification>, ApiError>;

    /// Acknowledges a notification so it is not delivered again.
    async fn delete_notification(&self, creds: &Credentials, receipt_id: u64) -> Result<(), ApiError>;

    /// Authorization state of the instance, e.g. `authorized` or `notAuthorized`.
    async fn instance_state(&self, creds: &Credentials) -> Result<String, ApiError>;
}

pub struct GreenApiClient {
    pub http: HttpClient,
    base: Url,
}

impl GreenApiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(&crate::utils::normalize_url(api_url))
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(api_url.to_string()));
        }
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn from_settings(settings: &crate::app::Settings) -> Result<Self, ApiError> {
        Self::new(&settings.api_url, settings.request_timeout())
    }

    /// `{base}/waInstance{id}/{method}/{token}[/{extra}]`
    fn endpoint(&self, creds: &Credentials, method: &str, extra: Option<&str>) -> Result<Url, ApiError> {
        if !creds.is_complete() {
            return Err(ApiError::MissingCredentials);
        }
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.push(&format!("waInstance{}", creds.instance_id.trim()));
            segments.push(method);
            segments.push(creds.api_token.trim());
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    async fn read_success(resp: reqwest::Response) -> Result<String, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }
}

/// The receive endpoint answers `null` when nothing is queued.
pub fn parse_notification(body: &str) -> Result<Option<Notification>, ApiError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str::<Option<Notification>>(trimmed).map_err(|e| ApiError::Malformed(e.to_string()))
}

#[async_trait]
impl MessagingApi for GreenApiClient {
    async fn send_message(&self, creds: &Credentials, chat_id: &str, text: &str) -> Result<String, ApiError> {
        let url = self.endpoint(creds, "sendMessage", None)?;
        let body = SendMessageRequest { chat_id, message: text };
        let resp = self.http.post(url).json(&body).send().await?;
        let raw = Self::read_success(resp).await?;
        let parsed: SendMessageResponse =
            serde_json::from_str(&raw).map_err(|e| ApiError::Malformed(e.to_string()))?;
        match parsed.id_message {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ApiError::Malformed("No idMessage in response".into())),
        }
    }

    async fn receive_notification(&self, creds: &Credentials) -> Result<Option<Notification>, ApiError> {
        let url = self.endpoint(creds, "receiveNotification", None)?;
        let resp = self.http.get(url).send().await?;
        let text = Self::read_success(resp).await?;
        parse_notification(&text)
    }

    async fn delete_notification(&self, creds: &Credentials, receipt_id: u64) -> Result<(), ApiError> {
        let receipt = receipt_id.to_string();
        let url = self.endpoint(creds, "deleteNotification", Some(&receipt))?;
        let resp = self.http.delete(url).send().await?;
        let text = Self::read_success(resp).await?;
        let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if json.get("result").and_then(|v| v.as_bool()) == Some(false) {
            return Err(ApiError::Malformed(format!("receipt {} was not deleted", receipt_id)));
        }
        Ok(())
    }

    async fn instance_state(&self, creds: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint(creds, "getStateInstance", None)?;
        let resp = self.http.get(url).send().await?;
        let text = Self::read_success(resp).await?;
        let parsed: InstanceStateResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Malformed(e.to_string()))?;
        parsed
            .state_instance
            .ok_or_else(|| ApiError::Malformed("No stateInstance in response".into()))
    }
}
