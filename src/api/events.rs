use serde::{Deserialize, Serialize};

pub const INCOMING_MESSAGE: &str = "incomingMessageReceived";

/// A queued webhook fetched through `receiveNotification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub receipt_id: u64,
    #[serde(default)]
    pub body: WebhookBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBody {
    #[serde(default)]
    pub type_webhook: String,
    #[serde(default)]
    pub sender_data: Option<SenderData>,
    #[serde(default)]
    pub message_data: Option<MessageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SenderData {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    #[serde(default)]
    pub type_message: Option<String>,
    #[serde(default)]
    pub text_message_data: Option<TextMessageData>,
    #[serde(default)]
    pub extended_text_message_data: Option<ExtendedTextMessageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageData {
    pub text_message: String,
}

// Sent instead of textMessageData when WhatsApp attaches a link preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedTextMessageData {
    pub text: String,
}

impl Notification {
    /// The inbound text carried by this notification, if it is an incoming text message.
    pub fn incoming_text(&self) -> Option<&str> {
        if self.body.type_webhook != INCOMING_MESSAGE {
            return None;
        }
        let data = self.body.message_data.as_ref()?;
        data.text_message_data
            .as_ref()
            .map(|t| t.text_message.as_str())
            .or_else(|| data.extended_text_message_data.as_ref().map(|t| t.text.as_str()))
    }
}
