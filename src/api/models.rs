use serde::{Deserialize, Serialize};

pub const ENV_INSTANCE_ID: &str = "GREEN_API_ID_INSTANCE";
pub const ENV_API_TOKEN: &str = "GREEN_API_TOKEN_INSTANCE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Credentials {
    pub instance_id: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(instance_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            api_token: api_token.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.instance_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    /// Credentials supplied through the environment, if both are set.
    pub fn from_env() -> Option<Self> {
        let id = std::env::var(ENV_INSTANCE_ID).ok()?;
        let token = std::env::var(ENV_API_TOKEN).ok()?;
        Some(Self::new(id, token)).filter(Credentials::is_complete)
    }
}

/// One line in the conversation. Position in the list is its only identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub from_user: bool,
}

impl Message {
    pub fn outgoing(text: impl Into<String>) -> Self {
        Self { text: text.into(), from_user: true }
    }

    pub fn incoming(text: impl Into<String>) -> Self {
        Self { text: text.into(), from_user: false }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(default)]
    pub id_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStateResponse {
    #[serde(default)]
    pub state_instance: Option<String>,
}
