use log::{info, warn};
use thiserror::Error;

use crate::api::{Credentials, MessagingApi};
use crate::router::Route;
use crate::storage::{CredentialStore, StorageError};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Please enter the instance ID and API token.")]
    MissingFields,
    #[error("Failed to save settings: {0}")]
    Storage(#[from] StorageError),
}

/// The two fields of the login form.
#[derive(Debug, Clone, Default)]
pub struct LoginViewModel {
    pub instance_id: String,
    pub api_token: String,
}

impl LoginViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.instance_id.trim(), self.api_token.trim())
    }

    /// Stores the credentials and moves on to the chat. Only presence is checked.
    pub fn submit(&self, store: &CredentialStore) -> Result<Route, LoginError> {
        let creds = self.credentials();
        if !creds.is_complete() {
            return Err(LoginError::MissingFields);
        }
        store.save(&creds.instance_id, &creds.api_token)?;
        Ok(Route::Chat)
    }

    /// Human readable instance status for the login screen. Never blocks the login.
    pub async fn check_instance(&self, api: &dyn MessagingApi) -> String {
        let creds = self.credentials();
        match api.instance_state(&creds).await {
            Ok(state) if state == "authorized" => "Connected".to_string(),
            Ok(state) => {
                info!("Instance {} reports state {}", creds.instance_id, state);
                format!("Saved (instance is {})", state)
            }
            Err(e) => {
                warn!("Instance check failed: {}", e);
                "Saved (instance unreachable)".to_string()
            }
        }
    }
}
