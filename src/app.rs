use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{GreenApiClient, MessagingApi};
use crate::storage::CredentialStore;

pub const DEFAULT_API_URL: &str = "https://api.green-api.com";
pub const ENV_API_URL: &str = "GREEN_API_URL";
pub const ENV_POLL_INTERVAL: &str = "WACHAT_POLL_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    fn toml_path() -> Option<PathBuf> {
        let proj = crate::storage::project_dirs()?;
        Some(proj.config_dir().join("settings.toml"))
    }

    /// Settings file if present, defaults otherwise, then environment overrides.
    pub fn load() -> Self {
        let from_file = Self::toml_path().map(|p| Self::load_from(&p)).unwrap_or_default();
        from_file.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(text) = fs::read_to_string(path) {
            match toml::from_str::<Settings>(&text) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("Ignoring invalid settings file {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(secs) = lookup(ENV_POLL_INTERVAL).and_then(|s| s.trim().parse().ok()) {
            self.poll_interval_secs = secs;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Everything a screen needs, handed down explicitly instead of read from globals.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub store: CredentialStore,
    pub api: Arc<dyn MessagingApi>,
}

impl AppContext {
    pub fn new(settings: Settings, store: CredentialStore, api: Arc<dyn MessagingApi>) -> Self {
        Self { settings, store, api }
    }

    /// Context for the standard config locations.
    pub fn from_environment() -> Result<Self, String> {
        let mut settings = Settings::load();
        let store = CredentialStore::default_location().map_err(|e| e.to_string())?;
        let client = match GreenApiClient::from_settings(&settings) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("{}; falling back to {}", e, DEFAULT_API_URL);
                settings.api_url = DEFAULT_API_URL.to_string();
                GreenApiClient::from_settings(&settings).map_err(|e| e.to_string())?
            }
        };
        Ok(Self::new(settings, store, Arc::new(client)))
    }
}

#[cfg(feature = "gui")]
pub fn build_ui(app: &adw::Application, ctx: AppContext) {
    use crate::router::{resolve, Route};

    match resolve(Route::Chat, &ctx.store) {
        Route::Chat => crate::ui::main_window::show_main_window(app, ctx),
        Route::Login => crate::ui::login::show_login_window(app, ctx),
    }
}
