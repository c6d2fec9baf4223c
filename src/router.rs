use crate::storage::CredentialStore;

/// The two screens of the app, addressed the same way the web client addressed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Chat => "/chat",
        }
    }

    /// Unknown paths fall back to the login screen.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/chat" | "chat" => Route::Chat,
            _ => Route::Login,
        }
    }
}

/// Where a request for `wanted` actually lands. The chat needs stored credentials.
pub fn resolve(wanted: Route, store: &CredentialStore) -> Route {
    match wanted {
        Route::Chat if store.load().is_none() => Route::Login,
        other => other,
    }
}
