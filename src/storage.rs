use crate::api::models::Credentials;
use directories::ProjectDirs;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize credentials: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "example", "WaChatGTK")
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Persists the instance id / API token pair between runs.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    fallback: Option<Credentials>,
}

impl CredentialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), fallback: None }
    }

    /// Also accept `GREEN_API_ID_INSTANCE` / `GREEN_API_TOKEN_INSTANCE` when nothing is stored.
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(Credentials::from_env())
    }

    /// Credentials to use while no credential file exists. After a logout the
    /// file holds empty values, so the fallback stays unused until the next save.
    pub fn with_fallback(mut self, creds: Option<Credentials>) -> Self {
        self.fallback = creds.filter(Credentials::is_complete);
        self
    }

    pub fn default_location() -> Result<Self, StorageError> {
        let proj = project_dirs().ok_or(StorageError::NoConfigDir)?;
        Ok(Self::at(proj.config_dir().join("credentials.toml")).with_env_fallback())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, instance_id: &str, api_token: &str) -> Result<(), StorageError> {
        let creds = Credentials::new(instance_id.trim(), api_token.trim());
        let text = toml::to_string_pretty(&creds)?;
        ensure_dir(&self.path)?;
        fs::write(&self.path, text)?;
        info!("Saved credentials for instance {}", creds.instance_id);
        Ok(())
    }

    /// Stored credentials, or `None` when nothing usable is available.
    pub fn load(&self) -> Option<Credentials> {
        match fs::read_to_string(&self.path) {
            Ok(text) => self.parse_file(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => self.fallback.clone(),
            Err(e) => {
                debug!("Cannot read credential file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn parse_file(&self, text: &str) -> Option<Credentials> {
        match toml::from_str::<Credentials>(text) {
            Ok(creds) if creds.is_complete() => Some(creds),
            Ok(_) => None,
            Err(e) => {
                debug!("Ignoring unreadable credential file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        if self.fallback.is_some() {
            // An emptied file masks the fallback; a missing one would not.
            let text = toml::to_string_pretty(&Credentials::default())?;
            ensure_dir(&self.path)?;
            fs::write(&self.path, text)?;
            info!("Cleared stored credentials");
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared stored credentials");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CredentialStore {
        CredentialStore::at(dir.path().join("nested").join("credentials.toml"))
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.load().is_none());

        store.save("1101000001", " abc123 ").unwrap();
        assert_eq!(store.load(), Some(Credentials::new("1101000001", "abc123")));
    }

    #[test]
    fn a_second_store_sees_saved_values() {
        let dir = TempDir::new().unwrap();
        store(&dir).save("1101000001", "abc123").unwrap();
        let reopened = CredentialStore::at(store(&dir).path().to_path_buf());
        assert!(reopened.load().is_some());
    }

    #[test]
    fn clear_removes_both_values() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save("1101000001", "abc123").unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.path().exists());
        // clearing again is fine
        store.clear().unwrap();
    }

    #[test]
    fn incomplete_or_garbled_files_load_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        ensure_dir(store.path()).unwrap();

        fs::write(store.path(), "instance_id = \"1101000001\"\napi_token = \"\"\n").unwrap();
        assert!(store.load().is_none());

        fs::write(store.path(), "not toml at all [").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn fallback_applies_only_until_logout() {
        let dir = TempDir::new().unwrap();
        let env = Credentials::new("1101000001", "envtoken");
        let store = store(&dir).with_fallback(Some(env.clone()));
        assert_eq!(store.load(), Some(env.clone()));

        store.save("1101000002", "filetoken").unwrap();
        assert_eq!(store.load(), Some(Credentials::new("1101000002", "filetoken")));

        store.clear().unwrap();
        assert!(store.load().is_none());
        let reopened = CredentialStore::at(store.path().to_path_buf()).with_fallback(Some(env));
        assert!(reopened.load().is_none());

        // logging in again replaces the emptied file
        reopened.save("1101000003", "newtoken").unwrap();
        assert_eq!(reopened.load(), Some(Credentials::new("1101000003", "newtoken")));
    }

    #[test]
    fn incomplete_fallback_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).with_fallback(Some(Credentials::new("1101000001", " ")));
        assert!(store.load().is_none());
        store.clear().unwrap();
        assert!(!store.path().exists());
    }
}
