use crate::domain::models::OAuthToken;
use crate::infrastructure::error::AppError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait CredentialStore: Send + Sync {
    fn save_token(&self, token: &OAuthToken) -> Result<(), AppError>;
    fn load_token(&self) -> Result<Option<OAuthToken>, AppError>;
    fn delete_token(&self) -> Result<(), AppError>;
}

/// Plain JSON token file next to the config, mirroring the classic
/// `token.pickle`-on-disk layout this tool replaces.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        let payload = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, format!("{payload}\n"))?;
        Ok(())
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(value) => value,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(AppError::Io(error)),
        };
        let token = serde_json::from_str::<OAuthToken>(&raw).map_err(|error| {
            AppError::Credential(format!(
                "invalid token file {}: {error}",
                self.path.display()
            ))
        })?;
        Ok(Some(token))
    }

    fn delete_token(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Io(error)),
        }
    }
}

/// OS keychain store via the `keyring` crate.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service_name: String,
    account_name: String,
}

impl KeyringCredentialStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, AppError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| AppError::Credential(error.to_string()))
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new("weeksched.oauth.google", "default")
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        let payload = serde_json::to_string(token)
            .map_err(|error| AppError::Credential(error.to_string()))?;
        self.entry()?
            .set_password(&payload)
            .map_err(|error| AppError::Credential(error.to_string()))
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, AppError> {
        let payload = match self.entry()?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(AppError::Credential(error.to_string())),
        };
        let token = serde_json::from_str::<OAuthToken>(&payload)
            .map_err(|error| AppError::Credential(error.to_string()))?;
        Ok(Some(token))
    }

    fn delete_token(&self) -> Result<(), AppError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AppError::Credential(error.to_string())),
        }
    }
}

/// The store selected by configuration.
#[derive(Debug)]
pub enum ConfiguredCredentialStore {
    File(FileCredentialStore),
    Keyring(KeyringCredentialStore),
}

impl CredentialStore for ConfiguredCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        match self {
            ConfiguredCredentialStore::File(store) => store.save_token(token),
            ConfiguredCredentialStore::Keyring(store) => store.save_token(token),
        }
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, AppError> {
        match self {
            ConfiguredCredentialStore::File(store) => store.load_token(),
            ConfiguredCredentialStore::Keyring(store) => store.load_token(),
        }
    }

    fn delete_token(&self) -> Result<(), AppError> {
        match self {
            ConfiguredCredentialStore::File(store) => store.delete_token(),
            ConfiguredCredentialStore::Keyring(store) => store.delete_token(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: Mutex<Option<OAuthToken>>,
}

impl CredentialStore for InMemoryCredentialStore {
    fn save_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|error| AppError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(token.clone());
        Ok(())
    }

    fn load_token(&self) -> Result<Option<OAuthToken>, AppError> {
        let guard = self
            .token
            .lock()
            .map_err(|error| AppError::Credential(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn delete_token(&self) -> Result<(), AppError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|error| AppError::Credential(format!("in-memory lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }
}
