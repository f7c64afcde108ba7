use crate::infrastructure::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "weeksched.json";
const CONFIG_SCHEMA: u64 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenStoreKind {
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u64,
    pub timezone: String,
    pub calendar_id: String,
    pub listen_addr: String,
    pub backup_path: String,
    pub token_store: TokenStoreKind,
    pub token_path: String,
    pub oauth: OAuthSettings,
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

fn default_config() -> serde_json::Value {
    serde_json::json!({
        "schema": CONFIG_SCHEMA,
        "timezone": "America/New_York",
        "calendarId": "primary",
        "listenAddr": "127.0.0.1:8080",
        "backupPath": "schedule_backup.json",
        "tokenStore": "file",
        "tokenPath": "token.json",
        "oauth": {
            "clientId": "",
            "clientSecret": "",
            "redirectUri": "http://127.0.0.1:8080/oauth2/callback"
        }
    })
}

/// Write the default config when none exists yet. Existing files are left
/// untouched.
pub fn ensure_default_config(config_dir: &Path) -> Result<(), AppError> {
    let path = config_path(config_dir);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_config())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_config(config_dir: &Path) -> Result<AppConfig, AppError> {
    let path = config_path(config_dir);
    let raw = fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;

    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| {
            AppError::InvalidConfig(format!("missing schema in {}", path.display()))
        })?;
    if schema != CONFIG_SCHEMA {
        return Err(AppError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }

    serde_json::from_value(parsed).map_err(|error| {
        AppError::InvalidConfig(format!("invalid config {}: {error}", path.display()))
    })
}
