// Secrets/config collaborator
// Four opaque values that parametrize the cloud connections. Their contents
// are never inspected or validated here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SECRETS_FILE: &str = "secrets.json";

const ENV_KEYS: [(&str, fn(&Secrets) -> &str); 4] = [
    ("AWS_ACCESS_KEY_ID", |s| &s.aws_access_key_id),
    ("AWS_SECRET_ACCESS_KEY", |s| &s.aws_secret_access_key),
    ("S3_STAGING_DIR", |s| &s.s3_staging_dir),
    ("AWS_REGION", |s| &s.aws_region),
];

/// Opaque connection secrets. Missing entries deserialize as empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub aws_access_key_id: String,

    #[serde(default)]
    pub aws_secret_access_key: String,

    #[serde(default)]
    pub s3_staging_dir: String,

    #[serde(default)]
    pub aws_region: String,
}

impl Secrets {
    /// Load from a JSON secrets file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse secrets file: {}", path.display()))
    }

    /// Build from the environment; `None` when no relevant value is set.
    pub fn from_env() -> Option<Self> {
        let secrets = Secrets {
            aws_access_key_id: std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            aws_secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            s3_staging_dir: std::env::var("S3_STAGING_DIR").unwrap_or_default(),
            aws_region: std::env::var("AWS_REGION").unwrap_or_default(),
        };

        if ENV_KEYS.iter().all(|(_, get)| get(&secrets).is_empty()) {
            None
        } else {
            Some(secrets)
        }
    }

    /// Secrets file if present, environment otherwise.
    pub fn discover(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Secrets::load(path).map(Some)
        } else {
            Ok(Secrets::from_env())
        }
    }

    /// Export the non-empty values into the process environment so the
    /// cloud SDK's default provider chain picks them up.
    pub fn apply_to_env(&self) {
        for (key, get) in ENV_KEYS {
            let value = get(self);
            if !value.is_empty() {
                std::env::set_var(key, value);
            }
        }
    }
}
