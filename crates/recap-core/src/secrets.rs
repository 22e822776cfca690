//! API key storage.
//!
//! Secrets are kept out of the main settings document in a separate
//! key-value store keyed by provider name. The production implementation
//! persists a single JSON document under the user config dir with owner-only
//! permissions; tests use the in-memory variant.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to access secret store: {0}")]
    Io(#[from] std::io::Error),
    #[error("secret store is corrupted: {0}")]
    Format(#[from] serde_json::Error),
}

/// Store/retrieve/delete a secret string keyed by provider name.
pub trait SecretStore: Send + Sync {
    fn put(&self, provider: &str, secret: &str) -> Result<(), SecretError>;
    fn get(&self, provider: &str) -> Result<Option<String>, SecretError>;
    fn delete(&self, provider: &str) -> Result<(), SecretError>;
}

/// File-backed secret store. The whole document is rewritten on every
/// mutation; reads always go to disk so concurrent CLI invocations see each
/// other's writes.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("recap").join("secrets.json"))
    }

    fn load(&self) -> Result<HashMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, secrets: &HashMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(secrets)?)?;

        // Secrets are readable by the owner only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn put(&self, provider: &str, secret: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        secrets.insert(provider.to_string(), secret.to_string());
        self.save(&secrets)
    }

    fn get(&self, provider: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.get(provider).cloned())
    }

    fn delete(&self, provider: &str) -> Result<(), SecretError> {
        let mut secrets = self.load()?;
        if secrets.remove(provider).is_some() {
            self.save(&secrets)?;
        }
        Ok(())
    }
}

/// In-memory secret store for tests.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn put(&self, provider: &str, secret: &str) -> Result<(), SecretError> {
        self.secrets
            .lock()
            .unwrap()
            .insert(provider.to_string(), secret.to_string());
        Ok(())
    }

    fn get(&self, provider: &str) -> Result<Option<String>, SecretError> {
        Ok(self.secrets.lock().unwrap().get(provider).cloned())
    }

    fn delete(&self, provider: &str) -> Result<(), SecretError> {
        self.secrets.lock().unwrap().remove(provider);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));

        assert_eq!(store.get("openai").unwrap(), None);

        store.put("openai", "sk-test").unwrap();
        assert_eq!(store.get("openai").unwrap(), Some("sk-test".to_string()));

        // Overwrite keeps a single entry
        store.put("openai", "sk-other").unwrap();
        assert_eq!(store.get("openai").unwrap(), Some("sk-other".to_string()));

        store.delete("openai").unwrap();
        assert_eq!(store.get("openai").unwrap(), None);
    }

    #[test]
    fn delete_of_missing_key_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));
        store.delete("anthropic").unwrap();
        assert!(!dir.path().join("secrets.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn secrets_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let store = FileSecretStore::new(&path);
        store.put("mistral", "key").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
