use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LendkitError;

use super::token::Credentials;

/// Storage abstraction for the persisted token pair.
///
/// The client never assumes a particular persistence mechanism; it only
/// reads and writes through this interface. Implementations must be safe to
/// use from non-interactive environments (see [`NoopTokenStore`]).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>, LendkitError>;
    fn save(&self, credentials: &Credentials) -> Result<(), LendkitError>;
    fn clear(&self) -> Result<(), LendkitError>;
}

/// File-backed token store using a single TOML document.
///
/// A missing file loads as `None`; clearing a missing file is a no-op.
///
/// # Example
/// ```no_run
/// use lendkit::auth::{Credentials, FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&Credentials::new("access", "refresh"))?;
/// # Ok::<(), lendkit::error::LendkitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store credentials under `~/.lendkit/credentials.toml`.
    pub fn new_default() -> Self {
        Self {
            path: default_lendkit_dir().join("credentials.toml"),
        }
    }

    fn ensure_parent(path: &Path) -> Result<(), LendkitError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credentials>, LendkitError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LendkitError::Store(err.to_string())),
        };
        let file: CredentialsFile = toml::from_str(&raw)?;
        Ok(Some(file.credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), LendkitError> {
        Self::ensure_parent(&self.path)?;
        let file = CredentialsFile {
            version: 1,
            credentials: credentials.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&self.path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), LendkitError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(LendkitError::Store(err.to_string())),
        }
    }
}

/// Token store for contexts with no credential persistence at all
/// (server-side rendering, scripts running against public endpoints).
///
/// Loads nothing and discards writes, so every authorized call simply goes
/// out without a bearer header and refresh never has a token to work with.
#[derive(Debug, Clone, Default)]
pub struct NoopTokenStore;

impl NoopTokenStore {
    pub fn new() -> Self {
        Self
    }
}

impl TokenStore for NoopTokenStore {
    fn load(&self) -> Result<Option<Credentials>, LendkitError> {
        Ok(None)
    }

    fn save(&self, _credentials: &Credentials) -> Result<(), LendkitError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), LendkitError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialsFile {
    version: u32,
    credentials: Credentials,
    saved_at: DateTime<Utc>,
}

fn default_lendkit_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".lendkit"))
        .unwrap_or_else(|| PathBuf::from(".lendkit"))
}
