//! Durable backends for the session record.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::session::SessionRecord;
use crate::config::SessionBackend;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service the session entry lives under
const SERVICE_NAME: &str = "calcgate";

/// Keychain account name for the session entry
const SESSION_ACCOUNT: &str = "session";

/// Where the session record survives restarts.
pub trait SessionStorage: Send {
    fn load(&self) -> Result<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Build the configured backend. A keychain that cannot be opened falls
/// back to the session file.
pub fn storage_for(backend: SessionBackend, data_dir: &Path) -> Box<dyn SessionStorage> {
    match backend {
        SessionBackend::File => Box::new(FileStorage::new(data_dir)),
        SessionBackend::Keyring => match KeyringStorage::new() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                warn!(error = %e, "Keychain unavailable, using session file");
                Box::new(FileStorage::new(data_dir))
            }
        },
    }
}

/// JSON file in the application data directory
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let record = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(record)?;
        let mut file = private_file_options()
            .open(&self.path)
            .context("Failed to open session file")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write session file")?;
        // Mode only applies on creation; tighten files left by older versions
        restrict_permissions(&self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Truncating writer, created owner-only on unix
fn private_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .context("Failed to restrict session file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// One OS keychain entry holding the serialized record
pub struct KeyringStorage {
    entry: Entry,
}

impl KeyringStorage {
    pub fn new() -> Result<Self> {
        let entry =
            Entry::new(SERVICE_NAME, SESSION_ACCOUNT).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl SessionStorage for KeyringStorage {
    fn load(&self) -> Result<Option<SessionRecord>> {
        match self.entry.get_password() {
            Ok(contents) => {
                let record = serde_json::from_str(&contents)
                    .context("Failed to parse session from keychain")?;
                Ok(Some(record))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session from keychain"),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let contents = serde_json::to_string(record)?;
        self.entry
            .set_password(&contents)
            .context("Failed to store session in keychain")
    }

    fn remove(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}

/// Shared in-memory slot. Clones see the same record.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<SessionRecord>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(record))),
        }
    }

    /// What a fresh `load` would return right now
    pub fn stored(&self) -> Option<SessionRecord> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<SessionRecord>) -> T) -> Result<T> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Session slot lock poisoned"))?;
        Ok(f(&mut slot))
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionRecord>> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        self.with_slot(|slot| *slot = Some(record.clone()))
    }

    fn remove(&self) -> Result<()> {
        self.with_slot(|slot| *slot = None)
    }
}
