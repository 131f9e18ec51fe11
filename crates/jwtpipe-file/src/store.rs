//! File-backed credential store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use jwtpipe_core::{AccessToken, CredentialStore, RefreshToken, TokenKind, TokenPair};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Errors raised while loading a credentials file.
///
/// Only [`FileStore::open`] fails; once open, persistence problems are
/// logged and the in-memory credentials stay authoritative.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt credentials file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk layout.
#[derive(Default, Clone, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl StoredCredentials {
    fn slot(&mut self, kind: TokenKind) -> &mut Option<String> {
        match kind {
            TokenKind::Access => &mut self.access_token,
            TokenKind::Refresh => &mut self.refresh_token,
        }
    }

    fn refresh_is(&self, expected: Option<&RefreshToken>) -> bool {
        self.refresh_token.as_deref() == expected.map(RefreshToken::as_str)
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A [`CredentialStore`] persisted to a JSON file.
///
/// Reads never touch the disk. Writes update memory first, then replace the
/// file atomically (temp file + rename) while holding an exclusive lock on a
/// sibling `.lock` file. The file I/O runs on the calling thread, after the
/// in-memory lock has been released. On unix the file is only readable by
/// its owner.
pub struct FileStore {
    path: PathBuf,
    slots: RwLock<StoredCredentials>,
    // Serializes writers so the file always reflects the latest update.
    persist: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading credentials if the file exists.
    ///
    /// A missing file is an empty (anonymous) store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref().to_path_buf();

        let stored = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| OpenError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => StoredCredentials::default(),
            Err(source) => return Err(OpenError::Io { path, source }),
        };

        debug!(authenticated = !stored.is_empty(), "Loaded credentials");

        Ok(Self {
            path,
            slots: RwLock::new(stored),
            persist: Mutex::new(()),
        })
    }

    /// Returns the credentials file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `update` in memory, then write the result through to disk.
    ///
    /// Nothing is written when `update` declines the change by returning false.
    fn update(&self, update: impl FnOnce(&mut StoredCredentials) -> bool) -> bool {
        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            if !update(&mut slots) {
                return false;
            }
            slots.clone()
        };

        let result = if snapshot.is_empty() {
            self.remove()
        } else {
            self.write(&snapshot)
        };

        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "Failed to persist credentials");
        }
        true
    }

    fn write(&self, stored: &StoredCredentials) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(stored).map_err(io::Error::other)?;

        let lock = self.lock()?;
        let tmp = self.sibling("tmp");
        {
            let mut file = private_file(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        FileExt::unlock(&lock)?;

        debug!(path = %self.path.display(), "Credentials written");
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        let lock = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Credentials file removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        FileExt::unlock(&lock)?;
        Ok(())
    }

    /// Take the cross-process lock. Released when the handle is dropped.
    fn lock(&self) -> io::Result<File> {
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.sibling("lock"))?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(extension);
        self.path.with_file_name(name)
    }
}

fn private_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path)
}

impl CredentialStore for FileStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match kind {
            TokenKind::Access => slots.access_token.clone(),
            TokenKind::Refresh => slots.refresh_token.clone(),
        }
    }

    fn set(&self, kind: TokenKind, value: String) {
        self.update(|slots| {
            *slots.slot(kind) = Some(value);
            true
        });
    }

    fn set_pair(&self, pair: TokenPair) {
        self.update(|slots| {
            slots.access_token = Some(pair.access.as_str().to_string());
            slots.refresh_token = Some(pair.refresh.as_str().to_string());
            true
        });
    }

    fn clear(&self) {
        self.update(|slots| {
            *slots = StoredCredentials::default();
            true
        });
    }

    fn renew_access(
        &self,
        issued_with: &RefreshToken,
        access: &AccessToken,
        rotated: Option<&RefreshToken>,
    ) -> bool {
        self.update(|slots| {
            if !slots.refresh_is(Some(issued_with)) {
                return false;
            }
            slots.access_token = Some(access.as_str().to_string());
            if let Some(rotated) = rotated {
                slots.refresh_token = Some(rotated.as_str().to_string());
            }
            true
        })
    }

    fn clear_if(&self, expected: Option<&RefreshToken>) -> bool {
        self.update(|slots| {
            if !slots.refresh_is(expected) {
                return false;
            }
            *slots = StoredCredentials::default();
            true
        })
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
