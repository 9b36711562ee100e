//! Filesystem primitives for the commit log.
//!
//! Centralizes path handling and the two write disciplines the commit
//! protocol relies on:
//!
//! - [`write_atomic`]: write-then-rename replacement, used for the CURRENT
//!   pointer so readers never observe a partial write.
//! - [`write_new`]: create-only creation, used for commit files so that two
//!   racing writers cannot both create the same version.
//!
//! Only the local filesystem is supported; the API keeps a location enum so
//! a remote backend could be added without rewriting the ledger logic.

use snafu::{prelude::*, Backtrace};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Location of a registry root.
#[derive(Clone, Debug)]
pub enum RegistryLocation {
    /// A registry stored on the local filesystem at the given path.
    Local(PathBuf),
}

impl RegistryLocation {
    /// Creates a `RegistryLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        RegistryLocation::Local(root.into())
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The specified path already exists when creation was requested with
    /// create-new semantics.
    #[snafu(display("Path already exists: {path}"))]
    AlreadyExists {
        /// The path that was found to already exist.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Any other I/O error on the local filesystem.
    #[snafu(display("I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

fn join_local(location: &RegistryLocation, rel: &Path) -> PathBuf {
    match location {
        RegistryLocation::Local(root) => root.join(rel),
    }
}

fn classify(path: &Path, source: io::Error) -> StorageError {
    let path = path.display().to_string();
    match source.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
        _ => StorageError::OtherIo {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
    }
}

async fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| classify(parent, e))?;
    }
    Ok(())
}

/// Guard that removes a temporary file on drop unless disarmed.
/// Ensures cleanup on error paths during atomic writes.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Disarm after a successful rename so the file is kept.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are likely already handling another error.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Write `contents` to `rel` under `location` with write-then-rename
/// replacement semantics.
pub async fn write_atomic(
    location: &RegistryLocation,
    rel: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = join_local(location, rel);
    create_parent_dir(&abs).await?;

    let tmp = abs.with_extension("tmp");
    let mut guard = TempFileGuard::new(tmp.clone());

    let mut file = fs::File::create(&tmp).await.map_err(|e| classify(&tmp, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| classify(&tmp, e))?;
    file.sync_all().await.map_err(|e| classify(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, &abs).await.map_err(|e| classify(&abs, e))?;
    guard.disarm();
    Ok(())
}

/// Create `rel` under `location` with create-only semantics.
///
/// Fails with [`StorageError::AlreadyExists`] when the file is present;
/// this is the atomic guard the commit protocol relies on to detect a lost
/// race.
pub async fn write_new(
    location: &RegistryLocation,
    rel: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = join_local(location, rel);
    create_parent_dir(&abs).await?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&abs)
        .await
        .map_err(|e| classify(&abs, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| classify(&abs, e))?;
    file.sync_all().await.map_err(|e| classify(&abs, e))?;
    Ok(())
}

/// Read `rel` under `location` to a string.
pub async fn read_to_string(location: &RegistryLocation, rel: &Path) -> StorageResult<String> {
    let abs = join_local(location, rel);
    fs::read_to_string(&abs).await.map_err(|e| classify(&abs, e))
}
