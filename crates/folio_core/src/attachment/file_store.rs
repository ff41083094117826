//! File store contract and local-disk implementation.

use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub type FileStoreResult<T> = Result<T, FileStoreError>;

#[derive(Debug)]
pub enum FileStoreError {
    /// Reference is empty or could escape the store root.
    InvalidName(String),
    /// A file is already stored under this reference.
    AlreadyExists(String),
    Io { reference: String, source: io::Error },
}

impl Display for FileStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid stored file name `{name}`"),
            Self::AlreadyExists(name) => write!(f, "stored file `{name}` already exists"),
            Self::Io { reference, source } => {
                write!(f, "file store I/O failed for `{reference}`: {source}")
            }
        }
    }
}

impl Error for FileStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Flat name-addressed blob store for uploaded attachments.
pub trait FileStore {
    /// Stores `bytes` under `name` and returns the reference to persist.
    fn put(&self, name: &str, bytes: &[u8]) -> FileStoreResult<String>;
    fn read(&self, reference: &str) -> FileStoreResult<Vec<u8>>;
    /// Removes a stored file. Removing a missing file succeeds.
    fn delete(&self, reference: &str) -> FileStoreResult<()>;
    fn exists(&self, reference: &str) -> FileStoreResult<bool>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn put(&self, name: &str, bytes: &[u8]) -> FileStoreResult<String> {
        (**self).put(name, bytes)
    }

    fn read(&self, reference: &str) -> FileStoreResult<Vec<u8>> {
        (**self).read(reference)
    }

    fn delete(&self, reference: &str) -> FileStoreResult<()> {
        (**self).delete(reference)
    }

    fn exists(&self, reference: &str) -> FileStoreResult<bool> {
        (**self).exists(reference)
    }
}

/// Stores attachments as plain files directly under one uploads directory.
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> FileStoreResult<PathBuf> {
        check_reference(reference)?;
        Ok(self.root.join(reference))
    }
}

impl FileStore for DiskFileStore {
    fn put(&self, name: &str, bytes: &[u8]) -> FileStoreResult<String> {
        let target = self.resolve(name)?;
        let io_err = |source| FileStoreError::Io {
            reference: name.to_string(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_err)?;
        if target.exists() {
            return Err(FileStoreError::AlreadyExists(name.to_string()));
        }

        // Write-then-rename so readers never observe a partial file.
        let staging = self.root.join(format!(".{name}.partial"));
        let written = fs::File::create(&staging)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&staging, &target));
        if let Err(err) = written {
            let _ = fs::remove_file(&staging);
            return Err(io_err(err));
        }

        debug!(
            "event=file_put module=attachment status=ok reference={} size={}",
            name,
            bytes.len()
        );
        Ok(name.to_string())
    }

    fn read(&self, reference: &str) -> FileStoreResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        fs::read(path).map_err(|source| FileStoreError::Io {
            reference: reference.to_string(),
            source,
        })
    }

    fn delete(&self, reference: &str) -> FileStoreResult<()> {
        let path = self.resolve(reference)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileStoreError::Io {
                reference: reference.to_string(),
                source,
            }),
        }
    }

    fn exists(&self, reference: &str) -> FileStoreResult<bool> {
        let path = self.resolve(reference)?;
        Ok(path.is_file())
    }
}

fn check_reference(reference: &str) -> FileStoreResult<()> {
    let invalid = reference.is_empty()
        || reference.starts_with('.')
        || reference.contains(['/', '\\', '\0'])
        || reference.contains("..");
    if invalid {
        return Err(FileStoreError::InvalidName(reference.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DiskFileStore, FileStore, FileStoreError};

    #[test]
    fn put_read_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path().join("uploads"));

        let reference = store.put("profile-1.png", b"png-bytes").unwrap();
        assert!(store.exists(&reference).unwrap());
        assert_eq!(store.read(&reference).unwrap(), b"png-bytes");

        store.delete(&reference).unwrap();
        assert!(!store.exists(&reference).unwrap());
    }

    #[test]
    fn delete_of_missing_file_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        store.delete("profile-404.png").unwrap();
        store.delete("profile-404.png").unwrap();
    }

    #[test]
    fn rejects_names_that_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        for name in ["../evil.png", "a/b.png", "", ".hidden"] {
            let err = store.put(name, b"x").unwrap_err();
            assert!(matches!(err, FileStoreError::InvalidName(_)), "{name}");
        }
    }

    #[test]
    fn put_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        store.put("profile-1.png", b"first").unwrap();
        let err = store.put("profile-1.png", b"second").unwrap_err();
        assert!(matches!(err, FileStoreError::AlreadyExists(_)));
        assert_eq!(store.read("profile-1.png").unwrap(), b"first");
    }
}
