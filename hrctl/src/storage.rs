//! Local-disk storage for employee documents.
//!
//! Files live under `<root>/employee_<id>/<uuid>_<sanitized name>`. The database keeps the
//! path relative to the root, so the storage directory can move without a data migration.

use std::path::{Component, Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};
use tracing::instrument;
use uuid::Uuid;

use crate::{errors::Error, types::EmployeeId};

/// Where a stored file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root
    pub relative_path: String,
    pub size_bytes: u64,
}

#[async_trait::async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn store(&self, employee_id: EmployeeId, file_name: &str, contents: &[u8]) -> Result<StoredFile, Error>;

    async fn open(&self, relative_path: &str) -> Result<fs::File, Error>;

    async fn remove(&self, relative_path: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored relative path, refusing anything that escapes the root
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if relative_path.is_empty() || escapes {
            return Err(Error::Internal {
                operation: format!("resolve stored document path '{relative_path}'"),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl DocumentStorage for LocalDiskStorage {
    #[instrument(skip(self, contents), fields(size = contents.len()), err)]
    async fn store(&self, employee_id: EmployeeId, file_name: &str, contents: &[u8]) -> Result<StoredFile, Error> {
        let directory = format!("employee_{employee_id}");
        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let relative_path = format!("{directory}/{stored_name}");

        let absolute_dir = self.root.join(&directory);
        fs::create_dir_all(&absolute_dir).await.map_err(|e| Error::Internal {
            operation: format!("create document directory: {e}"),
        })?;

        let mut file = fs::File::create(absolute_dir.join(&stored_name))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("create document file: {e}"),
            })?;
        file.write_all(contents).await.map_err(|e| Error::Internal {
            operation: format!("write document file: {e}"),
        })?;
        file.flush().await.map_err(|e| Error::Internal {
            operation: format!("flush document file: {e}"),
        })?;

        Ok(StoredFile {
            relative_path,
            size_bytes: contents.len() as u64,
        })
    }

    async fn open(&self, relative_path: &str) -> Result<fs::File, Error> {
        let path = self.resolve(relative_path)?;
        fs::File::open(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                resource: "Document file".to_string(),
                id: relative_path.to_string(),
            },
            _ => Error::Internal {
                operation: format!("open document file: {e}"),
            },
        })
    }

    async fn remove(&self, relative_path: &str) -> Result<(), Error> {
        let path = self.resolve(relative_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Internal {
                operation: format!("remove document file: {e}"),
            }),
        }
    }
}

/// Reduce an uploaded file name to a safe single path segment
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().take(100).collect();

    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("contract.pdf"), "contract.pdf");
        assert_eq!(sanitize_file_name("my contract (v2).pdf"), "my_contract__v2_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\nurse\\license.png"), "license.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), 100);
    }

    #[tokio::test]
    async fn test_store_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());

        let stored = storage.store(7, "license scan.pdf", b"%PDF-1.4").await.unwrap();
        assert!(stored.relative_path.starts_with("employee_7/"));
        assert!(stored.relative_path.ends_with("_license_scan.pdf"));
        assert_eq!(stored.size_bytes, 8);

        let mut file = storage.open(&stored.relative_path).await.unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let a = storage.store(1, "cv.pdf", b"a").await.unwrap();
        let b = storage.store(1, "cv.pdf", b"b").await.unwrap();
        assert_ne!(a.relative_path, b.relative_path);
    }

    #[tokio::test]
    async fn test_open_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        assert!(storage.open("../secrets").await.is_err());
        assert!(storage.open("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let err = storage.open("employee_1/missing.pdf").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path());
        let stored = storage.store(3, "a.txt", b"x").await.unwrap();
        storage.remove(&stored.relative_path).await.unwrap();
        storage.remove(&stored.relative_path).await.unwrap();
    }
}
