use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use super::object_store::{ObjectStore, ObjectSummary, PutObjectRequest, StoreError};

/// Object storage over a directory tree: `<root>/<bucket>/<key>`. Metadata
/// such as content type and cache control is not persisted.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        if bucket.is_empty() || !is_plain_relative(Path::new(bucket)) || bucket.contains('/') {
            return Err(StoreError::Io(format!("invalid bucket name '{bucket}'")));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key.trim_start_matches('/'));
        if key.is_empty() || key.ends_with('/') || !is_plain_relative(relative) {
            return Err(StoreError::Io(format!("invalid object key '{key}'")));
        }
        Ok(self.bucket_path(bucket)?.join(relative))
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io(format!("failed to {action} {}: {error}", path.display()))
}

impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => io_error("read", &path, error),
        })
    }

    async fn put_object(&self, request: PutObjectRequest<'_>) -> Result<(), StoreError> {
        let path = self.object_path(request.bucket, request.key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| io_error("create", parent, error))?;
        }
        tokio::fs::write(&path, request.body)
            .await
            .map_err(|error| io_error("write", &path, error))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectSummary>, StoreError> {
        let bucket_root = self.bucket_path(bucket)?;
        let mut pending = vec![bucket_root.clone()];
        let mut objects = Vec::new();

        while let Some(directory) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&directory).await {
                Ok(entries) => entries,
                Err(error) if error.kind() == ErrorKind::NotFound => continue,
                Err(error) => return Err(io_error("list", &directory, error)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|error| io_error("list", &directory, error))?
            {
                let path = entry.path();
                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|error| io_error("inspect", &path, error))?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&bucket_root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.starts_with(prefix) {
                    continue;
                }

                objects.push(ObjectSummary {
                    key,
                    last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    size: metadata.len(),
                });
            }
        }

        objects.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(objects)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                _ => io_error("delete", &path, error),
            })
    }
}
