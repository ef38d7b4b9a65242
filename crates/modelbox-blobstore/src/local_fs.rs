//! Local-filesystem `BlobStore`: one file per `file_id` under a base
//! directory. Grounded in `server/storage/artifacts/file.go`'s
//! `FileWriter`/`FileReader`/`FileBlobStorageBuilder`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use modelbox_core::{BlobReader, BlobStore, BlobWriter, ModelBoxError, ModelBoxResult};

const READ_BUF_SIZE: usize = 8192;

pub struct LocalFsBlobStore {
    base_dir: PathBuf,
}

impl LocalFsBlobStore {
    pub async fn new(base_dir: impl Into<PathBuf>) -> ModelBoxResult<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await.map_err(|e| {
            ModelBoxError::StorageUnavailable(format!(
                "couldn't create blob storage directory {}: {e}",
                base_dir.display()
            ))
        })?;
        Ok(Self { base_dir })
    }
}

pub struct LocalFsWriter {
    file: tokio::fs::File,
}

#[async_trait]
impl BlobWriter for LocalFsWriter {
    async fn write_chunk(&mut self, chunk: &[u8]) -> ModelBoxResult<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("local fs write: {e}")))
    }

    async fn close(self: Box<Self>) -> ModelBoxResult<()> {
        let mut this = *self;
        this.file
            .flush()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("local fs flush: {e}")))
    }
}

pub struct LocalFsReader {
    file: tokio::fs::File,
}

#[async_trait]
impl BlobReader for LocalFsReader {
    async fn read_chunk(&mut self) -> ModelBoxResult<Option<Vec<u8>>> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let n = self
            .file
            .read(&mut buf)
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("local fs read: {e}")))?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

#[async_trait]
impl BlobStore for LocalFsBlobStore {
    async fn build_writer(&self, file_id: &str) -> ModelBoxResult<(Box<dyn BlobWriter>, String)> {
        let path = self.base_dir.join(file_id);
        let file = tokio::fs::File::create(&path).await.map_err(|e| {
            ModelBoxError::StorageUnavailable(format!("couldn't open {} to write: {e}", path.display()))
        })?;
        Ok((Box::new(LocalFsWriter { file }), path.to_string_lossy().into_owned()))
    }

    async fn build_reader(&self, path: &str) -> ModelBoxResult<Box<dyn BlobReader>> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            ModelBoxError::StorageUnavailable(format!("couldn't open {path} to read: {e}"))
        })?;
        Ok(Box::new(LocalFsReader { file }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bytes_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsBlobStore::new(dir.path()).await.unwrap();

        let (mut writer, path) = store.build_writer("abc123").await.unwrap();
        writer.write_chunk(b"hello ").await.unwrap();
        writer.write_chunk(b"world").await.unwrap();
        writer.close().await.unwrap();

        let mut reader = store.build_reader(&path).await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = reader.read_chunk().await.unwrap() {
            collected.extend(chunk);
        }
        assert_eq!(collected, b"hello world");
    }

    #[tokio::test]
    async fn empty_file_round_trips_to_zero_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsBlobStore::new(dir.path()).await.unwrap();

        let (writer, path) = store.build_writer("empty").await.unwrap();
        writer.close().await.unwrap();

        let mut reader = store.build_reader(&path).await.unwrap();
        assert_eq!(reader.read_chunk().await.unwrap(), None);
    }
}
