//! The `BlobStore` capability: opaque byte streams keyed by `file_id`.
//! Backends (local filesystem, S3 multipart) live in `modelbox-blobstore`.

use async_trait::async_trait;

use crate::error::ModelBoxResult;

#[async_trait]
pub trait BlobWriter: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> ModelBoxResult<()>;

    /// Flushes any buffered bytes and commits the object. Consumes the
    /// writer so it cannot be written to after close.
    async fn close(self: Box<Self>) -> ModelBoxResult<()>;
}

#[async_trait]
pub trait BlobReader: Send {
    /// Returns the next chunk, or `None` at EOF.
    async fn read_chunk(&mut self) -> ModelBoxResult<Option<Vec<u8>>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Opens a writer for `file_id` and returns it along with the
    /// backend-chosen path to record on the File row (a filesystem path or
    /// an `s3://bucket/key` URI — opaque to every other component).
    async fn build_writer(&self, file_id: &str) -> ModelBoxResult<(Box<dyn BlobWriter>, String)>;

    /// Opens a reader against a previously recorded `path`.
    async fn build_reader(&self, path: &str) -> ModelBoxResult<Box<dyn BlobReader>>;
}
