//! The streamed upload/download protocol tying a `BlobStore` writer/reader
//! to the `MetadataStore` File row. Grounded in `spec.md`'s ArtifactPipeline
//! section: the first upload frame is File metadata, subsequent frames are
//! byte chunks, and a duplicate-file insert is not an error — the
//! pre-existing row's path is authoritative but the remaining chunks are
//! still streamed to the backend for side effects.

use std::collections::VecDeque;
use std::sync::Arc;

use modelbox_core::constants::DOWNLOAD_CHUNK_SIZE;
use modelbox_core::{BlobReader, BlobStore, BlobWriter, MetadataStore, ModelBoxError, ModelBoxResult};
use modelbox_domain::{File, FileType};

pub struct UploadRequest {
    pub parent_id: String,
    pub file_type: FileType,
    pub checksum: String,
    pub now: u64,
}

pub struct ArtifactPipeline {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl ArtifactPipeline {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { metadata, blobs }
    }

    /// Opens the writer, derives the content-addressed `file_id`, and
    /// inserts the File row before a single byte is streamed. A row that
    /// already exists is not an error: `UploadSession::finish` still
    /// returns its `file_id`, the existing path stays authoritative, and
    /// callers are expected to keep streaming the remaining chunks anyway
    /// (the writer just discards them against a fresh object).
    pub async fn begin_upload(&self, req: UploadRequest) -> ModelBoxResult<UploadSession> {
        let mut file = File::new(req.parent_id, req.file_type, req.checksum, "", req.now);
        let (writer, path) = self.blobs.build_writer(&file.id).await?;
        file.path = path;

        let results = self.metadata.write_files(vec![file.clone()]).await?;
        let result = results
            .into_iter()
            .next()
            .ok_or_else(|| ModelBoxError::StorageUnavailable("write_files returned no rows".to_string()))?;

        Ok(UploadSession {
            writer: Some(writer),
            file_id: result.id,
        })
    }

    /// Looks up the File row and opens a reader against its recorded path.
    pub async fn begin_download(&self, file_id: &str) -> ModelBoxResult<DownloadSession> {
        let file = self.metadata.get_file(file_id).await?;
        let reader = self.blobs.build_reader(&file.path).await?;
        Ok(DownloadSession {
            reader,
            file,
            buffer: VecDeque::new(),
            eof: false,
        })
    }
}

pub struct UploadSession {
    writer: Option<Box<dyn BlobWriter>>,
    file_id: String,
}

impl UploadSession {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> ModelBoxResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ModelBoxError::StreamProtocol("write after finish".to_string()))?;
        writer.write_chunk(chunk).await
    }

    /// Closes the writer and returns the `file_id` the row was created (or
    /// already existed) under.
    pub async fn finish(mut self) -> ModelBoxResult<String> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ModelBoxError::StreamProtocol("finish called twice".to_string()))?;
        writer.close().await?;
        Ok(self.file_id)
    }
}

pub struct DownloadSession {
    reader: Box<dyn BlobReader>,
    pub file: File,
    buffer: VecDeque<u8>,
    eof: bool,
}

impl DownloadSession {
    /// Returns the next chunk, re-sliced to at most `DOWNLOAD_CHUNK_SIZE`
    /// bytes regardless of how the backend chose to hand bytes back, or
    /// `None` once both the backend and the internal buffer are drained.
    pub async fn next_chunk(&mut self) -> ModelBoxResult<Option<Vec<u8>>> {
        while self.buffer.len() < DOWNLOAD_CHUNK_SIZE && !self.eof {
            match self.reader.read_chunk().await? {
                Some(bytes) => self.buffer.extend(bytes),
                None => {
                    self.eof = true;
                    break;
                }
            }
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let take = DOWNLOAD_CHUNK_SIZE.min(self.buffer.len());
        Ok(Some(self.buffer.drain(..take).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_fs::LocalFsBlobStore;
    use modelbox_persistence::EmbeddedKvMetadataStore;

    fn embedded_store() -> Arc<dyn MetadataStore> {
        let dir = tempfile::tempdir().unwrap().into_path();
        Arc::new(EmbeddedKvMetadataStore::open(dir.join("modelbox.sled")).expect("open embedded store"))
    }

    #[tokio::test]
    async fn duplicate_upload_returns_the_same_file_id_and_still_drains_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalFsBlobStore::new(dir.path()).await.unwrap());
        let metadata: Arc<dyn MetadataStore> = embedded_store();
        let pipeline = ArtifactPipeline::new(metadata, blobs);

        let req = || UploadRequest {
            parent_id: "exp-1".to_string(),
            file_type: FileType::Checkpoint,
            checksum: "deadbeef".to_string(),
            now: 100,
        };

        let mut first = pipeline.begin_upload(req()).await.unwrap();
        first.write_chunk(b"hello").await.unwrap();
        let first_id = first.finish().await.unwrap();

        let mut second = pipeline.begin_upload(req()).await.unwrap();
        second.write_chunk(b"world").await.unwrap();
        let second_id = second.finish().await.unwrap();

        assert_eq!(first_id, second_id);
    }

    #[tokio::test]
    async fn download_is_chunked_to_the_cap_and_prefixed_by_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalFsBlobStore::new(dir.path()).await.unwrap());
        let metadata: Arc<dyn MetadataStore> = embedded_store();
        let pipeline = ArtifactPipeline::new(metadata, blobs);

        let payload = vec![7u8; 3072];
        let mut upload = pipeline
            .begin_upload(UploadRequest {
                parent_id: "exp-2".to_string(),
                file_type: FileType::Model,
                checksum: modelbox_domain::ids::md5_hex(&payload),
                now: 100,
            })
            .await
            .unwrap();
        upload.write_chunk(&payload).await.unwrap();
        let file_id = upload.finish().await.unwrap();

        let mut download = pipeline.begin_download(&file_id).await.unwrap();
        assert_eq!(download.file.id, file_id);

        let mut received = Vec::new();
        let mut chunk_count = 0;
        while let Some(chunk) = download.next_chunk().await.unwrap() {
            assert!(chunk.len() <= DOWNLOAD_CHUNK_SIZE);
            received.extend(chunk);
            chunk_count += 1;
        }
        assert_eq!(received, payload);
        assert_eq!(chunk_count, 3);
    }
}
