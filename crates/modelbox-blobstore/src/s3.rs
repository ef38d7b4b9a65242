//! S3-multipart `BlobStore`. Grounded in
//! `server/storage/artifacts/s3.go`'s `S3Writer`/`S3Reader`/
//! `S3StorageBuilder`: buffer chunks until the part-size threshold, upload
//! a part, and complete the multipart upload on close.

use aws_sdk_s3::types::CompletedMultipartUpload;
use aws_sdk_s3::types::CompletedPart;
use async_trait::async_trait;

use modelbox_core::constants::S3_MULTIPART_PART_SIZE;
use modelbox_core::{BlobReader, BlobStore, BlobWriter, ModelBoxError, ModelBoxResult};

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub async fn new(bucket: impl Into<String>, region: impl Into<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.into()));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        let client = aws_sdk_s3::Client::new(&shared_config);
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

pub struct S3Writer {
    client: aws_sdk_s3::Client,
    bucket: String,
    key: String,
    upload_id: String,
    buffer: Vec<u8>,
    completed_parts: Vec<CompletedPart>,
    part_number: i32,
}

impl S3Writer {
    /// Uploads the buffered bytes as the next part. `force` uploads an
    /// empty part when nothing has been buffered yet, since
    /// `CompleteMultipartUpload` requires at least one part even for a
    /// zero-byte object.
    async fn upload_part(&mut self, force: bool) -> ModelBoxResult<()> {
        if self.buffer.is_empty() && !(force && self.completed_parts.is_empty()) {
            return Ok(());
        }
        let body = std::mem::take(&mut self.buffer);
        let out = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .part_number(self.part_number)
            .body(body.into())
            .send()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("s3 upload_part: {e}")))?;
        let e_tag = out.e_tag().unwrap_or_default().to_string();
        self.completed_parts.push(
            CompletedPart::builder()
                .e_tag(e_tag)
                .part_number(self.part_number)
                .build(),
        );
        self.part_number += 1;
        Ok(())
    }
}

#[async_trait]
impl BlobWriter for S3Writer {
    async fn write_chunk(&mut self, chunk: &[u8]) -> ModelBoxResult<()> {
        self.buffer.extend_from_slice(chunk);
        if self.buffer.len() >= S3_MULTIPART_PART_SIZE {
            self.upload_part(false).await?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> ModelBoxResult<()> {
        let mut this = *self;
        this.upload_part(true).await?;
        this.client
            .complete_multipart_upload()
            .bucket(&this.bucket)
            .key(&this.key)
            .upload_id(&this.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(this.completed_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("s3 complete_multipart_upload: {e}")))?;
        Ok(())
    }
}

pub struct S3Reader {
    body: aws_sdk_s3::primitives::ByteStream,
}

#[async_trait]
impl BlobReader for S3Reader {
    async fn read_chunk(&mut self) -> ModelBoxResult<Option<Vec<u8>>> {
        self.body
            .try_next()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("s3 body read: {e}")))
            .map(|maybe_bytes| maybe_bytes.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn build_writer(&self, file_id: &str) -> ModelBoxResult<(Box<dyn BlobWriter>, String)> {
        let out = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(file_id)
            .send()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to create object in s3: {e}")))?;
        let upload_id = out
            .upload_id()
            .ok_or_else(|| ModelBoxError::StorageUnavailable("s3 did not return an upload id".to_string()))?
            .to_string();
        let writer = S3Writer {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: file_id.to_string(),
            upload_id,
            buffer: Vec::new(),
            completed_parts: Vec::new(),
            part_number: 1,
        };
        let path = format!("s3://{}/{}", self.bucket, file_id);
        Ok((Box::new(writer), path))
    }

    async fn build_reader(&self, path: &str) -> ModelBoxResult<Box<dyn BlobReader>> {
        let key = path
            .strip_prefix(&format!("s3://{}/", self.bucket))
            .unwrap_or(path);
        let out = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to retrieve object: {e}")))?;
        Ok(Box::new(S3Reader { body: out.body }))
    }
}
