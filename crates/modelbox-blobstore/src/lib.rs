//! `BlobStore` backends and the artifact upload/download pipeline.
//!
//! - `local_fs`: files under a base directory, one file per `file_id`.
//! - `s3`: multipart upload against an S3-compatible bucket.
//! - `pipeline`: the glue that ties a stream of chunks to a `MetadataStore`
//!   row and a `BlobStore` writer/reader, including the duplicate-file
//!   short-circuit and the download chunk cap.

pub mod local_fs;
pub mod pipeline;
pub mod s3;

pub use local_fs::LocalFsBlobStore;
pub use pipeline::{ArtifactPipeline, DownloadSession, UploadRequest, UploadSession};
pub use s3::S3BlobStore;
