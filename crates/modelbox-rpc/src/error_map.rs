//! Maps `ModelBoxError` onto `tonic::Status`, the RPC-status half of §7's
//! propagation rule: storage errors bubble up to standard RPC codes, while
//! `duplicate`/`duplicate-file` are never constructed here because callers
//! observe those through `exists`/`file_id` return values, not a thrown
//! error.

use modelbox_core::ModelBoxError;
use tonic::{Code, Status};

pub fn to_status(err: ModelBoxError) -> Status {
    let code = match &err {
        ModelBoxError::NotFound(_) => Code::NotFound,
        ModelBoxError::Duplicate(_) | ModelBoxError::DuplicateFile(_) => Code::AlreadyExists,
        ModelBoxError::Validation(_) => Code::InvalidArgument,
        ModelBoxError::StorageUnavailable(_) => Code::Unavailable,
        ModelBoxError::ChecksumMismatch { .. } => Code::DataLoss,
        ModelBoxError::StreamProtocol(_) => Code::InvalidArgument,
        ModelBoxError::TriggerEvaluation(_) => Code::Internal,
        ModelBoxError::StaleUpdate => Code::FailedPrecondition,
        ModelBoxError::Unimplemented(_) => Code::Unimplemented,
    };
    Status::new(code, err.to_string())
}
