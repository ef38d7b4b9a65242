//! Public (`ModelStore`) and admin (`ModelBoxAdmin`) RPC frontends, plus
//! the Prometheus scrape listener.
//!
//! `spec.md`'s Non-goals place gRPC surface *generation* (the `.proto`
//! files and their `tonic-build` codegen step) out of scope. What's in
//! scope, and implemented here, is the seam itself: `dto` mirrors every
//! wire shape in §6 one-for-one, `traits` declares the two service
//! interfaces, `service`/`admin_service` implement them against the core
//! capability traits, and `error_map` provides the `ModelBoxError` ->
//! `tonic::Status` mapping §7 requires. A real deployment's generated
//! `tonic` service impl is a thin shim over these same methods.

pub mod admin_service;
pub mod dto;
pub mod error_map;
pub mod prometheus_server;
pub mod service;
pub mod traits;

pub use admin_service::AdminService;
pub use service::ModelStore;
pub use traits::{CreateResultDto, DownloadHandle, ModelBoxAdminService, ModelStoreService, UploadHandle};
