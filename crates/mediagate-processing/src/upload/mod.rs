//! Upload ingest: request types, commit, thumbnails and the orchestrating pipeline.

pub mod commit;
pub mod derivatives;
pub mod paths;
pub mod pipeline;
pub mod stream;
pub mod types;

pub use commit::StorageCommitter;
pub use derivatives::{DerivativeError, DerivativeGenerator};
pub use paths::thumbnail_path;
pub use pipeline::{IngestError, UploadPipeline};
pub use stream::ExactLengthReader;
pub use types::{PayloadSource, UploadRequest};
