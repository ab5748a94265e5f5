//! AWS service wrappers
//!
//! - [`session::Session`] - Resolved region and credentials
//! - [`clients::AwsClients`] - One handle per service, built from a session
//! - [`labels::LabelDetector`] - Rekognition label detection
//! - [`storage::Uploader`] - S3 uploads with bucket region rebind
//! - [`text::TextExtractor`] - Textract document text extraction
//! - [`types`] - Result types returned by the adapters

pub mod clients;
pub mod labels;
pub mod session;
pub mod storage;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use clients::AwsClients;
pub use labels::{LabelDetector, LabelPolicy, LabelService, RekognitionLabels, DEFAULT_MAX_LABELS};
pub use session::{Session, SessionConfig};
pub use storage::{object_url, ObjectStore, PutObject, S3ObjectStore, UploadAcl, UploadOptions, Uploader};
pub use text::{DocumentTextService, TextExtractor, TextractDocuments};
pub use types::{
    BlockKind, BoundingBox, ExtractedText, Label, LabelDetectionResult, LabelInstance, TextBlock,
    UploadResult,
};
