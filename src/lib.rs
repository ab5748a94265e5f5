//! AWS imaging helpers
//!
//! Resolves an AWS session once and exposes three adapters on top of it:
//! label detection (Rekognition), image upload (S3) and document text
//! extraction (Textract).

pub mod aws;
pub mod error;
pub mod payload;
pub mod settings;

pub use error::{Error, Result};
