//! Service clients built from one resolved session

use aws_config::SdkConfig;

use crate::aws::labels::{LabelDetector, LabelPolicy, RekognitionLabels};
use crate::aws::session::{Session, SessionConfig};
use crate::aws::storage::{S3ObjectStore, UploadOptions, Uploader};
use crate::aws::text::{TextExtractor, TextractDocuments};
use crate::error::Result;

/// Rekognition, S3 and Textract handles sharing one [`Session`]
#[derive(Debug, Clone)]
pub struct AwsClients {
    session: Session,
    labels: RekognitionLabels,
    storage: S3ObjectStore,
    documents: TextractDocuments,
}

impl AwsClients {
    /// Build one handle per service; construction itself cannot fail
    pub fn new(session: Session) -> Self {
        Self {
            labels: RekognitionLabels::new(&session),
            storage: S3ObjectStore::new(&session),
            documents: TextractDocuments::new(&session),
            session,
        }
    }

    /// Resolve a session, then build the handles
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        Ok(Self::new(Session::resolve(config).await?))
    }

    /// Validate an already-loaded SDK config, then build the handles
    pub async fn from_sdk_config(sdk_config: SdkConfig) -> Result<Self> {
        Ok(Self::new(Session::from_sdk_config(sdk_config).await?))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rekognition(&self) -> &aws_sdk_rekognition::Client {
        self.labels.client()
    }

    pub fn s3(&self) -> &aws_sdk_s3::Client {
        self.storage.client()
    }

    pub fn textract(&self) -> &aws_sdk_textract::Client {
        self.documents.client()
    }

    pub fn label_detector(&self, policy: LabelPolicy) -> LabelDetector {
        LabelDetector::new(self.labels.clone(), policy)
    }

    pub fn uploader(&self, options: UploadOptions) -> Uploader {
        Uploader::new(self.storage.clone(), options)
    }

    pub fn text_extractor(&self) -> TextExtractor {
        TextExtractor::new(self.documents.clone())
    }

    /// A storage handle for another region; the clients here are unchanged
    pub fn storage_for_region(&self, region: &str) -> Result<S3ObjectStore> {
        Ok(S3ObjectStore::new(&self.session.with_region(region)?))
    }
}
