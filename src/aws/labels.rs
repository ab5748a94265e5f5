//! Label detection on top of Rekognition `DetectLabels`

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{self as rekognition, Image};
use aws_sdk_rekognition::Client;

use crate::aws::session::Session;
use crate::aws::types::{BoundingBox, Label, LabelDetectionResult, LabelInstance};
use crate::error::{Error, Result};

/// Label cap used when none is configured
pub const DEFAULT_MAX_LABELS: i32 = 10;

/// Which labels a detection call may return
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPolicy {
    min_confidence: f32,
    max_labels: i32,
}

impl LabelPolicy {
    /// Create a policy with an explicit confidence threshold (percent).
    ///
    /// There is deliberately no default threshold.
    pub fn new(min_confidence: f32) -> Result<Self> {
        if !(0.0..=100.0).contains(&min_confidence) {
            return Err(Error::validation(format!(
                "minimum confidence must be within 0..=100, got {}",
                min_confidence
            )));
        }

        Ok(Self {
            min_confidence,
            max_labels: DEFAULT_MAX_LABELS,
        })
    }

    pub fn with_max_labels(mut self, max_labels: i32) -> Result<Self> {
        if max_labels < 1 {
            return Err(Error::validation(format!(
                "maximum label count must be at least 1, got {}",
                max_labels
            )));
        }
        self.max_labels = max_labels;
        Ok(self)
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn max_labels(&self) -> i32 {
        self.max_labels
    }

    /// Drop labels under the threshold and cap the rest, keeping service order
    pub fn apply(&self, mut result: LabelDetectionResult) -> LabelDetectionResult {
        result
            .labels
            .retain(|label| label.confidence >= self.min_confidence);
        result.labels.truncate(self.max_labels as usize);
        result
    }
}

/// A remote service able to detect labels in an image
#[async_trait]
pub trait LabelService: Send + Sync {
    async fn detect_labels(
        &self,
        image: Vec<u8>,
        policy: &LabelPolicy,
    ) -> Result<LabelDetectionResult>;
}

/// [`LabelService`] backed by Amazon Rekognition
#[derive(Debug, Clone)]
pub struct RekognitionLabels {
    client: Client,
}

impl RekognitionLabels {
    pub fn new(session: &Session) -> Self {
        Self {
            client: Client::new(session.sdk_config()),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl LabelService for RekognitionLabels {
    async fn detect_labels(
        &self,
        image: Vec<u8>,
        policy: &LabelPolicy,
    ) -> Result<LabelDetectionResult> {
        let response = self
            .client
            .detect_labels()
            .image(Image::builder().bytes(Blob::new(image)).build())
            .max_labels(policy.max_labels())
            .min_confidence(policy.min_confidence())
            .send()
            .await
            .map_err(|e| Error::remote("failed to detect labels", e))?;

        Ok(LabelDetectionResult {
            labels: response.labels().iter().map(convert_label).collect(),
            label_model_version: response.label_model_version().map(|v| v.to_string()),
        })
    }
}

fn convert_label(label: &rekognition::Label) -> Label {
    Label {
        name: label.name().unwrap_or_default().to_string(),
        confidence: label.confidence().unwrap_or(0.0),
        parents: label
            .parents()
            .iter()
            .filter_map(|p| p.name().map(|n| n.to_string()))
            .collect(),
        instances: label
            .instances()
            .iter()
            .map(|instance| LabelInstance {
                confidence: instance.confidence(),
                bounding_box: instance.bounding_box().map(|b| BoundingBox {
                    width: b.width().unwrap_or(0.0),
                    height: b.height().unwrap_or(0.0),
                    left: b.left().unwrap_or(0.0),
                    top: b.top().unwrap_or(0.0),
                }),
            })
            .collect(),
    }
}

/// Detects labels in raw image bytes under a fixed [`LabelPolicy`]
#[derive(Debug, Clone)]
pub struct LabelDetector<S = RekognitionLabels> {
    service: S,
    policy: LabelPolicy,
}

impl<S: LabelService> LabelDetector<S> {
    pub fn new(service: S, policy: LabelPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &LabelPolicy {
        &self.policy
    }

    /// Detect labels in an image
    pub async fn detect_labels(&self, image: &[u8]) -> Result<LabelDetectionResult> {
        if image.is_empty() {
            return Err(Error::validation("image is empty"));
        }

        tracing::debug!(
            "Detecting labels: {} bytes, min_confidence={}, max_labels={}",
            image.len(),
            self.policy.min_confidence,
            self.policy.max_labels
        );

        let result = self.service.detect_labels(image.to_vec(), &self.policy).await?;
        let result = self.policy.apply(result);

        tracing::debug!("Detected {} labels", result.labels.len());
        Ok(result)
    }

    /// Read an image from disk and detect labels in it
    pub async fn detect_labels_in_file(&self, path: impl AsRef<Path>) -> Result<LabelDetectionResult> {
        let path = path.as_ref();
        let image = tokio::fs::read(path)
            .await
            .map_err(|e| Error::validation(format!("failed to read image file {:?}: {}", path, e)))?;

        self.detect_labels(&image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned response and records what it was sent
    struct FakeLabels {
        response: LabelDetectionResult,
        calls: Mutex<Vec<(Vec<u8>, LabelPolicy)>>,
    }

    impl FakeLabels {
        fn new(labels: Vec<Label>) -> Self {
            Self {
                response: LabelDetectionResult {
                    labels,
                    label_model_version: Some("3.0".to_string()),
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LabelService for FakeLabels {
        async fn detect_labels(
            &self,
            image: Vec<u8>,
            policy: &LabelPolicy,
        ) -> Result<LabelDetectionResult> {
            self.calls.lock().unwrap().push((image, *policy));
            Ok(self.response.clone())
        }
    }

    struct Throttled;

    #[derive(Debug, thiserror::Error)]
    #[error("ThrottlingException: slow down")]
    struct ThrottlingError;

    #[async_trait]
    impl LabelService for Throttled {
        async fn detect_labels(&self, _: Vec<u8>, _: &LabelPolicy) -> Result<LabelDetectionResult> {
            Err(Error::remote("failed to detect labels", ThrottlingError))
        }
    }

    fn label(name: &str, confidence: f32) -> Label {
        Label {
            name: name.to_string(),
            confidence,
            parents: Vec::new(),
            instances: Vec::new(),
        }
    }

    #[test]
    fn test_policy_requires_valid_threshold() {
        assert!(LabelPolicy::new(75.0).is_ok());
        assert!(LabelPolicy::new(0.0).is_ok());
        assert!(LabelPolicy::new(100.0).is_ok());
        assert!(LabelPolicy::new(-1.0).unwrap_err().is_validation());
        assert!(LabelPolicy::new(100.5).unwrap_err().is_validation());
        assert!(LabelPolicy::new(f32::NAN).unwrap_err().is_validation());
    }

    #[test]
    fn test_policy_default_cap() {
        let policy = LabelPolicy::new(10.0).unwrap();
        assert_eq!(policy.max_labels(), DEFAULT_MAX_LABELS);
        assert_eq!(policy.with_max_labels(3).unwrap().max_labels(), 3);
        assert!(policy.with_max_labels(0).unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_detect_labels_enforces_threshold_and_cap() {
        let mut labels = Vec::new();
        for i in 0..15 {
            // Alternate well above and well below the threshold
            let confidence = if i % 2 == 0 { 90.0 - i as f32 } else { 40.0 };
            labels.push(label(&format!("label-{}", i), confidence));
        }
        let detector = LabelDetector::new(
            FakeLabels::new(labels),
            LabelPolicy::new(75.0).unwrap().with_max_labels(5).unwrap(),
        );

        let result = detector.detect_labels(b"\xFF\xD8\xFFimage").await.unwrap();

        assert_eq!(result.labels.len(), 5);
        assert!(result.labels.iter().all(|l| l.confidence >= 75.0));
        let names: Vec<&str> = result.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["label-0", "label-2", "label-4", "label-6", "label-8"]);
        assert_eq!(result.label_model_version.as_deref(), Some("3.0"));
    }

    #[tokio::test]
    async fn test_detect_labels_default_cap_is_ten() {
        let labels = (0..25).map(|i| label(&format!("l{}", i), 99.0)).collect();
        let detector = LabelDetector::new(FakeLabels::new(labels), LabelPolicy::new(10.0).unwrap());

        let result = detector.detect_labels(b"img").await.unwrap();
        assert_eq!(result.labels.len(), 10);
    }

    #[tokio::test]
    async fn test_detect_labels_threshold_is_inclusive() {
        let detector = LabelDetector::new(
            FakeLabels::new(vec![label("edge", 75.0), label("below", 74.99)]),
            LabelPolicy::new(75.0).unwrap(),
        );

        let result = detector.detect_labels(b"img").await.unwrap();
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.labels[0].name, "edge");
    }

    #[tokio::test]
    async fn test_detect_labels_forwards_bytes_and_policy() {
        let fake = FakeLabels::new(Vec::new());
        let policy = LabelPolicy::new(10.0).unwrap();
        let detector = LabelDetector::new(fake, policy);

        detector.detect_labels(b"raw-image").await.unwrap();

        let calls = detector.service.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, b"raw-image".to_vec());
        assert_eq!(calls[0].1, policy);
    }

    #[tokio::test]
    async fn test_detect_labels_rejects_empty_image() {
        let detector = LabelDetector::new(FakeLabels::new(Vec::new()), LabelPolicy::new(10.0).unwrap());
        let err = detector.detect_labels(b"").await.unwrap_err();
        assert!(err.is_validation());
        assert!(detector.service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detect_labels_passes_remote_errors_through() {
        let detector = LabelDetector::new(Throttled, LabelPolicy::new(10.0).unwrap());
        let err = detector.detect_labels(b"img").await.unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("ThrottlingException"));
    }

    #[tokio::test]
    async fn test_detect_labels_in_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("image.jpeg");
        std::fs::write(&path, b"\xFF\xD8\xFFjpeg-bytes").unwrap();

        let detector = LabelDetector::new(
            FakeLabels::new(vec![label("Dog", 88.0)]),
            LabelPolicy::new(10.0).unwrap(),
        );
        let result = detector.detect_labels_in_file(&path).await.unwrap();
        assert_eq!(result.labels[0].name, "Dog");

        let calls = detector.service.calls.lock().unwrap();
        assert_eq!(calls[0].0, b"\xFF\xD8\xFFjpeg-bytes".to_vec());
    }

    #[tokio::test]
    async fn test_detect_labels_in_missing_file() {
        let detector = LabelDetector::new(FakeLabels::new(Vec::new()), LabelPolicy::new(10.0).unwrap());
        let err = detector
            .detect_labels_in_file("/nonexistent/image.jpeg")
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("failed to read image file"));
    }

    #[test]
    fn test_convert_label_from_sdk() {
        let sdk_label = rekognition::Label::builder()
            .name("Car")
            .confidence(98.5)
            .parents(rekognition::Parent::builder().name("Vehicle").build())
            .instances(
                rekognition::Instance::builder()
                    .confidence(97.0)
                    .bounding_box(
                        rekognition::BoundingBox::builder()
                            .width(0.5)
                            .height(0.25)
                            .left(0.1)
                            .top(0.2)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let label = convert_label(&sdk_label);
        assert_eq!(label.name, "Car");
        assert_eq!(label.confidence, 98.5);
        assert_eq!(label.parents, vec!["Vehicle".to_string()]);
        assert_eq!(label.instances.len(), 1);
        assert_eq!(
            label.instances[0].bounding_box,
            Some(BoundingBox {
                width: 0.5,
                height: 0.25,
                left: 0.1,
                top: 0.2
            })
        );
    }
}
