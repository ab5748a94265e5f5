//! Result types returned by the service adapters

use serde::{Deserialize, Serialize};

/// Bounding box of a detected object, as ratios of the image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub top: f32,
}

/// One located occurrence of a label in the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelInstance {
    pub confidence: Option<f32>,
    pub bounding_box: Option<BoundingBox>,
}

/// A detected label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Confidence in percent (0..=100)
    pub confidence: f32,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub instances: Vec<LabelInstance>,
}

/// Labels detected in one image, in the order the service returned them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelDetectionResult {
    pub labels: Vec<Label>,
    pub label_model_version: Option<String>,
}

/// Location of an uploaded object (not checked for reachability)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
}

/// Classification of a text block returned by document text detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Page,
    Line,
    Word,
    Other,
}

/// A block of detected text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: Option<String>,
}

impl TextBlock {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Line,
            text: Some(text.into()),
        }
    }

    pub fn word(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Word,
            text: Some(text.into()),
        }
    }
}

/// Text extracted from a document, one detected line per output line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
}

impl ExtractedText {
    /// Concatenate the text of every line block in order, each followed by `\n`
    pub fn from_blocks(blocks: &[TextBlock]) -> Self {
        let mut text = String::new();
        for block in blocks.iter().filter(|b| b.kind == BlockKind::Line) {
            text.push_str(block.text.as_deref().unwrap_or_default());
            text.push('\n');
        }
        Self { text }
    }

    /// Iterate over the extracted lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_text_keeps_only_lines_in_order() {
        let blocks = vec![
            TextBlock {
                kind: BlockKind::Page,
                text: None,
            },
            TextBlock::line("INVOICE 2024-001"),
            TextBlock::word("INVOICE"),
            TextBlock::word("2024-001"),
            TextBlock::line("Total: 42.00"),
            TextBlock::word("Total:"),
        ];

        let extracted = ExtractedText::from_blocks(&blocks);
        assert_eq!(extracted.text, "INVOICE 2024-001\nTotal: 42.00\n");
        assert_eq!(extracted.lines().count(), 2);
    }

    #[test]
    fn test_extracted_text_line_without_text() {
        let blocks = vec![
            TextBlock::line("first"),
            TextBlock {
                kind: BlockKind::Line,
                text: None,
            },
            TextBlock::line("third"),
        ];

        let extracted = ExtractedText::from_blocks(&blocks);
        assert_eq!(extracted.text, "first\n\nthird\n");
        assert_eq!(extracted.lines().collect::<Vec<_>>(), vec!["first", "", "third"]);
    }

    #[test]
    fn test_extracted_text_no_lines() {
        let extracted = ExtractedText::from_blocks(&[TextBlock::word("orphan")]);
        assert!(extracted.is_empty());
    }

    #[test]
    fn test_result_json_shapes() {
        let upload = UploadResult {
            url: "https://b.s3.us-east-1.amazonaws.com/k".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&upload).unwrap(),
            r#"{"url":"https://b.s3.us-east-1.amazonaws.com/k"}"#
        );

        let text = ExtractedText {
            text: "hello\n".to_string(),
        };
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"text":"hello\n"}"#);
    }

    #[test]
    fn test_label_partial_deserialization() {
        let json = r#"{"name": "Cat", "confidence": 97.5}"#;
        let label: Label = serde_json::from_str(json).unwrap();
        assert_eq!(label.name, "Cat");
        assert!(label.parents.is_empty());
        assert!(label.instances.is_empty());
    }
}
