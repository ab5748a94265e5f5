//! Document text extraction on top of Textract `DetectDocumentText`
//!
//! Only the synchronous API is used; multi-page documents that need the
//! asynchronous job API are not supported.

use async_trait::async_trait;
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{Block, BlockType, Document};
use aws_sdk_textract::Client;

use crate::aws::session::Session;
use crate::aws::types::{BlockKind, ExtractedText, TextBlock};
use crate::error::{Error, Result};
use crate::payload::decode_base64;

/// A remote service that detects text blocks in a document image
#[async_trait]
pub trait DocumentTextService: Send + Sync {
    async fn detect_document_text(&self, document: Vec<u8>) -> Result<Vec<TextBlock>>;
}

/// [`DocumentTextService`] backed by Amazon Textract
#[derive(Debug, Clone)]
pub struct TextractDocuments {
    client: Client,
}

impl TextractDocuments {
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
impl DocumentTextService for TextractDocuments {
    async fn detect_document_text(&self, document: Vec<u8>) -> Result<Vec<TextBlock>> {
        let response = self
            .client
            .detect_document_text()
            .document(Document::builder().bytes(Blob::new(document)).build())
            .send()
            .await
            .map_err(|e| Error::remote("failed to detect document text", e))?;

        Ok(response.blocks().iter().map(convert_block).collect())
    }
}

fn convert_block(block: &Block) -> TextBlock {
    let kind = match block.block_type() {
        Some(BlockType::Page) => BlockKind::Page,
        Some(BlockType::Line) => BlockKind::Line,
        Some(BlockType::Word) => BlockKind::Word,
        _ => BlockKind::Other,
    };

    TextBlock {
        kind,
        text: block.text().map(|t| t.to_string()),
    }
}

/// Extracts the lines of text of a document image
#[derive(Debug, Clone)]
pub struct TextExtractor<S = TextractDocuments> {
    service: S,
}

impl<S: DocumentTextService> TextExtractor<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Decode a base64 document image and extract its text
    pub async fn extract_text(&self, base64_image: &str) -> Result<ExtractedText> {
        let document = decode_base64(base64_image)?;
        self.extract(document).await
    }

    /// Extract text from raw document bytes
    pub async fn extract_text_from_bytes(&self, document: &[u8]) -> Result<ExtractedText> {
        self.extract(document.to_vec()).await
    }

    async fn extract(&self, document: Vec<u8>) -> Result<ExtractedText> {
        if document.is_empty() {
            return Err(Error::validation("document is empty"));
        }

        tracing::debug!("Detecting document text: {} bytes", document.len());

        let blocks = self.service.detect_document_text(document).await?;
        let extracted = ExtractedText::from_blocks(&blocks);

        tracing::debug!(
            "Extracted {} lines from {} blocks",
            extracted.lines().count(),
            blocks.len()
        );
        Ok(extracted)
    }
}
