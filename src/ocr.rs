use async_trait::async_trait;

/// Attachment-to-text extraction, consumed as a black box. Image OCR and
/// PDF text extraction live behind this seam so deployments can plug in
/// whatever service they run; the bridge only cares about the text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn image_text(&self, url: &str) -> anyhow::Result<String>;
    async fn pdf_text(&self, url: &str) -> anyhow::Result<String>;
}

/// Default extractor used when no OCR backend is wired in: every
/// attachment contributes empty text.
pub struct NoopExtractor;

#[async_trait]
impl TextExtractor for NoopExtractor {
    async fn image_text(&self, _url: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }

    async fn pdf_text(&self, _url: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}
