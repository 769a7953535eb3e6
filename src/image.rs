//! Local image resolution.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::models::ImageRef;
use crate::traits::ImageResolver;

/// Reads image references as filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct FileImageResolver;

#[async_trait]
impl ImageResolver for FileImageResolver {
    async fn read_all(&self, image: &ImageRef) -> Result<Vec<u8>> {
        tokio::fs::read(image.path())
            .await
            .with_context(|| format!("Cannot read image {}", image))
    }
}

/// Detect MIME content type from an object key's extension.
pub fn detect_content_type(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
