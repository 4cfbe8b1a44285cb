use super::response::{ContentBlock, ImageSource};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::Stream;
use std::pin::Pin;

/// Text chunks of a description, in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send + 'static>>;

pub const DEFAULT_VISION_PROMPT: &str = "What do you see in this image? Give a concise description and focus and what happened to vehicles.";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Only `image/*` uploads are described.
    pub fn is_image_type(content_type: Option<&str>) -> bool {
        content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
    }

    pub fn to_content_block(&self) -> ContentBlock {
        ContentBlock::Image {
            source: ImageSource::Base64 {
                media_type: self.media_type.clone(),
                data: STANDARD.encode(&self.bytes),
            },
        }
    }
}

/// A vision-language model that streams a description of one image.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe_image(
        &self,
        image: &ImageUpload,
        prompt: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<TextStream>;
}
