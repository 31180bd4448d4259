use base64::Engine;
use serde::{Deserialize, Serialize};

/// Default mime type assumed for inline image data that does not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// The uploaded portrait, held as raw base64 with any data-URL prefix removed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub mime_type: String,
    pub data: String,
}

impl SourceImage {
    pub fn byte_len(&self) -> usize {
        // base64 expands by 4/3; close enough for logging
        self.data.len() / 4 * 3
    }
}

/// An image returned by the mutation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn new(mime_type: Option<String>, data: String) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        Self { mime_type, data }
    }

    /// Displayable `data:` URL reference.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    /// Download filename for the work item with the given id.
    pub fn file_name(&self, item_id: u32) -> String {
        format!("hairstyle-{}.{}", item_id, self.file_extension())
    }
}
