use crate::types::PreviewRef;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Body of a `generateContent` call: `{ "contents": [ { "parts": [...] } ] }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Bare base64, no `data:` prefix.
    pub data: String,
}

/// Image picked in the composer. Travels with exactly one submission.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAttachment {
    mime_type: String,
    data_url: String,
    preview: PreviewRef,
}

impl ImageAttachment {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(bytes));
        Self {
            mime_type,
            data_url,
            preview: PreviewRef::new(),
        }
    }

    /// Accepts `data:<mime>;base64,<payload>`. Returns `None` for anything else.
    pub fn from_data_url(data_url: &str) -> Option<Self> {
        let header = data_url.strip_prefix("data:")?;
        let (meta, _) = header.split_once(',')?;
        let mime_type = meta.strip_suffix(";base64")?.split(';').next()?;
        if mime_type.is_empty() {
            return None;
        }
        Some(Self {
            mime_type: mime_type.to_string(),
            data_url: data_url.to_string(),
            preview: PreviewRef::new(),
        })
    }

    /// Read an image file, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(mime_for_path(path), &bytes))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn preview(&self) -> &PreviewRef {
        &self.preview
    }

    pub fn inline_data(&self) -> InlineData {
        InlineData {
            mime_type: self.mime_type.clone(),
            data: strip_data_url_prefix(&self.data_url).to_string(),
        }
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Everything after the first comma, or the whole input when there is none.
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((_, payload)) => payload,
        None => encoded,
    }
}

/// Parts are ordered text first, then the image. `text` must already be trimmed.
pub fn build_request(text: &str, image: Option<&ImageAttachment>) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(2);
    if !text.is_empty() {
        parts.push(Part::Text {
            text: text.to_string(),
        });
    }
    if let Some(image) = image {
        parts.push(Part::InlineData {
            inline_data: image.inline_data(),
        });
    }
    GenerateContentRequest {
        contents: vec![Content { parts }],
    }
}
