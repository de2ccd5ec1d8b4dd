//! Request payloads.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Body payload carried by a request.
///
/// `Multipart` is the structured multi-part payload: the transport writes its
/// own `content-type` with the boundary, so any explicit one is dropped
/// during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
    /// Plain text sent as-is.
    Text(String),
    /// Raw bytes.
    #[serde(skip)]
    Bytes(Bytes),
    /// JSON document, serialized at send time.
    Json(serde_json::Value),
    /// Multi-part form.
    Multipart(FormData),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Serialized payload, or `None` for multipart bodies whose encoding is
    /// owned by the transport.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            RequestBody::Text(text) => Some(Bytes::from(text.clone())),
            RequestBody::Bytes(bytes) => Some(bytes.clone()),
            RequestBody::Json(value) => Some(Bytes::from(value.to_string())),
            RequestBody::Multipart(_) => None,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<FormData> for RequestBody {
    fn from(form: FormData) -> Self {
        RequestBody::Multipart(form)
    }
}

/// A multi-part form built from text fields and file parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    pub parts: Vec<FormPart>,
}

/// One part of a [`FormData`] payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        #[serde(default)]
        mime: Option<String>,
        #[serde(with = "serde_bytes_vec")]
        contents: Vec<u8>,
    },
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: None,
            contents: contents.into(),
        });
        self
    }

    /// Sum of the raw part payloads, used for upload progress totals.
    pub fn payload_len(&self) -> u64 {
        self.parts
            .iter()
            .map(|part| match part {
                FormPart::Text { value, .. } => value.len() as u64,
                FormPart::File { contents, .. } => contents.len() as u64,
            })
            .sum()
    }
}

// File contents appear in config files as UTF-8 text.
mod serde_bytes_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}
