//! Messages exchanged between a caller and an execution unit.
//!
//! Each request describes exactly one part. Each request gets exactly one
//! response, even when the request itself could not be parsed.

use {
    crate::credentials::{EncryptionKey, Iv},
    base64::{Engine, prelude::BASE64_STANDARD},
    bytes::Bytes,
    derive_more::{AsRef, From, Into},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{borrow::Cow, fmt},
    url::Url,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "camelCase")]
pub enum PartRequest {
    Download(DownloadRequest),
    Upload(UploadRequest),
}

impl PartRequest {
    #[must_use]
    #[inline]
    pub const fn part_index(&self) -> u64 {
        match self {
            Self::Download(request) => request.part_index,
            Self::Upload(request) => request.part_index,
        }
    }
}

/// Fetches and decrypts one part of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub part_index: u64,
    pub download_url: Url,
    pub key: EncryptionKey,
    /// Size of the whole file on storage, including block overhead.
    pub total_physical_size: u64,
}

/// Encrypts one part of plaintext and posts it to the storage node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub part_index: u64,
    /// Passed through to the storage node untouched.
    pub request_body: String,
    pub status_payload: StatusPayload,
    #[serde(with = "hex_bytes")]
    pub plaintext_bytes: Vec<u8>,
    pub key: EncryptionKey,
    #[serde(rename = "uploadURL")]
    pub upload_url: Url,
    pub content_type: String,
    pub initial_iv: Iv,
}

impl fmt::Debug for UploadRequest {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("part_index", &self.part_index)
            .field("plaintext_len", &self.plaintext_bytes.len())
            .field("upload_url", &self.upload_url.as_str())
            .field("content_type", &self.content_type)
            .field("initial_iv", &self.initial_iv)
            .finish_non_exhaustive()
    }
}

/// Request-signing material produced by the caller. Never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub signature: String,
    pub hash: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "status",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum PartResponse {
    /// Plaintext segments in block order. Concatenating them yields the part.
    Downloaded {
        part_index: u64,
        segments: Vec<Segment>,
    },
    /// Parsed JSON body returned by the storage node.
    Uploaded {
        part_index: u64,
        response: serde_json::Value,
    },
    Failed {
        part_index: Option<u64>,
        kind: FailureKind,
        message: String,
    },
}

impl PartResponse {
    #[inline]
    pub fn failed(part_index: Option<u64>, kind: FailureKind, message: impl fmt::Display) -> Self {
        Self::Failed {
            part_index,
            kind,
            message: message.to_string(),
        }
    }

    #[must_use]
    #[inline]
    pub const fn part_index(&self) -> Option<u64> {
        match self {
            Self::Downloaded { part_index, .. } | Self::Uploaded { part_index, .. } => {
                Some(*part_index)
            }
            Self::Failed { part_index, .. } => *part_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Authentication,
    RangeFetch,
    Transport,
    MalformedPhysicalData,
    MalformedMessage,
    PartOutOfRange,
    PartTooLarge,
    PoolSaturated,
    UnitStopped,
    Encryption,
}

/// One decrypted block. Base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, From, Into, AsRef)]
pub struct Segment(pub Bytes);

impl Serialize for Segment {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BASE64_STANDARD.encode(&self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Segment {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Cow::<'_, str>::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(text.as_bytes())
            .map(|bytes| Self(bytes.into()))
            .map_err(de::Error::custom)
    }
}

mod hex_bytes {
    use {
        serde::{Deserialize, Deserializer, Serializer, de},
        std::borrow::Cow,
    };

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        hex::decode(Cow::<'_, str>::deserialize(deserializer)?.as_bytes())
            .map_err(de::Error::custom)
    }
}
