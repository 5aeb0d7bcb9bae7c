//! API models for request and response payloads

use common::{ShareBundle, ShareId};
use serde::{Deserialize, Serialize};

/// Response for a successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub share_id: ShareId,
    /// Expiry code actually applied, after falling back for unknown codes
    pub expiry: String,
}

/// Response for the data fetch endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ShareDataResponse {
    pub data: Vec<String>,
    pub filenames: Vec<String>,
    pub has_password: bool,
}

impl From<&ShareBundle> for ShareDataResponse {
    fn from(bundle: &ShareBundle) -> Self {
        Self {
            data: bundle.payloads.clone(),
            filenames: bundle.filenames.clone(),
            has_password: bundle.has_password,
        }
    }
}

/// Request to email a decryption key
#[derive(Debug, Deserialize)]
pub struct SendKeyRequest {
    pub email: String,
    pub key: String,
    /// Share the key belongs to, used to include a download link
    #[serde(default)]
    pub share_id: Option<String>,
}

/// Outcome of a key email request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Error,
}

/// Response for the key email endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct SendKeyResponse {
    pub status: SendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl SendKeyResponse {
    pub fn sent() -> Self {
        Self {
            status: SendStatus::Sent,
            msg: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: SendStatus::Error,
            msg: Some(msg.into()),
        }
    }
}
