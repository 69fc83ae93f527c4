//! Public data model for gateway requests and responses.

use std::path::PathBuf;

use serde::Deserialize;

/// Version and build information reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    /// Protocol version tags the server advertises (e.g. "v1", "v2").
    pub versions: Vec<String>,
    /// Server build number; 1 when the server does not report one.
    pub build: u64,
}

impl ApiInfo {
    /// Whether the server advertises the given version tag.
    #[must_use]
    pub fn supports(&self, tag: &str) -> bool {
        self.versions.iter().any(|v| v == tag)
    }
}

/// One entry from the group listing. Server fields beyond these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A message to send, with optional attachments from disk or memory.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    /// Message text.
    pub text: String,
    /// Recipient identifiers (phone numbers or group ids).
    pub recipients: Vec<String>,
    /// Attachments read from local files at send time.
    pub attachment_paths: Vec<PathBuf>,
    /// Attachments supplied as raw bytes. Only the v2 wire format carries
    /// these; legacy servers drop them.
    pub attachment_bytes: Vec<Vec<u8>>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(text: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            text: text.into(),
            recipients,
            ..Self::default()
        }
    }

    /// Attach files to be read from disk at send time.
    #[must_use]
    pub fn with_attachment_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.attachment_paths = paths;
        self
    }

    /// Attach raw byte payloads.
    #[must_use]
    pub fn with_attachment_bytes(mut self, payloads: Vec<Vec<u8>>) -> Self {
        self.attachment_bytes = payloads;
        self
    }
}
