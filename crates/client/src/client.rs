//! The gateway client: one method per remote capability.

use std::{fs, path::Path};

use {
    base64::{Engine as _, engine::general_purpose::STANDARD as BASE64},
    reqwest::{
        Method, StatusCode,
        blocking::{RequestBuilder, Response},
    },
    serde::{Deserialize, Serialize},
    tracing::debug,
    url::Url,
};

use crate::{
    auth::AuthProvider,
    error::{Error, Result},
    types::{ApiInfo, Group, OutboundMessage},
};

/// Version tag gating the multi-attachment send format.
const V2: &str = "v2";

/// Blocking client for a signal-cli-rest-api gateway.
///
/// Holds the connection configuration and issues one or more sequential
/// HTTP calls per operation. Immutable after construction; callers wanting
/// concurrency run their own instances from their own mechanism.
pub struct SignalRestClient {
    http: reqwest::blocking::Client,
    base_url: String,
    number: String,
    auth: Option<Box<dyn AuthProvider>>,
}

impl std::fmt::Debug for SignalRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRestClient")
            .field("base_url", &self.base_url)
            .field("number", &self.number)
            .field("auth", &self.auth.is_some())
            .finish()
    }
}

impl SignalRestClient {
    /// Client with no credentials and TLS verification on.
    pub fn new(base_url: impl Into<String>, number: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, number, None, true)
    }

    /// Client with optional credentials and a TLS verification toggle.
    pub fn with_options(
        base_url: impl Into<String>,
        number: impl Into<String>,
        auth: Option<Box<dyn AuthProvider>>,
        verify_tls: bool,
    ) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|err| Error::with_source(format!("Invalid base address: {base_url}"), err))?;

        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|err| Error::with_source("Couldn't build HTTP client", err))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            number: number.into(),
            auth,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(auth) = self.auth.as_deref() {
            request = auth.apply(request);
        }
        request
    }

    /// Query which API versions and build number the server supports.
    ///
    /// Servers too old to expose `/v1/about` answer 404; that maps to the
    /// oldest protocol (`["v1"]`, build 1) rather than an error.
    pub fn api_info(&self) -> Result<ApiInfo> {
        let resp = self
            .request(Method::GET, "/v1/about")
            .send()
            .map_err(|err| Error::with_source("Couldn't determine REST API version", err))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(ApiInfo {
                versions: vec!["v1".into()],
                build: 1,
            });
        }

        let about: AboutResponse = resp
            .json()
            .map_err(|err| Error::with_source("Couldn't determine REST API version", err))?;

        debug!(versions = ?about.versions, build = about.build, "detected gateway capabilities");

        Ok(ApiInfo {
            versions: about.versions,
            build: about.build.unwrap_or(1),
        })
    }

    /// Query the server mode. Returns "unknown" when the server does not
    /// report one.
    pub fn mode(&self) -> Result<String> {
        let resp = self
            .request(Method::GET, "/v1/about")
            .send()
            .map_err(|err| Error::with_source("Couldn't determine server mode", err))?;

        let about: ModeResponse = resp
            .json()
            .map_err(|err| Error::with_source("Couldn't determine server mode", err))?;

        Ok(about.mode.unwrap_or_else(|| "unknown".into()))
    }

    /// Create a group with the given members. Returns the new group's id.
    pub fn create_group(&self, name: &str, members: &[String]) -> Result<String> {
        let resp = self
            .request(Method::POST, &format!("/v1/groups/{}", self.number))
            .json(&CreateGroupRequest { name, members })
            .send()
            .map_err(|err| Error::with_source("Couldn't create Signal Messenger group", err))?;

        if resp.status() != StatusCode::OK && resp.status() != StatusCode::CREATED {
            return Err(status_error(
                resp,
                "Unknown error while creating Signal Messenger group",
            ));
        }

        let created: CreateGroupResponse = resp
            .json()
            .map_err(|err| Error::with_source("Couldn't create Signal Messenger group", err))?;
        Ok(created.id)
    }

    /// List all groups the configured number belongs to.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let resp = self
            .request(Method::GET, &format!("/v1/groups/{}", self.number))
            .send()
            .map_err(|err| Error::with_source("Couldn't list Signal Messenger groups", err))?;

        if resp.status() != StatusCode::OK {
            return Err(status_error(
                resp,
                "Unknown error while listing Signal Messenger groups",
            ));
        }

        resp.json()
            .map_err(|err| Error::with_source("Couldn't list Signal Messenger groups", err))
    }

    /// Fetch messages queued for the configured number.
    ///
    /// Envelope shape varies between server versions, so entries are
    /// forwarded as raw JSON values.
    pub fn receive(&self) -> Result<Vec<serde_json::Value>> {
        let resp = self
            .request(Method::GET, &format!("/v1/receive/{}", self.number))
            .send()
            .map_err(|err| Error::with_source("Couldn't receive Signal Messenger data", err))?;

        if resp.status() != StatusCode::OK {
            return Err(status_error(
                resp,
                "Unknown error while receiving Signal Messenger data",
            ));
        }

        resp.json()
            .map_err(|err| Error::with_source("Couldn't receive Signal Messenger data", err))
    }

    /// Set the profile name and, optionally, a picture read from disk.
    pub fn update_profile(&self, name: &str, avatar: Option<&Path>) -> Result<()> {
        let base64_avatar = avatar
            .map(|file| read_base64(file, "Couldn't update profile"))
            .transpose()?;

        let resp = self
            .request(Method::PUT, &format!("/v1/profiles/{}", self.number))
            .json(&UpdateProfileRequest {
                name,
                base64_avatar,
            })
            .send()
            .map_err(|err| Error::with_source("Couldn't update profile", err))?;

        if resp.status() != StatusCode::NO_CONTENT {
            return Err(status_error(resp, "Unknown error while updating profile"));
        }
        Ok(())
    }

    /// Send a message, negotiating the wire format with the server.
    ///
    /// Capabilities are probed fresh on every call (never cached, so a
    /// gateway upgraded mid-session is picked up on the next send). Servers
    /// advertising "v2" get the multi-attachment format; everything else
    /// falls back to the legacy single-attachment format. On the legacy
    /// path at most one file attachment is representable, and byte-sourced
    /// attachments are dropped entirely — a legacy limitation of old
    /// gateway builds, kept as-is rather than papered over.
    pub fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        let info = self.api_info()?;
        let v2 = info.supports(V2);

        if message.attachment_paths.len() > 1 && !v2 {
            return Err(Error::new(
                "This signal-cli-rest-api version is not capable of sending multiple \
                 attachments. Please upgrade your signal-cli-rest-api docker container!",
            ));
        }

        let path = if v2 { "/v2/send" } else { "/v1/send" };
        debug!(endpoint = path, recipients = message.recipients.len(), "sending message");

        let request = self.request(Method::POST, path);
        let resp = if v2 {
            // Byte-sourced payloads first, then file-sourced, in order.
            let mut attachments: Vec<String> = message
                .attachment_bytes
                .iter()
                .map(|bytes| BASE64.encode(bytes))
                .collect();
            for file in &message.attachment_paths {
                attachments.push(read_base64(file, "Couldn't send signal message")?);
            }
            request
                .json(&SendRequestV2 {
                    message: &message.text,
                    number: &self.number,
                    recipients: &message.recipients,
                    base64_attachments: attachments,
                })
                .send()
        } else {
            let base64_attachment = match message.attachment_paths.as_slice() {
                [file] => Some(read_base64(file, "Couldn't send signal message")?),
                _ => None,
            };
            request
                .json(&SendRequestV1 {
                    message: &message.text,
                    number: &self.number,
                    recipients: &message.recipients,
                    base64_attachment,
                })
                .send()
        }
        .map_err(|err| Error::with_source("Couldn't send signal message", err))?;

        if resp.status() != StatusCode::CREATED {
            return Err(status_error(resp, "Unknown error while sending signal message"));
        }
        Ok(())
    }

    /// List the ids of attachments the gateway has stored.
    pub fn list_attachments(&self) -> Result<Vec<String>> {
        let resp = self
            .request(Method::GET, "/v1/attachments")
            .send()
            .map_err(|err| Error::with_source("Couldn't list attachments", err))?;

        if resp.status() != StatusCode::OK {
            return Err(status_error(resp, "Unknown error while listing attachments"));
        }

        resp.json()
            .map_err(|err| Error::with_source("Couldn't list attachments", err))
    }

    /// Fetch an attachment's raw bytes by id.
    pub fn get_attachment(&self, attachment_id: &str) -> Result<Vec<u8>> {
        let resp = self
            .request(Method::GET, &format!("/v1/attachments/{attachment_id}"))
            .send()
            .map_err(|err| Error::with_source("Couldn't get attachment", err))?;

        if resp.status() != StatusCode::OK {
            return Err(status_error(resp, "Unknown error while getting attachment"));
        }

        let bytes = resp
            .bytes()
            .map_err(|err| Error::with_source("Couldn't get attachment", err))?;
        Ok(bytes.to_vec())
    }

    /// Remove an attachment from the gateway's store.
    pub fn delete_attachment(&self, attachment_id: &str) -> Result<()> {
        let resp = self
            .request(Method::DELETE, &format!("/v1/attachments/{attachment_id}"))
            .send()
            .map_err(|err| Error::with_source("Couldn't delete attachment", err))?;

        if resp.status() != StatusCode::NO_CONTENT {
            return Err(status_error(resp, "Unknown error while deleting attachment"));
        }
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Map an unexpected-status response to an error, preferring the server's
/// own `error` field over the generic fallback.
fn status_error(resp: Response, fallback: &str) -> Error {
    match resp.json::<ErrorBody>() {
        Ok(ErrorBody {
            error: Some(message),
        }) => Error::new(message),
        _ => Error::new(fallback),
    }
}

/// Read a local file and base64-encode its contents.
fn read_base64(path: &Path, context: &str) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|err| Error::with_source(format!("{context}: {}", path.display()), err))?;
    Ok(BASE64.encode(bytes))
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AboutResponse {
    versions: Vec<String>,
    #[serde(default)]
    build: Option<u64>,
}

#[derive(Deserialize)]
struct ModeResponse {
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Serialize)]
struct CreateGroupRequest<'a> {
    name: &'a str,
    members: &'a [String],
}

#[derive(Deserialize)]
struct CreateGroupResponse {
    id: String,
}

#[derive(Serialize)]
struct UpdateProfileRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_avatar: Option<String>,
}

#[derive(Serialize)]
struct SendRequestV2<'a> {
    message: &'a str,
    number: &'a str,
    recipients: &'a [String],
    base64_attachments: Vec<String>,
}

#[derive(Serialize)]
struct SendRequestV1<'a> {
    message: &'a str,
    number: &'a str,
    recipients: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    base64_attachment: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn test_about_response_parsing() {
        let json = r#"{"versions": ["v1", "v2"], "build": 2, "mode": "normal"}"#;
        let about: AboutResponse = serde_json::from_str(json).unwrap();
        assert_eq!(about.versions, vec!["v1", "v2"]);
        assert_eq!(about.build, Some(2));
    }

    #[test]
    fn test_about_response_minimal() {
        let about: AboutResponse = serde_json::from_str(r#"{"versions": ["v1"]}"#).unwrap();
        assert_eq!(about.versions, vec!["v1"]);
        assert!(about.build.is_none());
    }

    #[test]
    fn test_about_response_requires_versions() {
        assert!(serde_json::from_str::<AboutResponse>(r#"{"build": 2}"#).is_err());
    }

    #[test]
    fn test_send_v1_payload_omits_missing_attachment() {
        let payload = SendRequestV1 {
            message: "hi",
            number: "+43660111222",
            recipients: &["+43660333444".into()],
            base64_attachment: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "message": "hi",
                "number": "+43660111222",
                "recipients": ["+43660333444"],
            })
        );
    }

    #[test]
    fn test_send_v2_payload_keeps_empty_attachment_list() {
        let payload = SendRequestV2 {
            message: "hi",
            number: "+43660111222",
            recipients: &["+43660333444".into()],
            base64_attachments: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "message": "hi",
                "number": "+43660111222",
                "recipients": ["+43660333444"],
                "base64_attachments": [],
            })
        );
    }

    #[test]
    fn test_error_body_tolerates_unrelated_fields() {
        let body: ErrorBody = serde_json::from_str(r#"{"challenge": "abc"}"#).unwrap();
        assert!(body.error.is_none());
    }

    #[test]
    fn test_invalid_base_address_rejected() {
        let err = SignalRestClient::new("not a url", "+43660111222").unwrap_err();
        assert!(err.to_string().contains("Invalid base address"));
    }

    #[test]
    fn test_base_address_trailing_slash_trimmed() {
        let client = SignalRestClient::new("http://localhost:8080/", "+43660111222").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
