//! GitHub REST implementation of [`ArtifactStore`] over blocking `ureq`.
//!
//! | Call            | Endpoint                                                 |
//! |-----------------|----------------------------------------------------------|
//! | get_content     | `GET   /repos/{o}/{r}/contents/{path}?ref={branch}`      |
//! | put_content     | `PUT   /repos/{o}/{r}/contents/{path}`                   |
//! | get_public_key  | `GET   /repos/{o}/{r}/actions/secrets/public-key`        |
//! | put_secret      | `PUT   /repos/{o}/{r}/actions/secrets/{name}`            |
//! | get_variable    | `GET   /repos/{o}/{r}/actions/variables/{name}`          |
//! | create_variable | `POST  /repos/{o}/{r}/actions/variables`                 |
//! | update_variable | `PATCH /repos/{o}/{r}/actions/variables/{name}`          |

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use fanout_core::{RepoId, Settings};

use crate::crypto::decode_public_key;
use crate::error::StoreError;
use crate::types::{
    ArtifactStore, PutContent, RemoteArtifactState, RemoteVariable, RepoPublicKey, SealedSecret,
    VersionToken, WriteKind,
};

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    key_id: String,
    key: String,
}

#[derive(Debug, Serialize)]
struct PutSecretBody<'a> {
    encrypted_value: &'a str,
    key_id: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct VariableBody {
    name: String,
    value: String,
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

/// Blocking GitHub client. One request per trait call, no retries.
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("fanout/", env!("CARGO_PKG_VERSION")))
            .build();
        GitHubClient {
            agent,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_url, &settings.token, settings.timeout)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn repo_url(&self, repo: &RepoId, tail: &str) -> String {
        repo_url(&self.api_url, repo, tail)
    }
}

impl ArtifactStore for GitHubClient {
    fn get_content(
        &self,
        repo: &RepoId,
        path: &str,
        branch: &str,
    ) -> Result<RemoteArtifactState, StoreError> {
        let url = self.repo_url(repo, &format!("contents/{}", encode_path(path)));
        tracing::debug!(%repo, path, branch, "GET content");
        let response = match self.request("GET", &url).query("ref", branch).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(RemoteArtifactState::Absent),
            Err(err) => return Err(map_error(err, path)),
        };
        let body: ContentResponse = response.into_json().map_err(|e| StoreError::Parse {
            what: "content",
            message: e.to_string(),
        })?;
        let content = decode_content(&body)?;
        Ok(RemoteArtifactState::Present {
            content,
            version: VersionToken(body.sha),
        })
    }

    fn put_content(
        &self,
        repo: &RepoId,
        path: &str,
        put: &PutContent<'_>,
    ) -> Result<(), StoreError> {
        let url = self.repo_url(repo, &format!("contents/{}", encode_path(path)));
        let body = PutContentBody {
            message: put.message,
            content: STANDARD.encode(put.content),
            branch: put.branch,
            sha: put.version.map(|v| v.0.as_str()),
        };
        tracing::debug!(%repo, path, update = put.version.is_some(), "PUT content");
        self.request("PUT", &url)
            .send_json(&body)
            .map_err(|e| map_error(e, path))?;
        Ok(())
    }

    fn get_public_key(&self, repo: &RepoId) -> Result<RepoPublicKey, StoreError> {
        let url = self.repo_url(repo, "actions/secrets/public-key");
        let body: PublicKeyResponse = self
            .request("GET", &url)
            .call()
            .map_err(|e| map_error(e, "secrets public key"))?
            .into_json()
            .map_err(|e| StoreError::Parse {
                what: "public key",
                message: e.to_string(),
            })?;
        let key = decode_public_key(&body.key).map_err(|e| StoreError::Parse {
            what: "public key",
            message: e.to_string(),
        })?;
        Ok(RepoPublicKey {
            key_id: body.key_id,
            key,
        })
    }

    fn put_secret(
        &self,
        repo: &RepoId,
        name: &str,
        secret: &SealedSecret,
    ) -> Result<WriteKind, StoreError> {
        let url = self.repo_url(repo, &format!("actions/secrets/{}", encode_path(name)));
        let response = self
            .request("PUT", &url)
            .send_json(PutSecretBody {
                encrypted_value: &secret.encrypted_value,
                key_id: &secret.key_id,
            })
            .map_err(|e| map_error(e, name))?;
        Ok(write_kind(response.status()))
    }

    fn get_variable(
        &self,
        repo: &RepoId,
        name: &str,
    ) -> Result<Option<RemoteVariable>, StoreError> {
        let url = self.repo_url(repo, &format!("actions/variables/{}", encode_path(name)));
        let response = match self.request("GET", &url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(err) => return Err(map_error(err, name)),
        };
        let body: VariableBody = response.into_json().map_err(|e| StoreError::Parse {
            what: "variable",
            message: e.to_string(),
        })?;
        Ok(Some(RemoteVariable {
            name: body.name,
            value: body.value,
        }))
    }

    fn create_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError> {
        let url = self.repo_url(repo, "actions/variables");
        self.request("POST", &url)
            .send_json(VariableBody {
                name: name.to_owned(),
                value: value.to_owned(),
            })
            .map_err(|e| map_error(e, name))?;
        Ok(())
    }

    fn update_variable(&self, repo: &RepoId, name: &str, value: &str) -> Result<(), StoreError> {
        let url = self.repo_url(repo, &format!("actions/variables/{}", encode_path(name)));
        self.request("PATCH", &url)
            .send_json(VariableBody {
                name: name.to_owned(),
                value: value.to_owned(),
            })
            .map_err(|e| map_error(e, name))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repo_url(api_url: &str, repo: &RepoId, tail: &str) -> String {
    format!(
        "{api_url}/repos/{}/{}/{tail}",
        encode_segment(&repo.owner),
        encode_segment(&repo.name)
    )
}

/// Percent-encode each `/`-separated segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// GitHub wraps base64 payloads at 60 columns; line breaks are transport noise.
fn decode_content(body: &ContentResponse) -> Result<Vec<u8>, StoreError> {
    if let Some(encoding) = body.encoding.as_deref() {
        if encoding != "base64" {
            return Err(StoreError::Parse {
                what: "content",
                message: format!("unsupported encoding '{encoding}'"),
            });
        }
    }
    let compact: String = body
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact).map_err(|e| StoreError::Parse {
        what: "content",
        message: e.to_string(),
    })
}

fn write_kind(status: u16) -> WriteKind {
    if status == 201 {
        WriteKind::Created
    } else {
        WriteKind::Updated
    }
}

fn map_error(err: ureq::Error, resource: &str) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify(status, resource, &body)
        }
        ureq::Error::Transport(transport) => StoreError::Transport(transport.to_string()),
    }
}

/// Map a non-2xx status to a [`StoreError`].
///
/// 409 is a version mismatch; 422 mentioning `sha` is a create over an
/// existing file or a stale token.
fn classify(status: u16, resource: &str, body: &str) -> StoreError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned());
    match status {
        404 => StoreError::NotFound {
            resource: resource.to_owned(),
        },
        409 => StoreError::Conflict { status, message },
        422 if message.contains("sha") => StoreError::Conflict { status, message },
        _ => StoreError::Http { status, message },
    }
}
