//! Remote release publishing.
//!
//! [`ReleasePublisher`] is the seam between the pipeline and the release
//! host. [`GitHubPublisher`] talks to the GitHub REST API with a blocking
//! `ureq` agent; [`OfflinePublisher`] stands in for local-only runs and
//! never opens a connection.

use crate::config::PublishSettings;
use crate::credential::Credential;
use crate::error::{ReleaseError, Result};
use crate::model::RepositoryRef;
use serde::{Deserialize, Serialize};

/// `User-Agent` sent with every API call.
const USER_AGENT: &str = "components-release";

/// Media type requested from the API.
const ACCEPT: &str = "application/vnd.github+json";

/// Content type of uploaded archives.
const ASSET_CONTENT_TYPE: &str = "application/zip";

/// Longest response body quoted in an error message.
const MAX_QUOTED_BODY: usize = 512;

/// A release to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDraft {
    /// Tag the release is attached to.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Display name of the release.
    pub name: String,
    /// Commit the tag is created at if it does not exist yet.
    pub target_commitish: String,
}

/// A release as reported by the host after creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedRelease {
    /// Host-assigned release identifier.
    pub id: u64,
    /// Tag of the release.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Browser URL of the release page.
    pub html_url: String,
    /// Asset upload URL template (`.../assets{?name,label}`).
    pub upload_url: String,
}

/// Creates releases and attaches assets to them.
#[cfg_attr(test, mockall::automock)]
pub trait ReleasePublisher {
    /// Create a release on `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AuthenticationFailure`] if the credential is
    /// refused, [`ReleaseError::ReleaseAlreadyExists`] if the tag already
    /// has a release, or [`ReleaseError::Http`] for any other failure.
    fn create_release(
        &self,
        repository: &RepositoryRef,
        draft: &ReleaseDraft,
    ) -> Result<PublishedRelease>;

    /// Upload `bytes` as asset `asset_name` of `release`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AssetUploadFailure`] if the upload fails for
    /// any reason.
    fn upload_asset(&self, release: &PublishedRelease, asset_name: &str, bytes: &[u8])
    -> Result<()>;
}

/// Status and body of an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl HttpReply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The API's `message` field, or the start of the raw body.
    fn summary(&self) -> String {
        #[derive(Deserialize)]
        struct ApiMessage {
            message: String,
        }

        let detail = serde_json::from_str::<ApiMessage>(&self.body)
            .map(|m| m.message)
            .unwrap_or_else(|_| self.body.chars().take(MAX_QUOTED_BODY).collect());
        format!("HTTP {}: {}", self.status, detail.trim())
    }
}

/// Interpret the response to a release creation request.
///
/// # Errors
///
/// Maps 401 and 403 to [`ReleaseError::AuthenticationFailure`], a 422 whose
/// body reports `already_exists` to [`ReleaseError::ReleaseAlreadyExists`],
/// and everything else unsuccessful to [`ReleaseError::Http`].
pub fn classify_create_response(
    draft: &ReleaseDraft,
    reply: &HttpReply,
) -> Result<PublishedRelease> {
    match reply.status {
        401 | 403 => Err(ReleaseError::AuthenticationFailure {
            reason: reply.summary(),
        }),
        422 if reply.body.contains("already_exists") => Err(ReleaseError::ReleaseAlreadyExists {
            tag: draft.tag.clone(),
        }),
        _ if reply.is_success() => {
            serde_json::from_str(&reply.body).map_err(|e| ReleaseError::Http {
                operation: "create release",
                reason: format!("unexpected response body: {e}"),
            })
        }
        _ => Err(ReleaseError::Http {
            operation: "create release",
            reason: reply.summary(),
        }),
    }
}

/// Interpret the response to an asset upload.
///
/// # Errors
///
/// Returns [`ReleaseError::AssetUploadFailure`] for any unsuccessful status.
pub fn classify_upload_response(
    release: &PublishedRelease,
    asset_name: &str,
    reply: &HttpReply,
) -> Result<()> {
    if reply.is_success() {
        Ok(())
    } else {
        Err(ReleaseError::AssetUploadFailure {
            tag: release.tag.clone(),
            asset: asset_name.to_owned(),
            reason: reply.summary(),
        })
    }
}

/// Strip the URI template suffix from an upload URL.
///
/// # Examples
///
/// ```
/// use components_release::publisher::upload_endpoint;
///
/// assert_eq!(
///     upload_endpoint("https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}"),
///     "https://uploads.github.com/repos/o/r/releases/1/assets"
/// );
/// ```
#[must_use]
pub fn upload_endpoint(upload_url: &str) -> &str {
    upload_url
        .split_once('{')
        .map_or(upload_url, |(endpoint, _)| endpoint)
}

/// Publishes releases through the GitHub REST API.
pub struct GitHubPublisher {
    agent: ureq::Agent,
    credential: Credential,
    api_host: String,
}

impl GitHubPublisher {
    /// Create a publisher using `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::AuthenticationFailure`] if the token is empty
    /// or contains whitespace. No request is made.
    pub fn new(credential: Credential, settings: &PublishSettings) -> Result<Self> {
        let token = credential.expose();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(ReleaseError::AuthenticationFailure {
                reason: "release credential is empty or malformed".to_owned(),
            });
        }
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(settings.http_timeout()))
            .http_status_as_error(false)
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            credential,
            api_host: settings.api_host.clone(),
        })
    }

    fn releases_url(&self, repository: &RepositoryRef) -> String {
        format!(
            "https://{}/repos/{}/{}/releases",
            self.api_host,
            repository.owner(),
            repository.name()
        )
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.credential.expose())
    }
}

impl ReleasePublisher for GitHubPublisher {
    fn create_release(
        &self,
        repository: &RepositoryRef,
        draft: &ReleaseDraft,
    ) -> Result<PublishedRelease> {
        let url = self.releases_url(repository);
        let payload = serde_json::to_vec(draft).map_err(|e| ReleaseError::Http {
            operation: "create release",
            reason: e.to_string(),
        })?;
        log::info!("creating release {} on {repository}", draft.tag);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .send(payload.as_slice())
            .map_err(|e| ReleaseError::Http {
                operation: "create release",
                reason: e.to_string(),
            })?;
        let reply = read_reply(response).map_err(|e| ReleaseError::Http {
            operation: "create release",
            reason: e.to_string(),
        })?;
        classify_create_response(draft, &reply)
    }

    fn upload_asset(
        &self,
        release: &PublishedRelease,
        asset_name: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let failure = |reason: String| ReleaseError::AssetUploadFailure {
            tag: release.tag.clone(),
            asset: asset_name.to_owned(),
            reason,
        };
        log::info!(
            "uploading {asset_name} ({} bytes) to release {}",
            bytes.len(),
            release.tag
        );

        let response = self
            .agent
            .post(upload_endpoint(&release.upload_url))
            .query("name", asset_name)
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", ASSET_CONTENT_TYPE)
            .send(bytes)
            .map_err(|e| failure(e.to_string()))?;
        let reply = read_reply(response).map_err(|e| failure(e.to_string()))?;
        classify_upload_response(release, asset_name, &reply)
    }
}

fn read_reply(
    response: ureq::http::Response<ureq::Body>,
) -> std::result::Result<HttpReply, ureq::Error> {
    let status = response.status().as_u16();
    let body = response.into_body().read_to_string()?;
    Ok(HttpReply { status, body })
}

/// Publisher for local-only runs.
///
/// Every call fails without touching the network; the pipeline never calls
/// it because local-only runs skip the release stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePublisher;

impl ReleasePublisher for OfflinePublisher {
    fn create_release(
        &self,
        _repository: &RepositoryRef,
        draft: &ReleaseDraft,
    ) -> Result<PublishedRelease> {
        Err(ReleaseError::configuration(format!(
            "cannot create release {} in local-only mode",
            draft.tag
        )))
    }

    fn upload_asset(
        &self,
        release: &PublishedRelease,
        asset_name: &str,
        _bytes: &[u8],
    ) -> Result<()> {
        Err(ReleaseError::configuration(format!(
            "cannot upload {asset_name} to release {} in local-only mode",
            release.tag
        )))
    }
}
