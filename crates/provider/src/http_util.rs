//! Shared HTTP utilities for provider implementations.
//!
//! Every provider call goes through the same send → status-check → decode path.

use rquest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use vcsgate_types::{Result, VcsError};

/// Thin wrapper around the HTTP client that maps non-2xx responses to
/// [`VcsError::Upstream`].
#[derive(Clone)]
pub struct ProviderHttp {
    http: Client,
}

impl ProviderHttp {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// The inner client, for building requests.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.http
    }

    /// Sends a request and checks for success status.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::Upstream` on non-success HTTP status codes,
    /// or a transport error if the request fails to send.
    pub async fn send(&self, builder: RequestBuilder) -> Result<rquest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(VcsError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`], plus [`VcsError::Serialization`] for a body that
    /// does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let bytes = self.send(builder).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`Self::send_json`], also returning the `rel="next"` target of the
    /// `Link` header when the host paginates the response.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_json`].
    pub async fn send_json_paged<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<(T, Option<String>)> {
        let resp = self.send(builder).await?;
        let next = resp
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let bytes = resp.bytes().await?;
        Ok((serde_json::from_slice(&bytes)?, next))
    }

    /// Like [`Self::send_json`] but a 404 becomes `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_json`] for every other failure.
    pub async fn send_json_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>> {
        match self.send_json(builder).await {
            Ok(v) => Ok(Some(v)),
            Err(VcsError::Upstream { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Extract the `rel="next"` URL from an RFC 8288 `Link` header.
#[must_use]
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let (target, params) = link.split_once(';')?;
        let is_next = params.split(';').any(|p| {
            p.trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        is_next.then(|| target.to_string())
    })
}

impl std::fmt::Debug for ProviderHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHttp").finish_non_exhaustive()
    }
}
