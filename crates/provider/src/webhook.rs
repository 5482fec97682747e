//! Webhook signature verification and GitHub payload parsing.

use crate::traits::{WebhookHeaders, header};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use vcsgate_types::{
    PullRequestState, Result, VcsError, WebhookEvent, WebhookPullRequest, WebhookRepository,
};

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest in `X-Hub-Signature-256`.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// `sha256=<hex HMAC-SHA256(secret, payload)>`.
#[must_use]
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(payload);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a `sha256=`-prefixed signature in constant time.
///
/// Any malformed signature (missing prefix, bad hex, wrong length) is `false`.
#[must_use]
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Some(digest) = signature.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

// ── GitHub payloads ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhRepo {
    id: u64,
    name: String,
    full_name: String,
    owner: GhUser,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct GhRef {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

#[derive(Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    merged: bool,
    head: GhRef,
    base: GhRef,
    user: GhUser,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct GhPayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    sender: Option<GhUser>,
    #[serde(default)]
    repository: Option<GhRepo>,
    #[serde(default)]
    pull_request: Option<GhPull>,
}

pub(crate) fn pull_state(state: &str, merged: bool) -> PullRequestState {
    match (state, merged) {
        (_, true) => PullRequestState::Merged,
        ("open", false) => PullRequestState::Open,
        _ => PullRequestState::Closed,
    }
}

/// Parse a GitHub delivery using the `X-GitHub-Event` header for the type.
///
/// # Errors
///
/// Returns [`VcsError::Webhook`] when the header is missing and
/// [`VcsError::Serialization`] when the body is not a GitHub payload.
pub fn parse_github_event(headers: &WebhookHeaders, payload: &[u8]) -> Result<WebhookEvent> {
    let kind = header(headers, "x-github-event")
        .ok_or_else(|| VcsError::Webhook("missing X-GitHub-Event header".into()))?
        .to_string();
    let body: GhPayload = serde_json::from_slice(payload)?;

    Ok(WebhookEvent {
        kind,
        action: body.action,
        sender: body.sender.map(|u| u.login).unwrap_or_default(),
        repository: body.repository.map(|r| WebhookRepository {
            id: r.id.to_string(),
            name: r.name,
            full_name: r.full_name,
            owner: r.owner.login,
            private: r.private,
            default_branch: r.default_branch,
            url: r.html_url,
        }),
        pull_request: body.pull_request.map(|p| WebhookPullRequest {
            number: p.number,
            title: p.title,
            state: pull_state(&p.state, p.merged),
            head_ref: p.head.name,
            head_sha: p.head.sha,
            base_ref: p.base.name,
            author: p.user.login,
            url: p.html_url,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"action":"opened","number":1}"#;

    #[test]
    fn test_sign_and_verify() {
        let sig = sign(PAYLOAD, "It's a Secret to Everybody");
        assert!(sig.starts_with("sha256="));
        assert_eq!(sig.len(), "sha256=".len() + 64);
        assert!(verify_signature(PAYLOAD, &sig, "It's a Secret to Everybody"));
    }

    #[test]
    fn test_known_vector() {
        // Example delivery from GitHub's webhook validation docs.
        let sig = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert!(verify_signature(b"Hello, World!", sig, "It's a Secret to Everybody"));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let sig = sign(PAYLOAD, "secret");
        let mut bytes = sig.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(!verify_signature(PAYLOAD, &tampered, "secret"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sig = sign(PAYLOAD, "secret");
        assert!(!verify_signature(br#"{"action":"closed","number":1}"#, &sig, "secret"));
    }

    #[test]
    fn test_malformed_signatures_rejected() {
        let sig = sign(PAYLOAD, "secret");
        let bare = sig.trim_start_matches(SIGNATURE_PREFIX);
        assert!(!verify_signature(PAYLOAD, bare, "secret"));
        assert!(!verify_signature(PAYLOAD, "sha256=zz", "secret"));
        assert!(!verify_signature(PAYLOAD, "sha256=abcd", "secret"));
        assert!(!verify_signature(PAYLOAD, "", "secret"));
    }

    #[test]
    fn test_parse_pull_request_event() {
        let payload = serde_json::json!({
            "action": "closed",
            "sender": {"login": "octocat"},
            "repository": {
                "id": 1296269,
                "name": "Hello-World",
                "full_name": "octocat/Hello-World",
                "owner": {"login": "octocat"},
                "private": false,
                "default_branch": "main",
                "html_url": "https://github.com/octocat/Hello-World"
            },
            "pull_request": {
                "number": 1347,
                "title": "Amazing new feature",
                "state": "closed",
                "merged": true,
                "head": {"ref": "new-topic", "sha": "6dcb09b"},
                "base": {"ref": "main", "sha": "aaaaaaa"},
                "user": {"login": "hubot"},
                "html_url": "https://github.com/octocat/Hello-World/pull/1347"
            }
        });
        let headers: WebhookHeaders =
            [("X-GitHub-Event".to_string(), "pull_request".to_string())].into();
        let ev = parse_github_event(&headers, payload.to_string().as_bytes()).unwrap();
        assert_eq!(ev.kind, "pull_request");
        assert_eq!(ev.action.as_deref(), Some("closed"));
        assert_eq!(ev.sender, "octocat");
        let repo = ev.repository.unwrap();
        assert_eq!(repo.id, "1296269");
        assert_eq!(repo.owner, "octocat");
        let pr = ev.pull_request.unwrap();
        assert_eq!(pr.state, PullRequestState::Merged);
        assert_eq!(pr.head_ref, "new-topic");
        assert_eq!(pr.author, "hubot");
    }

    #[test]
    fn test_parse_event_without_subobjects() {
        let headers: WebhookHeaders = [("x-github-event".to_string(), "ping".to_string())].into();
        let ev = parse_github_event(&headers, br#"{"zen":"Keep it logically awesome."}"#).unwrap();
        assert_eq!(ev.kind, "ping");
        assert!(ev.action.is_none());
        assert!(ev.repository.is_none());
        assert!(ev.pull_request.is_none());
    }

    #[test]
    fn test_parse_event_missing_header() {
        let err = parse_github_event(&WebhookHeaders::new(), b"{}").unwrap_err();
        assert!(matches!(err, VcsError::Webhook(_)));
    }
}
