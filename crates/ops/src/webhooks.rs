use crate::VcsOperations;
use vcsgate_provider::WebhookHeaders;
use vcsgate_types::{ProviderId, Result, WebhookEvent};

/// Webhook helpers. These never touch stored credentials.
#[derive(Clone, Copy, Debug)]
pub struct Webhooks<'a> {
    ops: &'a VcsOperations,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(ops: &'a VcsOperations) -> Self {
        Self { ops }
    }

    /// Check `signature` over the raw `payload` using the provider's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`vcsgate_types::VcsError::ProviderNotFound`] if the provider is
    /// not registered. A bad signature is `Ok(false)`.
    pub fn verify(
        &self,
        provider: Option<ProviderId>,
        payload: &[u8],
        signature: &str,
        secret: &str,
    ) -> Result<bool> {
        let backend = self.ops.provider(provider)?;
        let valid = backend.verify_webhook_signature(payload, signature, secret);
        if !valid {
            tracing::warn!(provider = %backend.id(), "webhook signature rejected");
        }
        Ok(valid)
    }

    /// Normalize a delivery into a [`WebhookEvent`].
    ///
    /// # Errors
    ///
    /// Fails when the provider is not registered, does not parse webhooks, or
    /// the payload is malformed.
    pub fn parse(
        &self,
        provider: Option<ProviderId>,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<WebhookEvent> {
        self.ops.provider(provider)?.parse_webhook_event(headers, payload)
    }
}
