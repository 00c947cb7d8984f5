//! Webhook verification and dispatch
//!
//! The messaging service POSTs event payloads back to the application and
//! signs each request body with the shared secret. A payload reaches a
//! registered handler only after three checks pass, in order:
//!
//! 1. a handler is registered for the event kind
//! 2. the `X-Pusher-Key` header matches the configured application key
//! 3. the `X-Pusher-Signature` header is a valid HMAC of the raw body
//!
//! Handlers receive the raw body bytes exactly as they were signed.

use crate::signing::Signer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Callback invoked with the verified raw webhook body
pub type WebhookHandler = dyn Fn(&[u8]) + Send + Sync;

/// The webhook event families the service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookKind {
    ChannelExistence,
    Presence,
    Client,
}

impl WebhookKind {
    pub const ALL: [WebhookKind; 3] = [
        WebhookKind::ChannelExistence,
        WebhookKind::Presence,
        WebhookKind::Client,
    ];

    /// Name as it appears in the endpoint path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookKind::ChannelExistence => "channel_existence",
            WebhookKind::Presence => "presence",
            WebhookKind::Client => "client",
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("no handler registered for {0} webhooks")]
    NoHandler(WebhookKind),

    #[error("webhook key does not match the application key")]
    InvalidKey,

    #[error("webhook signature verification failed")]
    InvalidSignature,
}

/// Verifies incoming webhooks and routes them to registered handlers.
pub struct Webhooks {
    signer: Arc<Signer>,
    handlers: RwLock<HashMap<WebhookKind, Arc<WebhookHandler>>>,
}

impl Webhooks {
    pub fn new(signer: Arc<Signer>) -> Self {
        Self {
            signer,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler for one webhook kind. A later registration
    /// replaces an earlier one.
    pub fn on<F>(&self, kind: WebhookKind, handler: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.handlers.write().insert(kind, Arc::new(handler));
    }

    /// Register a handler for `channel_existence` events
    pub fn channel_existence<F>(&self, handler: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.on(WebhookKind::ChannelExistence, handler);
    }

    /// Register a handler for `presence` events
    pub fn presence<F>(&self, handler: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.on(WebhookKind::Presence, handler);
    }

    /// Register a handler for `client` events
    pub fn client<F>(&self, handler: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.on(WebhookKind::Client, handler);
    }

    pub fn has_handler(&self, kind: WebhookKind) -> bool {
        self.handlers.read().contains_key(&kind)
    }

    /// Verify an incoming webhook and, if every check passes, invoke the
    /// handler registered for its kind.
    ///
    /// The handler runs without any internal lock held, so it may itself
    /// register or replace handlers.
    pub fn handle(
        &self,
        kind: WebhookKind,
        key: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), WebhookError> {
        let handler = self
            .handlers
            .read()
            .get(&kind)
            .cloned()
            .ok_or(WebhookError::NoHandler(kind))?;

        if key != Some(self.signer.key()) {
            return Err(WebhookError::InvalidKey);
        }

        if !self.signer.verify(body, signature.unwrap_or("")) {
            return Err(WebhookError::InvalidSignature);
        }

        handler(body);
        Ok(())
    }
}
