//! Channel subscription authorization
//!
//! The broker answers "may this socket subscribe to this channel?" and, when
//! the answer is yes, produces the signed token the client presents to the
//! messaging service:
//!
//! - `private-*`  : token over `"<socket_id>:<channel_name>"`
//! - `presence-*` : token over `"<socket_id>:<channel_name>:<channel_data>"`,
//!   where `channel_data` is the JSON-encoded member metadata
//!
//! The decision itself is delegated to a registered predicate; presence
//! metadata beyond the default `user_id` comes from an optional provider.

use crate::auth::response::{BatchAuth, BatchEntry, ChannelAuth};
use crate::channels::ChannelKind;
use crate::signing::Signer;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Decides whether a subscription is allowed, called as
/// `predicate(channel_name, socket_id)`
pub type AuthPredicate = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Supplies extra presence metadata, called as
/// `provider(channel_name, socket_id)`. Returned keys override the default
/// `user_id` entry on conflict.
pub type ChannelDataProvider = dyn Fn(&str, &str) -> Map<String, Value> + Send + Sync;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authorization predicate registered")]
    NotConfigured,

    #[error("subscription to '{0}' denied")]
    Denied(String),

    #[error("'{0}' is not a private or presence channel")]
    UnknownChannelKind(String),

    #[error("batch request contained no channel names")]
    EmptyBatch,
}

/// Stateless authorization core. The only mutable state is the two
/// registered-callback slots, which are set during application startup and
/// read on every request.
pub struct AuthBroker {
    signer: Arc<Signer>,
    predicate: RwLock<Option<Arc<AuthPredicate>>>,
    channel_data: RwLock<Option<Arc<ChannelDataProvider>>>,
}

impl AuthBroker {
    pub fn new(signer: Arc<Signer>) -> Self {
        Self {
            signer,
            predicate: RwLock::new(None),
            channel_data: RwLock::new(None),
        }
    }

    /// Register the authorization predicate. A later registration replaces
    /// an earlier one.
    pub fn set_predicate<F>(&self, predicate: F)
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        *self.predicate.write() = Some(Arc::new(predicate));
    }

    /// Register the presence channel-data provider. A later registration
    /// replaces an earlier one.
    pub fn set_channel_data<F>(&self, provider: F)
    where
        F: Fn(&str, &str) -> Map<String, Value> + Send + Sync + 'static,
    {
        *self.channel_data.write() = Some(Arc::new(provider));
    }

    /// Whether an authorization predicate has been registered
    pub fn is_configured(&self) -> bool {
        self.predicate.read().is_some()
    }

    /// Authorize a single subscription and sign its token.
    ///
    /// Classification happens before the predicate runs: a channel without a
    /// recognized prefix is `UnknownChannelKind` no matter what the
    /// predicate would have said.
    pub fn authorize(&self, socket_id: &str, channel_name: &str) -> Result<ChannelAuth, AuthError> {
        let predicate = self
            .predicate
            .read()
            .clone()
            .ok_or(AuthError::NotConfigured)?;

        let kind = ChannelKind::from_name(channel_name);
        if !kind.requires_auth() {
            return Err(AuthError::UnknownChannelKind(channel_name.to_string()));
        }

        if !predicate(channel_name, socket_id) {
            return Err(AuthError::Denied(channel_name.to_string()));
        }

        let (message, channel_data) = if kind == ChannelKind::Presence {
            let data = self.presence_data(channel_name, socket_id);
            let encoded = serde_json::to_string(&data).expect("serialize channel data");
            (
                format!("{}:{}:{}", socket_id, channel_name, encoded),
                Some(encoded),
            )
        } else {
            (format!("{}:{}", socket_id, channel_name), None)
        };

        let auth = format!(
            "{}:{}",
            self.signer.key(),
            self.signer.sign(message.as_bytes())
        );

        Ok(ChannelAuth { auth, channel_data })
    }

    /// Authorize an ordered batch of channels for one socket.
    ///
    /// Each channel is judged independently: a denial becomes a 403 entry
    /// and an unrecognized kind a 404 entry, without aborting the rest.
    /// Output order matches input order.
    pub fn authorize_batch(
        &self,
        socket_id: &str,
        channel_names: &[String],
    ) -> Result<BatchAuth, AuthError> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        if channel_names.is_empty() {
            return Err(AuthError::EmptyBatch);
        }

        let mut batch = BatchAuth::new();
        for channel_name in channel_names {
            let entry = match self.authorize(socket_id, channel_name) {
                Ok(auth) => BatchEntry::ok(auth),
                Err(AuthError::Denied(_)) => BatchEntry::forbidden(),
                Err(AuthError::UnknownChannelKind(_)) => BatchEntry::not_found(),
                Err(err) => return Err(err),
            };
            batch.insert(channel_name.clone(), entry);
        }

        Ok(batch)
    }

    /// Build the presence metadata: `user_id` plus whatever the provider
    /// adds, the provider winning on conflicts.
    fn presence_data(&self, channel_name: &str, socket_id: &str) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("user_id".to_string(), Value::String(socket_id.to_string()));

        let provider = self.channel_data.read().clone();
        if let Some(provider) = provider {
            for (key, value) in provider(channel_name, socket_id) {
                data.insert(key, value);
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEST_SECRET: &[u8] = b"test-secret-for-authorization";

    fn broker() -> AuthBroker {
        AuthBroker::new(Arc::new(Signer::new("app-key", TEST_SECRET)))
    }

    fn expected_token(message: &str) -> String {
        let signer = Signer::new("app-key", TEST_SECRET);
        format!("app-key:{}", signer.sign(message.as_bytes()))
    }

    #[test]
    fn test_authorize_not_configured() {
        let broker = broker();

        let result = broker.authorize("1234.5678", "private-room");
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }

    #[test]
    fn test_authorize_private() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let auth = broker.authorize("1234.5678", "private-room").unwrap();

        assert_eq!(auth.auth, expected_token("1234.5678:private-room"));
        assert_eq!(auth.channel_data, None);
    }

    #[test]
    fn test_authorize_denied() {
        let broker = broker();
        broker.set_predicate(|_, _| false);

        let result = broker.authorize("1234.5678", "private-room");
        assert!(matches!(result, Err(AuthError::Denied(_))));
    }

    #[test]
    fn test_authorize_public_channel() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let result = broker.authorize("1234.5678", "open-room");
        assert!(matches!(result, Err(AuthError::UnknownChannelKind(_))));
    }

    #[test]
    fn test_unknown_kind_wins_over_denial() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = broker();
        let seen = calls.clone();
        broker.set_predicate(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            false
        });

        let result = broker.authorize("1234.5678", "open-room");

        assert!(matches!(result, Err(AuthError::UnknownChannelKind(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_authorize_presence_default_data() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let auth = broker.authorize("44.22", "presence-room").unwrap();

        let data_str = auth.channel_data.as_deref().unwrap();
        let data: Value = serde_json::from_str(data_str).unwrap();
        assert_eq!(data["user_id"], "44.22");

        let message = format!("44.22:presence-room:{}", data_str);
        assert_eq!(auth.auth, expected_token(&message));
    }

    #[test]
    fn test_presence_provider_merge() {
        let broker = broker();
        broker.set_predicate(|_, _| true);
        broker.set_channel_data(|_, _| {
            let mut extra = Map::new();
            extra.insert("name".to_string(), Value::String("alice".to_string()));
            extra
        });

        let auth = broker.authorize("44.22", "presence-room").unwrap();
        let data: Value = serde_json::from_str(auth.channel_data.as_deref().unwrap()).unwrap();

        assert_eq!(data["user_id"], "44.22");
        assert_eq!(data["name"], "alice");
    }

    #[test]
    fn test_presence_provider_overrides_user_id() {
        let broker = broker();
        broker.set_predicate(|_, _| true);
        broker.set_channel_data(|_, _| {
            let mut extra = Map::new();
            extra.insert("user_id".to_string(), Value::String("member-7".to_string()));
            extra
        });

        let auth = broker.authorize("44.22", "presence-room").unwrap();
        let data: Value = serde_json::from_str(auth.channel_data.as_deref().unwrap()).unwrap();

        assert_eq!(data["user_id"], "member-7");
    }

    #[test]
    fn test_provider_not_called_for_private() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = broker();
        broker.set_predicate(|_, _| true);
        let seen = calls.clone();
        broker.set_channel_data(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Map::new()
        });

        broker.authorize("1234.5678", "private-room").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predicate_sees_channel_and_socket() {
        let broker = broker();
        broker.set_predicate(|channel, socket_id| {
            channel == "private-room" && socket_id == "1234.5678"
        });

        assert!(broker.authorize("1234.5678", "private-room").is_ok());
        assert!(matches!(
            broker.authorize("9999.0000", "private-room"),
            Err(AuthError::Denied(_))
        ));
    }

    #[test]
    fn test_last_predicate_registration_wins() {
        let broker = broker();
        broker.set_predicate(|_, _| false);
        broker.set_predicate(|_, _| true);

        assert!(broker.authorize("1234.5678", "private-room").is_ok());
    }

    #[test]
    fn test_batch_order_and_isolation() {
        let broker = broker();
        broker.set_predicate(|channel, _| !channel.contains('b'));

        let channels = vec![
            "private-a".to_string(),
            "private-b".to_string(),
            "presence-c".to_string(),
        ];
        let batch = broker.authorize_batch("1234.5678", &channels).unwrap();

        let order: Vec<&str> = batch.channels().collect();
        assert_eq!(order, vec!["private-a", "private-b", "presence-c"]);

        assert_eq!(batch.get("private-a").unwrap().status, 200);
        assert_eq!(batch.get("private-b").unwrap().status, 403);
        assert_eq!(batch.get("presence-c").unwrap().status, 200);
        assert!(batch.get("private-b").unwrap().data.is_none());
    }

    #[test]
    fn test_batch_isolates_unknown_kind() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let channels = vec![
            "private-a".to_string(),
            "open-room".to_string(),
            "private-c".to_string(),
        ];
        let batch = broker.authorize_batch("1234.5678", &channels).unwrap();

        assert_eq!(batch.get("private-a").unwrap().status, 200);
        assert_eq!(batch.get("open-room").unwrap().status, 404);
        assert_eq!(batch.get("private-c").unwrap().status, 200);
    }

    #[test]
    fn test_batch_empty() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let result = broker.authorize_batch("1234.5678", &[]);
        assert!(matches!(result, Err(AuthError::EmptyBatch)));
    }

    #[test]
    fn test_batch_not_configured() {
        let broker = broker();

        let channels = vec!["private-a".to_string()];
        let result = broker.authorize_batch("1234.5678", &channels);
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }

    #[test]
    fn test_batch_duplicate_channel() {
        let broker = broker();
        broker.set_predicate(|_, _| true);

        let channels = vec!["private-a".to_string(), "private-a".to_string()];
        let batch = broker.authorize_batch("1234.5678", &channels).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("private-a").unwrap().status, 200);
    }
}
