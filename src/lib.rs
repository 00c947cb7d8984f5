//! Countersign - channel authorization and webhook verification for
//! Pusher-compatible messaging services
//!
//! Pusher-style services need the application to vouch for two things: that a
//! socket may subscribe to a private or presence channel, and that an
//! incoming webhook really came from the service. Both proofs are HMAC-SHA256
//! signatures over the shared application secret. Countersign implements both
//! sides and exposes them as an axum router the application mounts wherever
//! it likes.

pub mod auth;
pub mod channels;
pub mod config;
pub mod server;
pub mod signing;
pub mod webhooks;

pub use auth::{AuthBroker, AuthError, BatchAuth, BatchEntry, ChannelAuth};
pub use channels::ChannelKind;
pub use config::{ConfigError, Credentials};
pub use server::{Countersign, RouterConfig};
pub use signing::Signer;
pub use webhooks::{WebhookError, WebhookKind, Webhooks};
