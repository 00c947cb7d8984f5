//! Incoming webhook verification
//!
//! Event kinds:
//! - `channel_existence`: channels becoming occupied or vacated
//! - `presence`: members joining or leaving presence channels
//! - `client`: client events forwarded by the service

mod gateway;

pub use gateway::{WebhookError, WebhookHandler, WebhookKind, Webhooks};
