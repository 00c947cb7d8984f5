//! Subscription authorization
//!
//! Request flow:
//! - `AuthBroker::authorize`: one channel, one signed token
//! - `AuthBroker::authorize_batch`: many channels, one entry per channel
//!
//! Response types:
//! - `ChannelAuth`: the signed token (plus presence metadata)
//! - `BatchAuth`: ordered per-channel entries with individual statuses

mod broker;
mod response;

pub use broker::{AuthBroker, AuthError, AuthPredicate, ChannelDataProvider};
pub use response::{BatchAuth, BatchEntry, ChannelAuth};
