//! Channel classification
//!
//! The channel kind is encoded in the name prefix:
//! - `presence-` : authorized subscription with member metadata
//! - `private-`  : authorized subscription, no member metadata
//! - anything else is public and never goes through authorization
//!
//! Classification is case-sensitive and checked presence before private, so
//! `presence-private-room` is a presence channel.

use std::fmt;

/// Channel name prefixes
pub const PRESENCE_PREFIX: &str = "presence-";
pub const PRIVATE_PREFIX: &str = "private-";

/// The kind of a channel, derived from its name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// `presence-*`: subscribers are tracked and visible to each other
    Presence,
    /// `private-*`: subscription requires authorization
    Private,
    /// No recognized prefix: open subscription, no authorization involved
    Public,
}

impl ChannelKind {
    /// Classify a channel name by prefix
    pub fn from_name(name: &str) -> ChannelKind {
        if name.starts_with(PRESENCE_PREFIX) {
            ChannelKind::Presence
        } else if name.starts_with(PRIVATE_PREFIX) {
            ChannelKind::Private
        } else {
            ChannelKind::Public
        }
    }

    /// Whether subscriptions of this kind go through the authorization
    /// endpoint
    pub fn requires_auth(&self) -> bool {
        matches!(self, ChannelKind::Presence | ChannelKind::Private)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Presence => write!(f, "presence"),
            ChannelKind::Private => write!(f, "private"),
            ChannelKind::Public => write!(f, "public"),
        }
    }
}
