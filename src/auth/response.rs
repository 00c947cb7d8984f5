//! Wire types returned by the authorization endpoint

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A successful authorization for one channel.
///
/// `channel_data` holds the JSON-*encoded* presence metadata as a string,
/// not a nested object. The subscribing SDK expects the exact string that
/// was signed into the token, so the asymmetry is part of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAuth {
    /// The signed token, `"<key>:<hex signature>"`
    pub auth: String,
    /// JSON-encoded presence metadata; only present for presence channels
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel_data: Option<String>,
}

/// One entry of a batch authorization response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Per-channel status code: 200, 403, or 404
    pub status: u16,
    /// The authorization, present only when `status` is 200
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<ChannelAuth>,
}

impl BatchEntry {
    pub fn ok(data: ChannelAuth) -> Self {
        Self {
            status: 200,
            data: Some(data),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            status: 403,
            data: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            data: None,
        }
    }
}

/// Batch authorization response: channel name mapped to a per-channel entry.
///
/// Entries keep insertion order, and serialize in that order, so the JSON
/// object mirrors the request order. A repeated channel keeps its first
/// position; its value is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAuth {
    entries: Vec<(String, BatchEntry)>,
}

impl BatchAuth {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert an entry. Replaces the value in place if the channel is
    /// already present.
    pub fn insert(&mut self, channel: String, entry: BatchEntry) {
        match self.entries.iter_mut().find(|(name, _)| *name == channel) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((channel, entry)),
        }
    }

    pub fn get(&self, channel: &str) -> Option<&BatchEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, entry)| entry)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Channel names in insertion order
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for BatchAuth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (channel, entry) in &self.entries {
            map.serialize_entry(channel, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BatchAuth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BatchAuthVisitor;

        impl<'de> Visitor<'de> for BatchAuthVisitor {
            type Value = BatchAuth;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of channel names to batch entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut batch = BatchAuth::new();
                while let Some((channel, entry)) = access.next_entry::<String, BatchEntry>()? {
                    batch.insert(channel, entry);
                }
                Ok(batch)
            }
        }

        deserializer.deserialize_map(BatchAuthVisitor)
    }
}
