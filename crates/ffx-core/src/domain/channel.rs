//! Messaging channel names.

use std::fmt;

/// Prefix shared by every space channel on the messaging network.
const SPACE_CHANNEL_PREFIX: &str = "space.";

/// Name of a channel on the messaging network.
///
/// The bridge subscribes to exactly one channel per connection, derived from
/// the space identifier carried in the subscription credentials.
///
/// # Examples
///
/// ```rust
/// use ffx_core::ChannelName;
///
/// let channel = ChannelName::for_space("abc123");
/// assert_eq!(channel.as_str(), "space.abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Derives the channel for a space: `"space." + space_id`.
    ///
    /// The identifier is used verbatim; no trimming or validation is applied.
    pub fn for_space(space_id: &str) -> Self {
        Self(format!("{SPACE_CHANNEL_PREFIX}{space_id}"))
    }

    /// Returns the channel name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ChannelName> for String {
    fn from(channel: ChannelName) -> Self {
        channel.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
