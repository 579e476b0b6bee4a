//! Subscription credentials issued to the app core.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::channel::ChannelName;

/// Everything the bridge needs to open one messaging connection.
///
/// The app core receives these from its own backend and relays them to the
/// bridge unchanged; the bridge never issues or refreshes tokens itself.
///
/// # Serde representation
///
/// ```json
/// {"subscribeKey":"sub-c-1","accountId":"acct-9","token":"p0F2AkF0...","spaceId":"abc123"}
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCreds {
    /// Subscribe key identifying the messaging keyset.
    pub subscribe_key: String,

    /// Account identifier, used as the user id on the messaging network.
    pub account_id: String,

    /// Bearer token authorising the subscription.
    pub token: String,

    /// Space identifier; the subscribed channel is derived from it.
    pub space_id: String,
}

impl SubscriptionCreds {
    /// Returns the single channel these credentials subscribe to.
    pub fn channel(&self) -> ChannelName {
        ChannelName::for_space(&self.space_id)
    }
}

// The token is a bearer secret and must never reach a log line.
impl fmt::Debug for SubscriptionCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionCreds")
            .field("subscribe_key", &self.subscribe_key)
            .field("account_id", &self.account_id)
            .field("token", &"<redacted>")
            .field("space_id", &self.space_id)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
