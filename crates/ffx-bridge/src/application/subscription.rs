//! Subscription lifecycle: at most one live messaging connection.
//!
//! # State machine
//!
//! ```text
//!            SubscriptionCreds                 SubscriptionCreds
//!   Idle ───────────────────────► Active ◄──────────────────────┐
//!                                    │  stop old, start new      │
//!                                    └───────────────────────────┘
//! ```
//!
//! Replacing a connection is atomic from the bridge's point of view: the old
//! connection is stopped before the new one is even constructed, so two
//! connections never deliver messages at the same time.  `stop` is called
//! unconditionally; the health of the old connection is never checked.
//!
//! The command set has no way back to `Idle`.  [`SubscriptionManager::stop_current`]
//! exists for process teardown only.

use std::sync::Arc;

use ffx_core::{ChannelName, SubscriptionCreds};
use tracing::{debug, info};

use crate::application::ports::{Connection, MessageHandler, MessagingClient};

/// Observable state of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No connection.
    Idle,
    /// One connection, listening on `channel`.
    Active { generation: u64, channel: ChannelName },
}

/// The live connection and what it was opened for.
pub struct ActiveConnection {
    generation: u64,
    channel: ChannelName,
    connection: Box<dyn Connection>,
}

impl ActiveConnection {
    /// Generation number assigned when the connection was opened.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The single channel the connection subscribed to.
    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }
}

/// Owns the bridge's single messaging connection.
pub struct SubscriptionManager {
    client: Arc<dyn MessagingClient>,
    handler: Arc<dyn MessageHandler>,
    /// Generation the next connection gets; wraps at `u64::MAX`.
    next_generation: u64,
    active: Option<ActiveConnection>,
}

impl SubscriptionManager {
    /// Creates an idle manager.
    ///
    /// `handler` is registered on every connection this manager opens.
    pub fn new(client: Arc<dyn MessagingClient>, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            client,
            handler,
            next_generation: 0,
            active: None,
        }
    }

    /// Replaces the current connection with one built from `creds`.
    ///
    /// Order of operations:
    ///
    /// 1. stop the previous connection, if any;
    /// 2. construct a connection from the subscribe key and account id;
    /// 3. register the inbound handler;
    /// 4. set the bearer token;
    /// 5. subscribe to `space.<spaceId>`.
    ///
    /// Returns the new connection's generation.
    pub fn replace(&mut self, creds: &SubscriptionCreds) -> u64 {
        self.stop_current();

        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let channel = creds.channel();

        let mut connection = self.client.connect(&creds.subscribe_key, &creds.account_id);
        connection.add_listener(Arc::clone(&self.handler));
        connection.set_token(&creds.token);
        connection.subscribe(std::slice::from_ref(&channel));

        info!(generation, channel = %channel, "messaging connection started");

        self.active = Some(ActiveConnection {
            generation,
            channel,
            connection,
        });
        generation
    }

    /// Stops the active connection, if any, and returns to idle.
    ///
    /// Safe to call when idle.
    pub fn stop_current(&mut self) {
        if let Some(mut previous) = self.active.take() {
            previous.connection.stop();
            debug!(
                generation = previous.generation,
                channel = %previous.channel,
                "messaging connection stopped"
            );
        }
    }

    /// The active connection, or `None` when idle.
    pub fn current(&self) -> Option<&ActiveConnection> {
        self.active.as_ref()
    }

    /// Snapshot of the manager's state.
    pub fn state(&self) -> SubscriptionState {
        match &self.active {
            None => SubscriptionState::Idle,
            Some(active) => SubscriptionState::Active {
                generation: active.generation,
                channel: active.channel.clone(),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
