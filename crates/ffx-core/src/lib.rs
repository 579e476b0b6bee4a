//! # ffx-core
//!
//! Shared contract between the FFX application core (the "app") and the
//! interop bridge that connects it to the real-time messaging network and the
//! error-telemetry service.
//!
//! The app never talks to either service directly.  It emits typed
//! [`OutboundCommand`]s across a narrow boundary and consumes
//! [`DecodedEvent`]s coming back.  This crate defines both sides of that
//! boundary and nothing else: it has no I/O, no async runtime and no
//! knowledge of the services behind the bridge.
//!
//! - **`protocol`** – The JSON wire form of commands (`{"tag": ..., "data": ...}`)
//!   and the decoder for raw inbound payloads.
//! - **`domain`** – Value types carried by the protocol: subscription
//!   credentials, channel names and the issue producer tag.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `ffx_core::OutboundCommand` instead of `ffx_core::protocol::command::OutboundCommand`.
pub use domain::channel::ChannelName;
pub use domain::credentials::SubscriptionCreds;
pub use domain::producer::Producer;
pub use protocol::command::{decode_command, OutboundCommand, ProtocolError};
pub use protocol::payload::{decode_payload, DecodeFailure, DecodedEvent, DECODE_FAILURE_PREFIX};
