//! Wire protocol between the app core and the bridge.
//!
//! ```text
//! App  → Bridge: JSON text  →  OutboundCommand   (decode_command)
//! Net  → Bridge: raw text   →  DecodedEvent      (decode_payload)
//! Bridge → App:  DecodedEvent → JSON text
//! ```

pub mod command;
pub mod payload;

pub use command::{decode_command, OutboundCommand, ProtocolError};
pub use payload::{decode_payload, DecodeFailure, DecodedEvent, DECODE_FAILURE_PREFIX};
