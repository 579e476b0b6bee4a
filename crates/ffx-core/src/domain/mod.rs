//! Domain values carried across the app/bridge boundary.
//!
//! Nothing in here performs I/O.  These are plain data types with the few
//! derivation rules the bridge depends on (for example, how a space
//! identifier maps to a channel name).

pub mod channel;
pub mod credentials;
pub mod producer;
