//! X11 Selection Transfer
//!
//! The two protocol state machines at the heart of this tool, plus the
//! buffer contract they share and the port abstraction they run against.
//!
//! # Architecture
//!
//! ```text
//! Selection owner              X server               This process
//! ━━━━━━━━━━━━━━━              ━━━━━━━━               ━━━━━━━━━━━━
//!
//!                         ConvertSelection  <──────── SelectionReader (pull)
//! SelectionRequest <───────────┘                           │
//!   └─> property write ──> SelectionNotify ───────────────>│
//!                          PropertyNotify  ───────────────>│  (INCR chunks)
//!                                                          v
//!                                                   TransferBuffer
//!                                                          │ freeze
//!                                                          v
//! SelectionRequest ────────────────────────────────> SelectionServer (serve)
//!                <── property write + SelectionNotify ─────┘
//!                <── chunked property writes (INCR) ───────┘
//! ```
//!
//! Both machines consume exactly one externally delivered event per step and
//! never block; the blocking wait lives in [`SelectionPort::wait_event`].
//! Payloads above the transport's chunk threshold go through the INCR
//! sub-protocol in both directions.

/// Growable transfer buffer
pub mod buffer;

/// Error types
pub mod error;

/// Protocol port abstraction (events in, actions out)
pub mod port;

/// Pull state machine: read a selection from its current owner
pub mod reader;

/// Serve state machine: answer requests for a selection we own
pub mod server;

#[cfg(test)]
pub(crate) mod mock;

pub use buffer::TransferBuffer;
pub use error::{Result, SelectionError};
pub use port::{Atom, Atoms, PropertyProbe, PropertyValue, SelectionEvent, SelectionPort};
pub use reader::{ReadProgress, SelectionReader};
pub use server::{PendingRequest, SelectionServer, ServeProgress};
