//! # exclip
//!
//! Re-owns the X11 primary selection: reads PRIMARY from its current owner,
//! normalizes the text (unless verbatim), then forks one holder process per
//! register so both PRIMARY and CLIPBOARD keep serving the content
//! independently of the invoking process.
//!
//! # Architecture
//!
//! ```text
//! exclip
//!   ├─> X11Port (connection + endpoint window, per process)
//!   ├─> SelectionReader ──> TransferBuffer ──> text::normalize
//!   └─> fork per register
//!         ├─> holder[PRIMARY]   ── SelectionServer ── serves until cleared
//!         └─> holder[CLIPBOARD] ── SelectionServer ── serves until cleared
//! ```
//!
//! The protocol state machines in [`selection`] are written against the
//! [`selection::SelectionPort`] trait, so they run identically over a live X
//! connection or a scripted test port. Payloads above the per-request size
//! limit travel through the INCR chunked sub-protocol in both directions.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Selection transfer state machines and buffer contract
pub mod selection;

/// Orchestration: capture pass, holder loop, process forking
pub mod session;

/// Whitespace normalization for captured text
pub mod text;

/// Live X11 implementation of the selection port
pub mod x11;

pub use selection::{
    ReadProgress, SelectionError, SelectionReader, SelectionServer, ServeProgress, TransferBuffer,
};
pub use session::Register;
pub use x11::X11Port;
