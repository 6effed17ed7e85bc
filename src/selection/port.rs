//! Selection Port Abstraction
//!
//! The reader and server state machines are written against this trait rather
//! than a concrete X connection, so the protocol logic can be driven by
//! scripted events in tests. The real implementation is
//! [`X11Port`](crate::x11::X11Port); tests use an in-memory port.
//!
//! Events are the subset of X events the selection protocol cares about,
//! already mapped to their protocol meaning. Actions are the X requests the
//! two state machines emit.

use crate::selection::error::Result;

/// Symbolic protocol identifier (an X atom).
///
/// Resolved once per connection and compared by identity, never by name.
pub type Atom = u32;

/// Window id of a protocol participant.
pub type Window = u32;

/// X server timestamp carried through request/notify pairs.
pub type Timestamp = u32;

/// Atom value meaning "none" in replies and requests.
pub const NONE: Atom = 0;

/// The resolve-once atom cache.
///
/// One instance per connection; every identifier the selection protocol needs,
/// interned up front.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    /// PRIMARY selection register
    pub primary: Atom,
    /// CLIPBOARD selection register
    pub clipboard: Atom,
    /// Preferred text encoding (UTF8_STRING)
    pub utf8_string: Atom,
    /// Legacy text encoding (STRING, Latin-1)
    pub string: Atom,
    /// Capability-list marker (TARGETS)
    pub targets: Atom,
    /// Chunked-transfer marker (INCR)
    pub incr: Atom,
    /// Holding property conversions are delivered into on our window
    pub transfer: Atom,
}

/// An externally delivered protocol event, one per state-machine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// SelectionNotify: the owner answered our conversion request.
    /// `property` is `None` when the owner declined the target.
    ConversionReply {
        /// Property the result was written into, if any
        property: Option<Atom>,
    },
    /// PropertyNotify with a new value written
    PropertyNewValue {
        /// Window the property lives on
        window: Window,
        /// Property that changed
        property: Atom,
    },
    /// PropertyNotify with the property deleted (chunk consumed)
    PropertyDeleted {
        /// Window the property lived on
        window: Window,
        /// Property that was deleted
        property: Atom,
    },
    /// SelectionRequest: another client wants our content
    Request {
        /// Requesting window
        requestor: Window,
        /// Selection register being requested
        selection: Atom,
        /// Target encoding (or TARGETS for the capability query)
        target: Atom,
        /// Property on the requestor to write the result into
        property: Atom,
        /// Request timestamp, echoed in the acknowledgment
        time: Timestamp,
    },
    /// SelectionClear: another client took ownership of the register
    OwnershipCleared {
        /// Register whose ownership was lost
        selection: Atom,
    },
}

/// Type and pending size of a property, from a zero-length read.
#[derive(Debug, Clone, Copy)]
pub struct PropertyProbe {
    /// Declared type of the property value
    pub type_atom: Atom,
    /// Bytes available to read
    pub size: usize,
}

/// Full property value.
#[derive(Debug, Clone)]
pub struct PropertyValue {
    /// Declared type of the property value
    pub type_atom: Atom,
    /// Raw value bytes
    pub data: Vec<u8>,
}

/// Protocol actions the state machines emit, plus the blocking event source.
pub trait SelectionPort {
    /// The interned atom cache for this connection.
    fn atoms(&self) -> &Atoms;

    /// Our own window id (conversion results land on it).
    fn window(&self) -> Window;

    /// Largest single-message payload we will emit.
    ///
    /// One quarter of the transport's advertised maximum request size, leaving
    /// headroom for framing.
    fn max_chunk_size(&self) -> usize;

    /// Ask the current owner of `selection` to convert to `target`, delivering
    /// into `property` on our window.
    fn convert_selection(&mut self, selection: Atom, target: Atom, property: Atom) -> Result<()>;

    /// Zero-length read: declared type and pending size, value untouched.
    fn probe_property(&mut self, window: Window, property: Atom) -> Result<PropertyProbe>;

    /// Read the full property value.
    fn read_property(&mut self, window: Window, property: Atom) -> Result<PropertyValue>;

    /// Delete a property (on the read side this requests the next chunk).
    fn delete_property(&mut self, window: Window, property: Atom) -> Result<()>;

    /// Write a byte-valued property (format 8).
    fn write_property(
        &mut self,
        window: Window,
        property: Atom,
        type_atom: Atom,
        data: &[u8],
    ) -> Result<()>;

    /// Write an atom-list-valued property (format 32), for TARGETS replies.
    fn write_atom_list(&mut self, window: Window, property: Atom, atoms: &[Atom]) -> Result<()>;

    /// Subscribe to property-change notifications on a counterpart window.
    fn watch_properties(&mut self, window: Window) -> Result<()>;

    /// Send a SelectionNotify acknowledgment for a request we served.
    fn send_reply(
        &mut self,
        requestor: Window,
        selection: Atom,
        target: Atom,
        property: Atom,
        time: Timestamp,
    ) -> Result<()>;

    /// Assert ownership of a selection register.
    fn claim_ownership(&mut self, selection: Atom) -> Result<()>;

    /// Flush buffered requests to the server.
    fn flush(&mut self) -> Result<()>;

    /// Block until the next selection-relevant event.
    fn wait_event(&mut self) -> Result<SelectionEvent>;

    /// Human-readable name of an atom, for diagnostics only.
    fn atom_name(&mut self, atom: Atom) -> String;
}
