//! Selection Reader
//!
//! Pull state machine: retrieves the current content of a selection register
//! from whatever client owns it. Handles both one-shot delivery and the INCR
//! chunked sub-protocol, accumulating into a [`TransferBuffer`].
//!
//! Each [`SelectionReader::step`] call consumes at most one externally
//! delivered event. Events that do not match the current state's expected
//! event class are ignored and the pull stays pending.

use tracing::{debug, trace};

use crate::selection::buffer::TransferBuffer;
use crate::selection::error::Result;
use crate::selection::port::{Atom, SelectionEvent, SelectionPort};

/// Outcome of a single reader step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadProgress {
    /// Transfer not finished; feed the next event
    Pending,
    /// Content fully captured in the buffer
    Complete,
    /// The owner declined the requested target encoding
    Refused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Idle,
    AwaitingReply,
    Incremental,
    UnsupportedTarget,
}

/// Pull state machine for one selection read.
///
/// Owns its [`TransferBuffer`]; hand the buffer out with
/// [`into_buffer`](Self::into_buffer) once a step reports
/// [`ReadProgress::Complete`].
#[derive(Debug)]
pub struct SelectionReader {
    state: ReadState,
    selection: Atom,
    target: Atom,
    buffer: TransferBuffer,
}

impl SelectionReader {
    /// Create a reader for `selection`, asking for the `target` encoding.
    pub fn new(selection: Atom, target: Atom) -> Self {
        Self {
            state: ReadState::Idle,
            selection,
            target,
            buffer: TransferBuffer::new(),
        }
    }

    /// The encoding currently being requested.
    pub fn target(&self) -> Atom {
        self.target
    }

    /// Restart the pull from scratch with a different target encoding.
    ///
    /// Used by the fallback policy after the owner declined the preferred
    /// encoding.
    pub fn retry_with(&mut self, target: Atom) {
        self.state = ReadState::Idle;
        self.target = target;
    }

    /// Accumulated content so far.
    pub fn buffer(&self) -> &TransferBuffer {
        &self.buffer
    }

    /// Hand the captured content to the caller.
    pub fn into_buffer(self) -> TransferBuffer {
        self.buffer
    }

    /// Advance the state machine by at most one event.
    ///
    /// `event` is `None` only for the kick-off call while still idle; every
    /// later call feeds the next externally delivered event.
    pub fn step<P: SelectionPort + ?Sized>(
        &mut self,
        port: &mut P,
        event: Option<&SelectionEvent>,
    ) -> Result<ReadProgress> {
        let transfer = port.atoms().transfer;
        let incr = port.atoms().incr;
        let window = port.window();

        match self.state {
            ReadState::Idle => {
                if !self.buffer.is_empty() {
                    self.buffer.reset();
                }
                port.convert_selection(self.selection, self.target, transfer)?;
                port.flush()?;
                self.state = ReadState::AwaitingReply;
                trace!(selection = self.selection, target = self.target, "conversion requested");
                Ok(ReadProgress::Pending)
            }

            ReadState::AwaitingReply => {
                let Some(SelectionEvent::ConversionReply { property }) = event else {
                    return Ok(ReadProgress::Pending);
                };
                if property.is_none() {
                    debug!(target = self.target, "owner declined conversion target");
                    self.state = ReadState::UnsupportedTarget;
                    return Ok(ReadProgress::Refused);
                }
                let probe = port.probe_property(window, transfer)?;
                if probe.type_atom == incr {
                    // Zero-size first read with INCR type is the signal to
                    // switch to chunked delivery, not an error.
                    port.delete_property(window, transfer)?;
                    port.flush()?;
                    self.state = ReadState::Incremental;
                    debug!("owner announced incremental delivery");
                    return Ok(ReadProgress::Pending);
                }
                let value = port.read_property(window, transfer)?;
                port.delete_property(window, transfer)?;
                port.flush()?;
                self.buffer.replace(&value.data);
                self.state = ReadState::Idle;
                debug!(len = self.buffer.len(), "selection read in one shot");
                Ok(ReadProgress::Complete)
            }

            ReadState::Incremental => {
                let Some(SelectionEvent::PropertyNewValue {
                    window: event_window,
                    property,
                }) = event
                else {
                    return Ok(ReadProgress::Pending);
                };
                if *event_window != window || *property != transfer {
                    return Ok(ReadProgress::Pending);
                }
                let probe = port.probe_property(window, transfer)?;
                if probe.size == 0 {
                    // Zero-length chunk: the sender is done.
                    port.delete_property(window, transfer)?;
                    port.flush()?;
                    self.state = ReadState::Idle;
                    debug!(len = self.buffer.len(), "incremental read complete");
                    return Ok(ReadProgress::Complete);
                }
                let value = port.read_property(window, transfer)?;
                self.buffer.append(&value.data);
                // Deleting the property asks the sender for the next chunk.
                port.delete_property(window, transfer)?;
                port.flush()?;
                trace!(chunk = value.data.len(), total = self.buffer.len(), "chunk received");
                Ok(ReadProgress::Pending)
            }

            ReadState::UnsupportedTarget => Ok(ReadProgress::Refused),
        }
    }
}
