//! Selection Server
//!
//! Serve state machine: answers other clients' requests for a selection
//! register this process owns. Capability (TARGETS) queries are answered
//! statelessly; payloads above the chunk threshold are delivered through the
//! INCR sub-protocol, driven by the requestor deleting each chunk it has
//! consumed.
//!
//! The cursor advances by a fixed stride of one chunk size per delivery, even
//! when the final chunk is shorter; the overshoot is clamped on the next bound
//! computation. Completion detection depends on this, so the stride must not
//! be "corrected" to the actual byte count.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::selection::error::Result;
use crate::selection::port::{Atom, SelectionEvent, SelectionPort, Timestamp, Window};

/// Outcome of a single server step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeProgress {
    /// Nothing delivered to completion yet; feed the next event
    Pending,
    /// A payload transfer finished (one-shot write or INCR terminator)
    RoundComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServeState {
    Idle,
    Incremental,
}

/// An in-flight request from a counterpart window.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Window that asked for the content
    pub requestor: Window,
    /// Property on the requestor the result is written into
    pub property: Atom,
    /// Encoding the content is delivered as
    pub target: Atom,
    /// Timestamp echoed from the request
    pub time: Timestamp,
    /// Byte offset of the next chunk into the content
    pub cursor: usize,
}

/// Serve state machine for one owned selection register.
///
/// Holds the content as immutable shared bytes; every requestor is served
/// from the same captured buffer.
#[derive(Debug)]
pub struct SelectionServer {
    state: ServeState,
    content: Bytes,
    pending: Option<PendingRequest>,
}

impl SelectionServer {
    /// Create a server holding `content`.
    pub fn new(content: Bytes) -> Self {
        Self {
            state: ServeState::Idle,
            content,
            pending: None,
        }
    }

    /// True when no payload transfer is in flight.
    pub fn is_idle(&self) -> bool {
        self.state == ServeState::Idle
    }

    /// The content being served.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Advance the state machine by one event.
    ///
    /// Events that do not match the current state's expected class are
    /// ignored.
    pub fn step<P: SelectionPort + ?Sized>(
        &mut self,
        port: &mut P,
        event: &SelectionEvent,
    ) -> Result<ServeProgress> {
        let atoms = *port.atoms();

        match self.state {
            ServeState::Idle => {
                let &SelectionEvent::Request {
                    requestor,
                    selection,
                    target,
                    property,
                    time,
                } = event
                else {
                    return Ok(ServeProgress::Pending);
                };

                if target == atoms.targets {
                    // Pure capability reply; no payload state is touched, so
                    // this can be answered any number of times.
                    port.write_atom_list(
                        requestor,
                        property,
                        &[atoms.targets, atoms.utf8_string],
                    )?;
                    port.send_reply(requestor, selection, target, property, time)?;
                    port.flush()?;
                    trace!(requestor, "answered capability query");
                    return Ok(ServeProgress::Pending);
                }

                // Payload is always delivered as UTF8_STRING, whatever target
                // the requestor named.
                let served = atoms.utf8_string;

                if self.content.len() > port.max_chunk_size() {
                    // Announce incremental delivery with a zero-length INCR
                    // property, then follow the requestor's deletions.
                    self.pending = Some(PendingRequest {
                        requestor,
                        property,
                        target: served,
                        time,
                        cursor: 0,
                    });
                    port.write_property(requestor, property, atoms.incr, &[])?;
                    port.watch_properties(requestor)?;
                    self.state = ServeState::Incremental;
                    port.send_reply(requestor, selection, target, property, time)?;
                    port.flush()?;
                    debug!(
                        requestor,
                        len = self.content.len(),
                        "serving incrementally"
                    );
                    Ok(ServeProgress::Pending)
                } else {
                    port.write_property(requestor, property, served, &self.content)?;
                    port.send_reply(requestor, selection, target, property, time)?;
                    port.flush()?;
                    debug!(requestor, len = self.content.len(), "served in one shot");
                    Ok(ServeProgress::RoundComplete)
                }
            }

            ServeState::Incremental => {
                let &SelectionEvent::PropertyDeleted { window, property } = event else {
                    return Ok(ServeProgress::Pending);
                };
                let Some(pending) = self.pending.as_mut() else {
                    return Ok(ServeProgress::Pending);
                };
                if window != pending.requestor || property != pending.property {
                    return Ok(ServeProgress::Pending);
                }

                let chunk_size = port.max_chunk_size();
                let len = self.content.len();
                // Clamp on read: the fixed-stride cursor may sit past the end
                // after the final partial chunk.
                let chunk_len = if pending.cursor > len {
                    0
                } else {
                    (len - pending.cursor).min(chunk_size)
                };

                if chunk_len > 0 {
                    let chunk = &self.content[pending.cursor..pending.cursor + chunk_len];
                    port.write_property(pending.requestor, pending.property, pending.target, chunk)?;
                } else {
                    // Zero-length write signals completion to the requestor.
                    port.write_property(pending.requestor, pending.property, pending.target, &[])?;
                }
                port.flush()?;

                // Fixed stride, not actual bytes written.
                pending.cursor += chunk_size;
                trace!(cursor = pending.cursor, chunk_len, "chunk delivered");

                if chunk_len == 0 {
                    self.state = ServeState::Idle;
                    self.pending = None;
                    debug!("incremental delivery complete");
                    return Ok(ServeProgress::RoundComplete);
                }
                Ok(ServeProgress::Pending)
            }
        }
    }
}
