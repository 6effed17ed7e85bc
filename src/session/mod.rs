//! Session Orchestration
//!
//! Drives the two state machines to completion: one reader pass against
//! PRIMARY (with a single legacy-encoding retry), then one forked holder
//! process per target register, each claiming ownership and serving until it
//! is revoked.
//!
//! Each holder child opens its own X connection; the two registers share no
//! state beyond the immutable captured content, so one holder dying cannot
//! affect the other.

use anyhow::Context;
use bytes::Bytes;
use nix::unistd::{fork, ForkResult};
use tracing::{debug, error};

use crate::selection::error::{Result, SelectionError};
use crate::selection::port::{Atom, Atoms, SelectionEvent, SelectionPort};
use crate::selection::reader::{ReadProgress, SelectionReader};
use crate::selection::server::{SelectionServer, ServeProgress};
use crate::x11::X11Port;

/// A selection register this tool can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// The PRIMARY selection
    Primary,
    /// The CLIPBOARD selection
    Clipboard,
}

impl Register {
    /// Resolve the register to its atom on this connection.
    pub fn atom(self, atoms: &Atoms) -> Atom {
        match self {
            Register::Primary => atoms.primary,
            Register::Clipboard => atoms.clipboard,
        }
    }

    /// Register name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Register::Primary => "PRIMARY",
            Register::Clipboard => "CLIPBOARD",
        }
    }
}

/// Pull the current content of `selection` from its owner.
///
/// Asks for UTF8_STRING first; if the owner declines, retries exactly once
/// with the legacy STRING encoding, then reports failure naming the encoding
/// that was unavailable.
pub fn capture<P: SelectionPort + ?Sized>(port: &mut P, selection: Atom) -> Result<Bytes> {
    let atoms = *port.atoms();
    let mut reader = SelectionReader::new(selection, atoms.utf8_string);
    let mut fell_back = false;

    // kick off the conversion request
    let mut progress = reader.step(port, None)?;
    loop {
        match progress {
            ReadProgress::Complete => return Ok(reader.into_buffer().into_bytes()),
            ReadProgress::Refused => {
                if fell_back {
                    let name = port.atom_name(reader.target());
                    return Err(SelectionError::TargetUnavailable(name));
                }
                debug!("owner declined UTF8_STRING, retrying with STRING");
                fell_back = true;
                reader.retry_with(atoms.string);
                progress = reader.step(port, None)?;
            }
            ReadProgress::Pending => {
                let event = port.wait_event()?;
                progress = reader.step(port, Some(&event))?;
            }
        }
    }
}

/// Claim ownership of `selection` and serve `content` until revoked.
///
/// The loop ends only once ownership has been cleared *and* no transfer is in
/// flight *and* at least one service round has completed, so a requestor that
/// arrived concurrently with the clear notification still gets its data.
pub fn hold<P: SelectionPort + ?Sized>(
    port: &mut P,
    selection: Atom,
    content: Bytes,
) -> Result<()> {
    port.claim_ownership(selection)?;
    port.flush()?;

    let mut server = SelectionServer::new(content);
    let mut cleared = false;
    let mut rounds = 0usize;

    loop {
        let event = port.wait_event()?;
        if matches!(&event, SelectionEvent::OwnershipCleared { selection: s } if *s == selection) {
            debug!("ownership cleared");
            cleared = true;
        }
        if server.step(port, &event)? == ServeProgress::RoundComplete {
            rounds += 1;
        }
        if cleared && rounds >= 1 && server.is_idle() {
            debug!(rounds, "holder done");
            return Ok(());
        }
    }
}

/// Fork a holder process for `register` serving `content`.
///
/// The parent returns immediately; the child opens a fresh display
/// connection, claims the register, serves until ownership is revoked, and
/// exits without returning.
#[allow(unsafe_code)]
pub fn spawn_holder(
    display: Option<&str>,
    register: Register,
    content: Bytes,
) -> anyhow::Result<()> {
    match unsafe { fork() }.context("fork failed")? {
        ForkResult::Parent { child } => {
            debug!(register = register.name(), pid = %child, "spawned selection holder");
            Ok(())
        }
        ForkResult::Child => {
            let code = match hold_register(display, register, content) {
                Ok(()) => 0,
                Err(e) => {
                    error!(register = register.name(), error = %e, "holder failed");
                    1
                }
            };
            std::process::exit(code);
        }
    }
}

fn hold_register(display: Option<&str>, register: Register, content: Bytes) -> Result<()> {
    let mut port = X11Port::connect(display)?;
    let selection = register.atom(port.atoms());
    hold(&mut port, selection, content)
}
