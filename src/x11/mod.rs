//! X11 Port
//!
//! The real [`SelectionPort`] over an X connection via x11rb. Each process
//! gets its own connection and a minimal invisible window that serves as the
//! request/owner endpoint; the connection is dropped (and the window with it)
//! on every exit path.

use tracing::{debug, trace};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ConnectionExt as _, CreateWindowAux, EventMask, PropMode,
    Property, SelectionNotifyEvent, WindowClass, SELECTION_NOTIFY_EVENT,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::selection::error::Result;
use crate::selection::port::{
    Atom, Atoms, PropertyProbe, PropertyValue, SelectionEvent, SelectionPort, Timestamp, Window,
};

x11rb::atom_manager! {
    /// Atoms with no core-protocol constant, interned in one round trip.
    AtomCollection:
    AtomCollectionCookie {
        CLIPBOARD,
        UTF8_STRING,
        TARGETS,
        INCR,
        EXCLIP_DATA,
    }
}

/// [`SelectionPort`] implementation over a live X connection.
pub struct X11Port {
    conn: RustConnection,
    window: Window,
    atoms: Atoms,
    chunk: usize,
}

impl X11Port {
    /// Connect to the display, create the endpoint window, and intern atoms.
    ///
    /// The window is a 1x1 unmapped surface subscribed to property-change
    /// notifications; conversion results are delivered onto it.
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display)?;
        let screen = &conn.setup().roots[screen_num];

        let window = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            screen.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;

        let interned = AtomCollection::new(&conn)?.reply()?;
        let atoms = Atoms {
            primary: u32::from(AtomEnum::PRIMARY),
            clipboard: interned.CLIPBOARD,
            utf8_string: interned.UTF8_STRING,
            string: u32::from(AtomEnum::STRING),
            targets: interned.TARGETS,
            incr: interned.INCR,
            transfer: interned.EXCLIP_DATA,
        };

        // Quarter of the advertised maximum request size, leaving headroom
        // for the request framing around each property write.
        let chunk = conn.maximum_request_bytes() / 4;
        conn.flush()?;

        debug!(window, chunk, "X endpoint ready");
        Ok(Self {
            conn,
            window,
            atoms,
            chunk,
        })
    }
}

impl SelectionPort for X11Port {
    fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn window(&self) -> Window {
        self.window
    }

    fn max_chunk_size(&self) -> usize {
        self.chunk
    }

    fn convert_selection(&mut self, selection: Atom, target: Atom, property: Atom) -> Result<()> {
        self.conn
            .convert_selection(self.window, selection, target, property, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn probe_property(&mut self, window: Window, property: Atom) -> Result<PropertyProbe> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, 0)?
            .reply()?;
        Ok(PropertyProbe {
            type_atom: reply.type_,
            size: reply.bytes_after as usize,
        })
    }

    fn read_property(&mut self, window: Window, property: Atom) -> Result<PropertyValue> {
        let probe = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, 0)?
            .reply()?;
        let reply = self
            .conn
            .get_property(
                false,
                window,
                property,
                AtomEnum::ANY,
                0,
                probe.bytes_after.div_ceil(4),
            )?
            .reply()?;
        Ok(PropertyValue {
            type_atom: reply.type_,
            data: reply.value,
        })
    }

    fn delete_property(&mut self, window: Window, property: Atom) -> Result<()> {
        self.conn.delete_property(window, property)?;
        Ok(())
    }

    fn write_property(
        &mut self,
        window: Window,
        property: Atom,
        type_atom: Atom,
        data: &[u8],
    ) -> Result<()> {
        self.conn
            .change_property8(PropMode::REPLACE, window, property, type_atom, data)?;
        Ok(())
    }

    fn write_atom_list(&mut self, window: Window, property: Atom, atoms: &[Atom]) -> Result<()> {
        self.conn
            .change_property32(PropMode::REPLACE, window, property, AtomEnum::ATOM, atoms)?;
        Ok(())
    }

    fn watch_properties(&mut self, window: Window) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        Ok(())
    }

    fn send_reply(
        &mut self,
        requestor: Window,
        selection: Atom,
        target: Atom,
        property: Atom,
        time: Timestamp,
    ) -> Result<()> {
        let notify = SelectionNotifyEvent {
            response_type: SELECTION_NOTIFY_EVENT,
            sequence: 0,
            time,
            requestor,
            selection,
            target,
            property,
        };
        self.conn
            .send_event(false, requestor, EventMask::NO_EVENT, notify)?;
        Ok(())
    }

    fn claim_ownership(&mut self, selection: Atom) -> Result<()> {
        self.conn
            .set_selection_owner(self.window, selection, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn wait_event(&mut self) -> Result<SelectionEvent> {
        loop {
            let event = self.conn.wait_for_event()?;
            trace!(?event, "X event");
            match event {
                Event::SelectionNotify(e) => {
                    return Ok(SelectionEvent::ConversionReply {
                        property: if e.property == x11rb::NONE {
                            None
                        } else {
                            Some(e.property)
                        },
                    });
                }
                Event::PropertyNotify(e) if e.state == Property::NEW_VALUE => {
                    return Ok(SelectionEvent::PropertyNewValue {
                        window: e.window,
                        property: e.atom,
                    });
                }
                Event::PropertyNotify(e) if e.state == Property::DELETE => {
                    return Ok(SelectionEvent::PropertyDeleted {
                        window: e.window,
                        property: e.atom,
                    });
                }
                Event::SelectionRequest(e) => {
                    return Ok(SelectionEvent::Request {
                        requestor: e.requestor,
                        selection: e.selection,
                        target: e.target,
                        property: e.property,
                        time: e.time,
                    });
                }
                Event::SelectionClear(e) => {
                    return Ok(SelectionEvent::OwnershipCleared {
                        selection: e.selection,
                    });
                }
                _ => continue,
            }
        }
    }

    fn atom_name(&mut self, atom: Atom) -> String {
        self.conn
            .get_atom_name(atom)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|reply| String::from_utf8_lossy(&reply.name).into_owned())
            .unwrap_or_else(|| format!("atom #{atom}"))
    }
}
