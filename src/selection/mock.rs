//! Scripted in-memory port for tests.
//!
//! Records every protocol action, keeps a property table the way the X server
//! would, and hands out pre-scripted events from `wait_event`. The
//! [`run_exchange`] harness wires a [`SelectionServer`] and a
//! [`SelectionReader`] together through one shared property table, simulating
//! a full owner/requestor exchange without a display.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;

use crate::selection::error::{Result, SelectionError};
use crate::selection::port::{
    Atom, Atoms, PropertyProbe, PropertyValue, SelectionEvent, SelectionPort, Timestamp, Window,
    NONE,
};
use crate::selection::reader::{ReadProgress, SelectionReader};
use crate::selection::server::SelectionServer;

/// One recorded `write_property` action.
#[derive(Debug, Clone)]
pub(crate) struct WriteRecord {
    pub(crate) window: Window,
    pub(crate) property: Atom,
    pub(crate) type_atom: Atom,
    pub(crate) data: Vec<u8>,
}

/// One recorded `send_reply` action.
#[derive(Debug, Clone)]
pub(crate) struct ReplyRecord {
    pub(crate) requestor: Window,
    pub(crate) selection: Atom,
    pub(crate) target: Atom,
    pub(crate) property: Atom,
    pub(crate) time: Timestamp,
}

/// In-memory [`SelectionPort`] with scripted events and recorded actions.
pub(crate) struct MockPort {
    atoms: Atoms,
    window: Window,
    chunk: usize,
    properties: HashMap<(Window, Atom), PropertyValue>,
    /// scripted events handed out by `wait_event`
    pub(crate) events: VecDeque<SelectionEvent>,
    pub(crate) converts: Vec<(Atom, Atom, Atom)>,
    pub(crate) writes: Vec<WriteRecord>,
    pub(crate) atom_writes: Vec<(Window, Atom, Vec<Atom>)>,
    pub(crate) deletes: Vec<(Window, Atom)>,
    pub(crate) replies: Vec<ReplyRecord>,
    pub(crate) watched: Vec<Window>,
    pub(crate) owned: Vec<Atom>,
    pub(crate) flushes: usize,
}

impl MockPort {
    /// Port with the given chunk threshold and a fixed atom numbering.
    pub(crate) fn with_chunk(chunk: usize) -> Self {
        Self {
            atoms: Atoms {
                primary: 1,
                clipboard: 2,
                utf8_string: 3,
                string: 4,
                targets: 5,
                incr: 6,
                transfer: 7,
            },
            window: 100,
            chunk,
            properties: HashMap::new(),
            events: VecDeque::new(),
            converts: Vec::new(),
            writes: Vec::new(),
            atom_writes: Vec::new(),
            deletes: Vec::new(),
            replies: Vec::new(),
            watched: Vec::new(),
            owned: Vec::new(),
            flushes: 0,
        }
    }

    /// Place a property value, as the X server would after an owner's write.
    pub(crate) fn set_property(
        &mut self,
        window: Window,
        property: Atom,
        type_atom: Atom,
        data: &[u8],
    ) {
        self.properties.insert(
            (window, property),
            PropertyValue {
                type_atom,
                data: data.to_vec(),
            },
        );
    }

    /// Queue an event for `wait_event`.
    pub(crate) fn push_event(&mut self, event: SelectionEvent) {
        self.events.push_back(event);
    }
}

impl SelectionPort for MockPort {
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
        self.converts.push((selection, target, property));
        Ok(())
    }

    fn probe_property(&mut self, window: Window, property: Atom) -> Result<PropertyProbe> {
        let value = self.properties.get(&(window, property));
        Ok(PropertyProbe {
            type_atom: value.map_or(NONE, |v| v.type_atom),
            size: value.map_or(0, |v| v.data.len()),
        })
    }

    fn read_property(&mut self, window: Window, property: Atom) -> Result<PropertyValue> {
        Ok(self
            .properties
            .get(&(window, property))
            .cloned()
            .unwrap_or(PropertyValue {
                type_atom: NONE,
                data: Vec::new(),
            }))
    }

    fn delete_property(&mut self, window: Window, property: Atom) -> Result<()> {
        self.properties.remove(&(window, property));
        self.deletes.push((window, property));
        Ok(())
    }

    fn write_property(
        &mut self,
        window: Window,
        property: Atom,
        type_atom: Atom,
        data: &[u8],
    ) -> Result<()> {
        self.set_property(window, property, type_atom, data);
        self.writes.push(WriteRecord {
            window,
            property,
            type_atom,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn write_atom_list(&mut self, window: Window, property: Atom, atoms: &[Atom]) -> Result<()> {
        self.atom_writes.push((window, property, atoms.to_vec()));
        Ok(())
    }

    fn watch_properties(&mut self, window: Window) -> Result<()> {
        self.watched.push(window);
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
        self.replies.push(ReplyRecord {
            requestor,
            selection,
            target,
            property,
            time,
        });
        Ok(())
    }

    fn claim_ownership(&mut self, selection: Atom) -> Result<()> {
        self.owned.push(selection);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn wait_event(&mut self) -> Result<SelectionEvent> {
        // running out of scripted events means a loop failed to terminate
        // when the test expected it to
        self.events.pop_front().ok_or_else(|| {
            SelectionError::Connection(x11rb::errors::ConnectionError::UnknownError)
        })
    }

    fn atom_name(&mut self, atom: Atom) -> String {
        match atom {
            a if a == self.atoms.primary => "PRIMARY".into(),
            a if a == self.atoms.clipboard => "CLIPBOARD".into(),
            a if a == self.atoms.utf8_string => "UTF8_STRING".into(),
            a if a == self.atoms.string => "STRING".into(),
            a if a == self.atoms.targets => "TARGETS".into(),
            a if a == self.atoms.incr => "INCR".into(),
            a if a == self.atoms.transfer => "EXCLIP_DATA".into(),
            other => format!("atom #{other}"),
        }
    }
}

/// Drive a full server/reader exchange over one shared property table and
/// return what the reader captured.
///
/// The server's property writes land in the table the reader reads from; the
/// reader's deletions are relayed to the server as `PropertyDeleted` events,
/// exactly the feedback the X server would provide.
pub(crate) fn run_exchange(content: &[u8], chunk: usize) -> (Vec<u8>, MockPort) {
    let mut port = MockPort::with_chunk(chunk);
    let atoms = *port.atoms();
    let requestor = port.window();

    let mut server = SelectionServer::new(Bytes::copy_from_slice(content));
    let mut reader = SelectionReader::new(atoms.primary, atoms.utf8_string);

    // reader issues the conversion request
    assert_eq!(reader.step(&mut port, None).unwrap(), ReadProgress::Pending);
    let &(selection, target, property) = port.converts.last().unwrap();

    // the owner answers it
    server
        .step(
            &mut port,
            &SelectionEvent::Request {
                requestor,
                selection,
                target,
                property,
                time: 7,
            },
        )
        .unwrap();
    let reply = SelectionEvent::ConversionReply {
        property: Some(property),
    };
    let mut progress = reader.step(&mut port, Some(&reply)).unwrap();

    let mut relayed = 0;
    let mut steps = 0;
    while progress != ReadProgress::Complete {
        assert_ne!(progress, ReadProgress::Refused);

        // relay the reader's property deletions to the serving side
        while relayed < port.deletes.len() {
            let (window, property) = port.deletes[relayed];
            relayed += 1;
            server
                .step(&mut port, &SelectionEvent::PropertyDeleted { window, property })
                .unwrap();
        }

        let new_value = SelectionEvent::PropertyNewValue {
            window: requestor,
            property,
        };
        progress = reader.step(&mut port, Some(&new_value)).unwrap();

        steps += 1;
        assert!(steps < 100_000, "exchange did not converge");
    }

    (reader.into_buffer().as_slice().to_vec(), port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exchange_one_shot() {
        let (captured, port) = run_exchange(b"helloworld", 64);
        assert_eq!(captured, b"helloworld");
        // a single payload write, no INCR announcement
        assert_eq!(port.writes.len(), 1);
        assert_eq!(port.writes[0].type_atom, 3); // utf8_string
    }

    #[test]
    fn test_exchange_empty_content() {
        let (captured, port) = run_exchange(b"", 16);
        assert!(captured.is_empty());
        assert_eq!(port.writes.len(), 1);
    }

    #[test]
    fn test_exchange_incremental() {
        let content: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
        let (captured, port) = run_exchange(&content, 96);
        assert_eq!(captured, content);
        // INCR announcement, then ceil(1000/96) chunks, then the terminator
        assert_eq!(port.writes[0].type_atom, 6); // incr
        assert!(port.writes.last().unwrap().data.is_empty());
        assert_eq!(port.writes.len(), 1 + 11 + 1);
    }

    #[test]
    fn test_exchange_ten_times_threshold() {
        let chunk = 32;
        let content: Vec<u8> = (0u8..=255).cycle().take(10 * chunk).collect();
        let (captured, port) = run_exchange(&content, chunk);
        assert_eq!(captured, content);
        // both sides went incremental
        assert_eq!(port.writes[0].type_atom, 6);
    }

    proptest! {
        #[test]
        fn prop_exchange_reconstructs_content(
            content in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk in 1usize..96,
        ) {
            let (captured, _) = run_exchange(&content, chunk);
            prop_assert_eq!(captured, content);
        }
    }
}
