//! Loopback session adapters.
//!
//! A dedicated server ultimately puts a network transport behind each
//! side's [`Connection`]; these adapters cover the headless cases: a
//! JSON-lines stream for piping the action feed to another process, and
//! a silent sink for verification runs that only care about the final
//! state.

use std::io::Write;

use serde::Serialize;
use skirmish_core::prelude::*;

/// Record written per delivered action, tagged with the receiving side.
#[derive(Debug, Serialize)]
struct ActionRecord<'a> {
    side: Side,
    action: &'a ActionKind,
}

/// A connection that re-encodes each delivered action as one JSON line.
///
/// The wire payload is bincode; this adapter decodes it and writes a
/// human-greppable `{"side":...,"action":...}` line to its writer. The
/// recipient selector is dropped on purpose: from a session's point of
/// view every delivered action is addressed to it.
pub struct JsonLinesConnection<W: Write + Send> {
    side: Side,
    writer: W,
}

impl<W: Write + Send> JsonLinesConnection<W> {
    /// Create an adapter for one side over any writer.
    pub fn new(side: Side, writer: W) -> Self {
        Self { side, writer }
    }
}

impl<W: Write + Send> Connection for JsonLinesConnection<W> {
    fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let action: Action =
            bincode::deserialize(payload).map_err(|e| SessionError::new(e.to_string()))?;
        let record = ActionRecord {
            side: self.side,
            action: &action.kind,
        };
        let line =
            serde_json::to_string(&record).map_err(|e| SessionError::new(e.to_string()))?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }
}

/// A connection that accepts and discards every payload.
pub struct SilentConnection;

impl Connection for SilentConnection {
    fn send(&mut self, _payload: &[u8]) -> Result<(), SessionError> {
        Ok(())
    }
}

/// A dispatcher that discards everything, for verification runs.
#[must_use]
pub fn silent_dispatcher() -> ActionDispatcher {
    ActionDispatcher::new(SessionRegistry::new(
        Box::new(SilentConnection),
        Box::new(SilentConnection),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_action_becomes_one_json_line() {
        let buf = SharedBuf::default();
        let mut conn = JsonLinesConnection::new(Side::Red, buf.clone());

        let action = Action::moved(3, Vec2::new(10.6, -2.4));
        let payload = bincode::serialize(&action).unwrap();
        conn.send(&payload).unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"side\":\"Red\""));
        assert!(text.contains("\"Move\""));
    }

    #[test]
    fn test_garbage_payload_is_a_session_error() {
        let mut conn = JsonLinesConnection::new(Side::Blue, Vec::new());
        assert!(conn.send(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_silent_connection_accepts_anything() {
        let mut conn = SilentConnection;
        assert!(conn.send(&[1, 2, 3]).is_ok());
    }
}
