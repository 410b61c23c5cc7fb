//! Operator console toggles

use std::{
    io::{self, BufReader, Read},
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use log::{info, warn};

use super::{EventOrigin, EventSource, EventSourceError, ToggleEvent};

/// Every byte typed on the console, apart from line endings, is a toggle.
///
/// The blocking reads happen on a background thread, polling only ever
/// checks a channel.
pub struct StdinEventSource {
    rx: Receiver<u8>,
    pending: Option<u8>,
}

impl StdinEventSource {
    /// Read toggles from the process's standard input.
    pub fn new() -> Result<Self, EventSourceError> {
        Self::from_reader(io::stdin())
    }

    /// Read toggles from any byte stream.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Result<Self, EventSourceError> {
        let (tx, rx) = mpsc::channel();

        // The thread is never joined, it ends when the stream closes or the
        // source is dropped
        thread::Builder::new()
            .name("console_reader".into())
            .spawn(move || {
                for byte in BufReader::new(reader).bytes() {
                    match byte {
                        Ok(b'\n') | Ok(b'\r') => continue,
                        Ok(b) => {
                            if tx.send(b).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Error reading the console: {}", e);
                            break;
                        }
                    }
                }
            })
            .map_err(EventSourceError::ReaderSpawnError)?;

        Ok(Self { rx, pending: None })
    }

    fn poll(&mut self) {
        if self.pending.is_none() {
            match self.rx.try_recv() {
                Ok(b) => self.pending = Some(b),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => (),
            }
        }
    }
}

impl EventSource for StdinEventSource {
    fn has_event(&mut self) -> bool {
        self.poll();
        self.pending.is_some()
    }

    fn consume_event(&mut self) -> Option<ToggleEvent> {
        self.poll();

        self.pending.take().map(|b| {
            info!("User inserted: {}", b as char);
            ToggleEvent::now(EventOrigin::Console(b))
        })
    }
}
