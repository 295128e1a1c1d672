#![allow(dead_code)]

use std::io::{self, BufReader, Read};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chat_store::{CancelSignal, ChatStore};
use chat_store_mock::MemoryStore;
use relay_chat::{ChatOutput, RecordingOutput};

pub const ALICE: &str = "a11ce000-0000-4000-8000-000000000001";
pub const BOB: &str = "b0b00000-0000-4000-8000-000000000002";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub output: Arc<RecordingOutput>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            output: Arc::new(RecordingOutput::new()),
        }
    }

    pub fn store(&self) -> Arc<dyn ChatStore> {
        Arc::clone(&self.store) as Arc<dyn ChatStore>
    }

    pub fn output(&self) -> Arc<dyn ChatOutput> {
        Arc::clone(&self.output) as Arc<dyn ChatOutput>
    }
}

pub fn cancel_signal() -> CancelSignal {
    Arc::new(AtomicBool::new(false))
}

/// Stdin stand-in fed line by line from the test; closing the sender is EOF.
pub struct ChannelInput {
    lines: Receiver<String>,
    pending: Vec<u8>,
}

impl Read for ChannelInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.lines.recv() {
                Ok(line) => self.pending = line.into_bytes(),
                Err(_) => return Ok(0),
            }
        }
        let len = buf.len().min(self.pending.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        Ok(len)
    }
}

pub fn channel_input() -> (Sender<String>, BufReader<ChannelInput>) {
    let (tx, rx) = mpsc::channel();
    let input = ChannelInput {
        lines: rx,
        pending: Vec::new(),
    };
    (tx, BufReader::new(input))
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
