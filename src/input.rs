//! Line input loop that posts messages to the room.

use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chat_store::{CancelSignal, ChatStore, NewMessage, StoreError};
use tracing::{debug, warn};

use crate::output::ChatOutput;

pub struct InputReader {
    store: Arc<dyn ChatStore>,
    output: Arc<dyn ChatOutput>,
    room_id: String,
    user_id: String,
}

impl InputReader {
    #[must_use]
    pub fn new(
        store: Arc<dyn ChatStore>,
        output: Arc<dyn ChatOutput>,
        room_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            output,
            room_id: room_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn submit(&self, content: &str) -> Result<(), StoreError> {
        self.store.insert_message(&NewMessage {
            room_id: self.room_id.clone(),
            user_id: self.user_id.clone(),
            content: content.to_string(),
        })
    }

    /// Reads lines until end of input or cancellation and returns how many
    /// messages were sent.
    ///
    /// Blank lines are skipped. Bytes that are not UTF-8 are replaced with
    /// U+FFFD. A read error ends the loop like end of input. A failed send
    /// prints a warning and the loop continues.
    pub fn run<R: BufRead>(&self, mut input: R, cancel: &CancelSignal) -> usize {
        let mut sent = 0;
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match input.read_until(b'\n', &mut raw) {
                Ok(0) => {
                    debug!("input closed");
                    break;
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "failed to read input; treating as closed");
                    break;
                }
            }
            if cancel.load(Ordering::Acquire) {
                break;
            }

            let line = String::from_utf8_lossy(&raw);
            let content = strip_line_terminator(&line);
            if content.trim().is_empty() {
                continue;
            }
            match self.submit(content) {
                Ok(()) => sent += 1,
                Err(error) => {
                    warn!(%error, "failed to send message");
                    let style = self.output.style();
                    self.output
                        .write_line(&style.red(&format!("Failed to send message: {error}")));
                }
            }
        }
        sent
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
