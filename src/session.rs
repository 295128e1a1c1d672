//! One joined chat room: backfill, live polling and line input.

use std::io::BufRead;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chat_store::{CancelSignal, ChatStore, Room, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::colors::ColorAssigner;
use crate::feed::MessageFeed;
use crate::input::InputReader;
use crate::names::NameResolver;
use crate::output::ChatOutput;
use crate::poller::{Poller, Watermark, CANCEL_POLL_INTERVAL, DEFAULT_POLL_INTERVAL};
use crate::render::MessageRenderer;

/// Messages shown when joining a room.
pub const BACKFILL_LIMIT: usize = 20;
/// Default for [`SessionConfig::stop_timeout`].
pub const POLLER_STOP_TIMEOUT: Duration = Duration::from_millis(500);

const POLLER_THREAD_NAME: &str = "relay-poller";
const INPUT_THREAD_NAME: &str = "relay-input";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub room_name: String,
    pub user_id: String,
    pub poll_interval: Duration,
    pub backfill_limit: usize,
    /// Longest wait for the poller after the session ends.
    pub stop_timeout: Duration,
}

impl SessionConfig {
    #[must_use]
    pub fn new(room_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            user_id: user_id.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            backfill_limit: BACKFILL_LIMIT,
            stop_timeout: POLLER_STOP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_backfill_limit(mut self, backfill_limit: usize) -> Self {
        self.backfill_limit = backfill_limit;
        self
    }

    #[must_use]
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing user id; log in again")]
    MissingUserId,
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to spawn {thread} thread: {source}")]
    Spawn {
        thread: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Why a running session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    InputClosed,
    Interrupted,
    PollerStopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub room: Room,
    pub end: SessionEnd,
    pub watermark: Watermark,
}

/// A room after the join banner and backfill, before live polling starts.
pub struct JoinedRoom {
    pub room: Room,
    pub backfilled: usize,
    pub watermark: Watermark,
    pub feed: Arc<MessageFeed>,
}

enum WorkerEvent {
    InputClosed,
    PollerStopped,
}

/// Owns the per-session caches and wires the poller and input threads.
pub struct ChatSession {
    store: Arc<dyn ChatStore>,
    config: SessionConfig,
    output: Arc<dyn ChatOutput>,
    names: Arc<NameResolver>,
    renderer: Arc<MessageRenderer>,
}

impl ChatSession {
    #[must_use]
    pub fn new(
        store: Arc<dyn ChatStore>,
        config: SessionConfig,
        output: Arc<dyn ChatOutput>,
    ) -> Self {
        let names = Arc::new(NameResolver::new(Arc::clone(&store)));
        let colors = Arc::new(ColorAssigner::new());
        let renderer = Arc::new(MessageRenderer::new(
            Arc::clone(&output),
            Arc::clone(&names),
            colors,
        ));
        Self {
            store,
            config,
            output,
            names,
            renderer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn names(&self) -> &Arc<NameResolver> {
        &self.names
    }

    /// Resolves the room and prints the join banner plus recent history.
    pub fn join(&self) -> Result<JoinedRoom, SessionError> {
        if self.config.user_id.trim().is_empty() {
            return Err(SessionError::MissingUserId);
        }
        let room = self
            .store
            .find_room(&self.config.room_name)?
            .ok_or_else(|| SessionError::RoomNotFound(self.config.room_name.clone()))?;
        let feed = Arc::new(MessageFeed::new(Arc::clone(&self.store), room.id.clone()));
        let style = self.output.style();

        self.output.write_line("");
        self.output
            .write_line(&style.bold(&style.cyan(&format!("Joined room: {}", room.name))));
        self.output.write_line("");

        let rows = feed.recent(self.config.backfill_limit)?;
        self.names.preload(&rows);

        let mut watermark = Watermark::unset();
        if rows.is_empty() {
            self.output
                .write_line(&style.dim("No messages yet. Be the first to say something!"));
        } else {
            self.output.write_line(&style.dim("--- Recent messages ---"));
            for row in &rows {
                self.renderer.render_row(row);
                watermark.advance(&row.created_at);
            }
        }

        info!(room = %room.name, backfilled = rows.len(), "joined room");
        Ok(JoinedRoom {
            room,
            backfilled: rows.len(),
            watermark,
            feed,
        })
    }

    /// Joins the room and runs until input closes, the poller stops or
    /// `interrupt` is raised.
    ///
    /// The input thread is not joined: a reader blocked on stdin stays parked
    /// until the process exits.
    pub fn run<R>(&self, input: R, interrupt: &CancelSignal) -> Result<SessionReport, SessionError>
    where
        R: BufRead + Send + 'static,
    {
        let JoinedRoom {
            room,
            watermark,
            feed,
            ..
        } = self.join()?;

        if interrupt.load(Ordering::Acquire) {
            debug!("interrupted while joining; skipping live chat");
            self.print_left(&room);
            return Ok(SessionReport {
                room,
                end: SessionEnd::Interrupted,
                watermark,
            });
        }

        self.print_live_banner();

        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::channel();

        let poller = Poller::new(
            feed,
            Arc::clone(&self.names),
            Arc::clone(&self.renderer),
            watermark.clone(),
            self.config.poll_interval,
        );
        let poller_task = PollerTask::spawn(poller, Arc::clone(&cancel), events_tx.clone())
            .map_err(|source| SessionError::Spawn {
                thread: POLLER_THREAD_NAME,
                source,
            })?;

        let reader = InputReader::new(
            Arc::clone(&self.store),
            Arc::clone(&self.output),
            room.id.clone(),
            self.config.user_id.clone(),
        );
        if let Err(source) = spawn_input(reader, input, Arc::clone(&cancel), events_tx) {
            cancel.store(true, Ordering::Release);
            let _ = poller_task.stop(self.config.stop_timeout);
            return Err(SessionError::Spawn {
                thread: INPUT_THREAD_NAME,
                source,
            });
        }

        let end = wait_for_end(&events_rx, interrupt);
        cancel.store(true, Ordering::Release);

        let watermark = poller_task
            .stop(self.config.stop_timeout)
            .unwrap_or(watermark);

        self.print_left(&room);
        info!(room = %room.name, ?end, "left room");

        Ok(SessionReport {
            room,
            end,
            watermark,
        })
    }

    fn print_live_banner(&self) {
        let style = self.output.style();
        self.output.write_line("");
        self.output.write_line(&style.rule("Live Chat"));
        self.output.write_line("");
        self.output.write_line(&style.dim(
            "Type your message and press Enter to send. Press Ctrl+C to exit.",
        ));
        self.output.write_line("");
    }

    fn print_left(&self, room: &Room) {
        let style = self.output.style();
        self.output.write_line("");
        self.output
            .write_line(&style.dim(&format!("Left room: {}", room.name)));
    }
}

/// The running poller thread and the channel its final watermark arrives on.
struct PollerTask {
    handle: JoinHandle<()>,
    finished: mpsc::Receiver<Option<Watermark>>,
}

impl PollerTask {
    fn spawn(
        poller: Poller,
        cancel: CancelSignal,
        events: mpsc::Sender<WorkerEvent>,
    ) -> std::io::Result<Self> {
        let (finished_tx, finished) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(POLLER_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| poller.run(&cancel)));
                let watermark = match outcome {
                    Ok(watermark) => Some(watermark),
                    Err(_) => {
                        warn!("poller panicked");
                        None
                    }
                };
                let _ = finished_tx.send(watermark);
                let _ = events.send(WorkerEvent::PollerStopped);
            })?;
        Ok(Self { handle, finished })
    }

    /// Waits up to `timeout` for the cancelled poller to finish. A poller
    /// stuck in a store call is detached and `None` is returned.
    fn stop(self, timeout: Duration) -> Option<Watermark> {
        match self.finished.recv_timeout(timeout) {
            Ok(watermark) => {
                let _ = self.handle.join();
                watermark
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "poller did not stop in time; detaching it");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn spawn_input<R>(
    reader: InputReader,
    input: R,
    cancel: CancelSignal,
    events: mpsc::Sender<WorkerEvent>,
) -> std::io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name(INPUT_THREAD_NAME.to_string())
        .spawn(move || {
            match catch_unwind(AssertUnwindSafe(|| reader.run(input, &cancel))) {
                Ok(sent) => debug!(sent, "input reader finished"),
                Err(_) => warn!("input reader panicked"),
            }
            let _ = events.send(WorkerEvent::InputClosed);
        })
        .map(|_detached| ())
}

fn wait_for_end(events: &mpsc::Receiver<WorkerEvent>, interrupt: &CancelSignal) -> SessionEnd {
    loop {
        if interrupt.load(Ordering::Acquire) {
            debug!("interrupt received");
            return SessionEnd::Interrupted;
        }
        match events.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(WorkerEvent::InputClosed) => return SessionEnd::InputClosed,
            Ok(WorkerEvent::PollerStopped) | Err(RecvTimeoutError::Disconnected) => {
                return SessionEnd::PollerStopped
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}
