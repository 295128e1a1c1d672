//! Live terminal chat over a polled message store.
//!
//! A [`ChatSession`] joins one room, prints the recent history and then runs
//! two threads until input closes or the process is interrupted:
//! - the [`Poller`] fetches messages newer than its [`Watermark`] every few
//!   seconds and renders them;
//! - the [`InputReader`] posts each non-blank line of input to the room.
//!
//! Both threads write through one [`ChatOutput`], one whole line at a time.
//! The store itself is abstract ([`chat_store::ChatStore`]).

pub mod colors;
pub mod feed;
pub mod input;
pub mod names;
pub mod output;
pub mod poller;
pub mod render;
pub mod session;
#[cfg(unix)]
pub mod signal;
pub mod style;

pub use crate::colors::{ColorAssigner, UsernameColor};
pub use crate::feed::MessageFeed;
pub use crate::input::InputReader;
pub use crate::names::{placeholder_name, NameResolver, UNKNOWN_USER};
pub use crate::output::{ChatOutput, RecordingOutput, StdoutOutput};
pub use crate::poller::{
    sleep_or_cancel, Poller, Watermark, CANCEL_POLL_INTERVAL, DEFAULT_POLL_INTERVAL,
};
pub use crate::render::{format_timestamp, parse_created_at, MessageRenderer, UNKNOWN_TIME};
pub use crate::session::{
    ChatSession, JoinedRoom, SessionConfig, SessionEnd, SessionError, SessionReport,
    BACKFILL_LIMIT, POLLER_STOP_TIMEOUT,
};
#[cfg(unix)]
pub use crate::signal::{install_interrupt_handler, InterruptGuard};
pub use crate::style::Style;
