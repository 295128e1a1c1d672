//! Periodic fetch of new room messages.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chat_store::{CancelSignal, StoreError};
use tracing::debug;

use crate::feed::MessageFeed;
use crate::names::NameResolver;
use crate::render::{parse_created_at, MessageRenderer};

/// Delay between the end of one poll cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Granularity at which sleeping loops observe cancellation.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// `created_at` of the newest rendered message; the exclusive lower bound of
/// the next fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark(Option<String>);

impl Watermark {
    #[must_use]
    pub fn unset() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn at(created_at: impl Into<String>) -> Self {
        Self(Some(created_at.into()))
    }

    #[must_use]
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// True when `created_at` lies strictly after the watermark. Timestamps
    /// are compared as instants; text order is used only when either side
    /// does not parse.
    #[must_use]
    pub fn admits(&self, created_at: &str) -> bool {
        self.0
            .as_deref()
            .is_none_or(|current| is_after(created_at, current))
    }

    /// Moves forward only; older or equal values are ignored.
    pub fn advance(&mut self, created_at: &str) {
        if self.admits(created_at) {
            self.0 = Some(created_at.to_string());
        }
    }
}

fn is_after(candidate: &str, current: &str) -> bool {
    match (parse_created_at(candidate), parse_created_at(current)) {
        (Some(candidate_at), Some(current_at)) => candidate_at > current_at,
        _ => candidate > current,
    }
}

pub struct Poller {
    feed: Arc<MessageFeed>,
    names: Arc<NameResolver>,
    renderer: Arc<MessageRenderer>,
    watermark: Watermark,
    interval: Duration,
}

impl Poller {
    #[must_use]
    pub fn new(
        feed: Arc<MessageFeed>,
        names: Arc<NameResolver>,
        renderer: Arc<MessageRenderer>,
        watermark: Watermark,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            names,
            renderer,
            watermark,
            interval,
        }
    }

    #[must_use]
    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// One fetch/resolve/render cycle. Returns the number of rendered rows.
    pub fn poll_once(&mut self) -> Result<usize, StoreError> {
        let rows = self.feed.since(self.watermark.get())?;
        self.names.preload(&rows);

        let mut rendered = 0;
        for row in rows {
            if !self.watermark.admits(&row.created_at) {
                continue;
            }
            self.renderer.render_row(&row);
            self.watermark.advance(&row.created_at);
            rendered += 1;
        }
        Ok(rendered)
    }

    /// Polls until `cancel` is set and returns the final watermark.
    ///
    /// Cycle failures are logged and skipped; the cadence is unchanged.
    pub fn run(mut self, cancel: &CancelSignal) -> Watermark {
        loop {
            if !sleep_or_cancel(self.interval, cancel) {
                break;
            }
            match self.poll_once() {
                Ok(0) => {}
                Ok(rendered) => debug!(rendered, "rendered new messages"),
                Err(error) => debug!(%error, "poll cycle failed"),
            }
        }
        self.watermark
    }
}

/// Sleeps for `duration` unless cancelled first. Returns `false` when
/// cancelled.
pub fn sleep_or_cancel(duration: Duration, cancel: &CancelSignal) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn watermark_only_moves_forward() {
        let mut watermark = Watermark::unset();
        assert!(watermark.admits("2024-01-15T09:00:00Z"));

        watermark.advance("2024-01-15T09:30:00Z");
        watermark.advance("2024-01-15T09:10:00Z");
        assert_eq!(watermark.get(), Some("2024-01-15T09:30:00Z"));
        assert!(!watermark.admits("2024-01-15T09:30:00Z"));
        assert!(watermark.admits("2024-01-15T09:30:01Z"));
    }

    #[test]
    fn watermark_compares_instants_across_formats() {
        let watermark = Watermark::at("2024-01-15T09:30:00Z");

        assert!(watermark.admits("2024-01-15T09:30:00.250+00:00"));
        assert!(watermark.admits("2024-01-15T08:45:00-01:00"));
        assert!(!watermark.admits("2024-01-15T10:30:00+01:00"));
        assert!(!watermark.admits("2024-01-15T09:29:59.999999Z"));
    }

    #[test]
    fn unparseable_timestamps_fall_back_to_text_order() {
        let watermark = Watermark::at("batch-0002");

        assert!(watermark.admits("batch-0003"));
        assert!(!watermark.admits("batch-0001"));
    }

    #[test]
    fn sleep_returns_early_when_cancelled() {
        let cancel: CancelSignal = Arc::new(AtomicBool::new(true));
        let started = Instant::now();

        assert!(!sleep_or_cancel(Duration::from_secs(5), &cancel));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_completes_when_not_cancelled() {
        let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
        assert!(sleep_or_cancel(Duration::from_millis(30), &cancel));
    }
}
