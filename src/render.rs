//! Chat line formatting.

use std::sync::Arc;

use chat_store::MessageRow;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::colors::ColorAssigner;
use crate::names::NameResolver;
use crate::output::ChatOutput;

/// Rendered in place of a timestamp that does not parse.
pub const UNKNOWN_TIME: &str = "--:--";

/// `HH:MM` in the timestamp's own offset.
///
/// Accepts RFC3339 (`Z` or numeric offset, optional fractional seconds) and
/// offset-less ISO-8601 date-times, with either `T` or a space separator.
#[must_use]
pub fn format_timestamp(created_at: &str) -> String {
    parse_clock(created_at.trim())
        .map(|(hour, minute)| format!("{hour:02}:{minute:02}"))
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}

fn parse_clock(value: &str) -> Option<(u8, u8)> {
    parse_created_at(value).map(|parsed| (parsed.hour(), parsed.minute()))
}

/// Parses a store timestamp. Offset-less values keep their wall clock and
/// are read as UTC.
#[must_use]
pub fn parse_created_at(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let normalized = value.replacen(' ', "T", 1);

    OffsetDateTime::parse(&normalized, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&normalized, &Iso8601::DEFAULT))
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(&normalized, &Iso8601::DEFAULT)
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
}

/// Writes one chat message per line: `[HH:MM]  username  content`.
pub struct MessageRenderer {
    output: Arc<dyn ChatOutput>,
    names: Arc<NameResolver>,
    colors: Arc<ColorAssigner>,
}

impl MessageRenderer {
    #[must_use]
    pub fn new(
        output: Arc<dyn ChatOutput>,
        names: Arc<NameResolver>,
        colors: Arc<ColorAssigner>,
    ) -> Self {
        Self {
            output,
            names,
            colors,
        }
    }

    #[must_use]
    pub fn format_line(&self, username: &str, content: &str, created_at: &str) -> String {
        let style = self.output.style();
        let timestamp = format!("[{}]", format_timestamp(created_at));
        let color = self.colors.color_for(username);
        format!(
            "{}  {}  {content}",
            style.dim(&timestamp),
            style.username(color, username)
        )
    }

    pub fn render(&self, username: &str, content: &str, created_at: &str) {
        self.output
            .write_line(&self.format_line(username, content, created_at));
    }

    /// Resolves the author and renders one fetched row.
    pub fn render_row(&self, row: &MessageRow) {
        let username = self.names.display_name_for(row);
        self.render(&username, &row.content, &row.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_timestamps_render_hours_and_minutes() {
        assert_eq!(format_timestamp("2024-01-15T09:30:00Z"), "09:30");
    }

    #[test]
    fn numeric_offsets_keep_their_local_clock() {
        assert_eq!(format_timestamp("2024-01-15T09:30:00.123456+00:00"), "09:30");
        assert_eq!(format_timestamp("2024-01-15T23:05:59-07:00"), "23:05");
    }

    #[test]
    fn offset_less_timestamps_are_accepted() {
        assert_eq!(format_timestamp("2024-01-15T18:45:12.5"), "18:45");
        assert_eq!(format_timestamp("2024-01-15 07:01:00"), "07:01");
    }

    #[test]
    fn garbage_renders_placeholder() {
        assert_eq!(format_timestamp("not-a-date"), UNKNOWN_TIME);
        assert_eq!(format_timestamp(""), UNKNOWN_TIME);
    }
}
