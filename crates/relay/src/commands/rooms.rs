//! `rooms` and `rooms-create`.

use std::collections::HashMap;

use anyhow::Result;
use chat_store::{ChatStore, Room, StoreError};
use relay_chat::{placeholder_name, Style};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::commands::Context;

pub const TABLE_TITLE: &str = "Chat Rooms";
const HEADERS: [&str; 3] = ["Name", "Created By", "Created At"];
const CREATED_AT_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const CREATED_AT_FALLBACK_CHARS: usize = 16;

pub fn list(ctx: &mut Context<'_>) -> Result<()> {
    ctx.require_login("view rooms")?;
    let backend = ctx.connect()?;

    let rooms = backend
        .store
        .list_rooms()
        .map_err(|error| ctx.fail(&format!("Failed to list rooms: {error}")))?;
    let style = ctx.style();
    if rooms.is_empty() {
        ctx.say(&style.dim("No rooms exist yet."));
        ctx.say(&format!("Create one with {}", style.bold("relay rooms-create")));
        return Ok(());
    }

    let mut creators = CreatorNames::new(backend.store.as_ref());
    let rows: Vec<[String; 3]> = rooms
        .iter()
        .map(|room| {
            [
                room.name.clone(),
                creators.name_for(room),
                format_created_at(room.created_at.as_deref().unwrap_or_default()),
            ]
        })
        .collect();

    for line in render_table(style, &rows) {
        ctx.say(&line);
    }
    Ok(())
}

pub fn create(ctx: &mut Context<'_>, name: Option<String>) -> Result<()> {
    let session = ctx.require_login("create rooms")?;
    let user_id = ctx.require_user_id(&session)?;

    let name = match name {
        Some(name) => name,
        None => ctx.ask("Room name")?,
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ctx.fail("Room name cannot be empty."));
    }

    let backend = ctx.connect()?;
    match backend.store.create_room(&name, &user_id) {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ctx.fail(&format!(
                "A room named '{name}' already exists. Please choose a different name."
            )));
        }
        Err(error) => return Err(ctx.fail(&format!("Failed to create room: {error}"))),
    }

    let style = ctx.style();
    ctx.success(&format!("Room {} created successfully!", style.bold(&name)));
    ctx.say(&format!(
        "Join it with {}",
        style.bold(&format!("relay join {name}"))
    ));
    Ok(())
}

/// `YYYY-MM-DD HH:MM` in the timestamp's own offset; the first sixteen
/// characters when it does not parse; `Unknown` when empty.
pub fn format_created_at(created_at: &str) -> String {
    let created_at = created_at.trim();
    if created_at.is_empty() {
        return "Unknown".to_string();
    }
    let normalized = created_at.replacen(' ', "T", 1);
    let formatted = OffsetDateTime::parse(&normalized, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&normalized, &Iso8601::DEFAULT))
        .ok()
        .and_then(|parsed| parsed.format(CREATED_AT_FORMAT).ok())
        .or_else(|| {
            PrimitiveDateTime::parse(&normalized, &Iso8601::DEFAULT)
                .ok()
                .and_then(|parsed| parsed.format(CREATED_AT_FORMAT).ok())
        });
    formatted.unwrap_or_else(|| created_at.chars().take(CREATED_AT_FALLBACK_CHARS).collect())
}

/// Title, header, separator and one line per row. Columns are padded by
/// display width before styling so ANSI codes never skew alignment.
pub fn render_table(style: Style, rows: &[[String; 3]]) -> Vec<String> {
    let mut widths = HEADERS.map(|header| header.width());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(style.bold(TABLE_TITLE));
    lines.push(join_cells(HEADERS.iter().zip(widths).map(|(header, width)| {
        style.bold(&pad(header, width))
    })));
    lines.push(join_cells(widths.iter().map(|width| "─".repeat(*width))));
    for [name, creator, created_at] in rows {
        lines.push(join_cells([
            style.cyan(&pad(name, widths[0])),
            style.green(&pad(creator, widths[1])),
            style.dim(&pad(created_at, widths[2])),
        ]));
    }
    lines
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(fill))
}

fn join_cells(cells: impl IntoIterator<Item = String>) -> String {
    cells
        .into_iter()
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Creator display names, one profile lookup per distinct creator.
struct CreatorNames<'s> {
    store: &'s dyn ChatStore,
    cache: HashMap<String, String>,
}

impl<'s> CreatorNames<'s> {
    fn new(store: &'s dyn ChatStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    fn name_for(&mut self, room: &Room) -> String {
        let Some(creator) = room.created_by.as_deref().filter(|id| !id.is_empty()) else {
            return "System".to_string();
        };
        if let Some(name) = self.cache.get(creator) {
            return name.clone();
        }
        let name = match self.store.fetch_profile(creator) {
            Ok(profile) => profile
                .and_then(|profile| profile.username)
                .filter(|username| !username.is_empty())
                .unwrap_or_else(|| placeholder_name(creator)),
            Err(error) => {
                debug!(creator, %error, "creator lookup failed");
                placeholder_name(creator)
            }
        };
        self.cache.insert(creator.to_string(), name.clone());
        name
    }
}
