//! `join`: the live chat session.

use std::io::BufRead;

use anyhow::Result;
use chat_store::CancelSignal;
use relay_chat::{ChatSession, SessionConfig, SessionError};
use tracing::debug;

use crate::commands::Context;

pub fn join<R>(ctx: &mut Context<'_>, room: &str, input: R, interrupt: &CancelSignal) -> Result<()>
where
    R: BufRead + Send + 'static,
{
    let session = ctx.require_login("join rooms")?;
    let user_id = ctx.require_user_id(&session)?;
    let backend = ctx.connect()?;

    let config = SessionConfig::new(room, user_id).with_poll_interval(ctx.poll_interval);
    let chat = ChatSession::new(backend.store, config, ctx.output.clone());
    match chat.run(input, interrupt) {
        Ok(report) => {
            debug!(end = ?report.end, "chat session finished");
            Ok(())
        }
        Err(SessionError::RoomNotFound(name)) => {
            let failure = ctx.fail(&format!("Room '{name}' not found."));
            let style = ctx.style();
            ctx.say(&format!(
                "Run {} to see available rooms.",
                style.bold("relay rooms")
            ));
            Err(failure)
        }
        Err(SessionError::MissingUserId) => Err(ctx.fail("Session error. Please log in again.")),
        Err(error) => Err(ctx.fail(&format!("Failed to join room: {error}"))),
    }
}
