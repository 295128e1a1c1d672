//! `set-username`.

use anyhow::Result;
use chat_store::{Profile, StoreError};
use tracing::info;

use crate::commands::Context;

pub fn set_username(ctx: &mut Context<'_>, username: Option<String>) -> Result<()> {
    let session = ctx.require_login("set your username")?;
    let user_id = ctx.require_user_id(&session)?;
    let backend = ctx.connect()?;

    let existing = backend
        .store
        .fetch_profile(&user_id)
        .map_err(|error| ctx.fail(&format!("Operation failed: {error}")))?;

    let username = match username {
        Some(username) => username,
        None => ctx.ask("Enter your username")?,
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(ctx.fail("Username cannot be empty."));
    }

    let (result, verb) = if existing.is_some() {
        (backend.store.update_username(&user_id, &username), "updated")
    } else {
        let profile = Profile {
            id: user_id.clone(),
            username: Some(username.clone()),
        };
        (backend.store.create_profile(&profile), "set")
    };
    match result {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ctx.fail(&format!(
                "Username '{username}' is already taken. Please choose a different username."
            )));
        }
        Err(error) => return Err(ctx.fail(&format!("Failed to set username: {error}"))),
    }

    info!(%user_id, verb, "username saved");
    let style = ctx.style();
    ctx.success(&format!("Username {verb} to {}!", style.bold(&username)));
    Ok(())
}
