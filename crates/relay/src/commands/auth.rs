//! `register`, `login` and `logout`.

use anyhow::Result;
use chat_store::{Profile, StoreError};
use tracing::{info, warn};

use crate::backend::stored_session;
use crate::commands::Context;

pub fn register(ctx: &mut Context<'_>) -> Result<()> {
    let email = ctx.ask("Email")?;
    let password = ctx.ask_secret("Password")?;
    let confirmation = ctx.ask_secret("Confirm password")?;
    if password != confirmation {
        return Err(ctx.fail("Passwords do not match."));
    }
    let username = ctx.ask("Username")?.trim().to_string();
    if username.is_empty() {
        return Err(ctx.fail("Username cannot be empty."));
    }

    let backend = ctx.connect()?;
    let signed_up = backend.auth.sign_up(email.trim(), &password).map_err(|error| {
        if error.is_already_registered() {
            ctx.fail("An account with this email already exists.")
        } else {
            ctx.fail(&format!("Registration failed: {error}"))
        }
    })?;
    if signed_up.user_id().is_none() {
        return Err(ctx.fail("Registration failed. Please try again."));
    }

    let grant = backend
        .auth
        .sign_in(email.trim(), &password)
        .map_err(|_| ctx.fail("Account created but login failed. Please try 'relay login'"))?;
    let session = stored_session(&grant);
    ctx.save_session(&session)?;
    backend.auth.use_access_token(Some(grant.access_token.clone()));

    let profile = Profile {
        id: session.user_id.clone(),
        username: Some(username.clone()),
    };
    match backend.store.create_profile(&profile) {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ctx.fail(&format!(
                "Username '{username}' is already taken. Please choose a different username."
            )));
        }
        Err(error) => {
            let failure = ctx.fail(&format!("Failed to create profile: {error}"));
            ctx.notice(
                "Your account was created but without a profile. Use 'relay set-username' to fix this.",
            );
            return Err(failure);
        }
    }

    info!(user_id = %session.user_id, "registered");
    let style = ctx.style();
    ctx.success(&format!(
        "Successfully registered and logged in as {}!",
        style.bold(&username)
    ));
    Ok(())
}

pub fn login(ctx: &mut Context<'_>) -> Result<()> {
    let email = ctx.ask("Email")?;
    let password = ctx.ask_secret("Password")?;

    let backend = ctx.connect()?;
    let grant = backend
        .auth
        .sign_in(email.trim(), &password)
        .map_err(|error| {
            if error.is_invalid_credentials() {
                ctx.fail("Invalid email or password.")
            } else {
                ctx.fail(&format!("Login failed: {error}"))
            }
        })?;
    let session = stored_session(&grant);
    ctx.save_session(&session)?;
    backend.auth.use_access_token(Some(grant.access_token.clone()));

    let greeting = match backend.store.fetch_profile(&session.user_id) {
        Ok(Some(Profile {
            username: Some(username),
            ..
        })) if !username.is_empty() => username,
        _ => grant
            .user
            .email
            .clone()
            .unwrap_or_else(|| email.trim().to_string()),
    };

    info!(user_id = %session.user_id, "logged in");
    let style = ctx.style();
    ctx.success(&format!(
        "Successfully logged in as {}!",
        style.bold(&greeting)
    ));
    Ok(())
}

pub fn logout(ctx: &mut Context<'_>) -> Result<()> {
    let session = ctx.load_session()?;
    if !session.is_logged_in() {
        ctx.notice("You are not logged in.");
        return Ok(());
    }

    match ctx.try_connect() {
        Ok(backend) => {
            if let Err(error) = backend.auth.sign_out() {
                warn!(%error, "remote sign-out failed; clearing local session anyway");
            }
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "could not reach auth service; clearing local session anyway");
        }
    }

    ctx.sessions
        .clear()
        .map_err(|error| ctx.fail(&format!("Logout failed: {error}")))?;
    ctx.success("Successfully logged out.");
    Ok(())
}
