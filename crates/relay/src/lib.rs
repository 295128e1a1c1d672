//! The `relay` command line client.
//!
//! Account and room commands talk to Supabase through
//! [`chat_store_supabase::SupabaseStore`]; `join` hands the same connection to
//! a [`relay_chat::ChatSession`] reading stdin.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod prompt;

use std::io::{self, BufReader};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chat_store::CancelSignal;
use relay_chat::{ChatOutput, StdoutOutput};
use session_store::SessionStore;

use crate::backend::Backend;
use crate::cli::Commands;
use crate::commands::Context;
use crate::config::RelayConfig;
use crate::prompt::TerminalPrompter;

pub use crate::commands::Reported;

/// Runs one subcommand against the real terminal and backend.
pub fn run(command: Commands, config: &RelayConfig) -> Result<()> {
    let sessions = open_sessions(config)?;
    let output: Arc<dyn ChatOutput> = Arc::new(StdoutOutput::new());
    let mut prompter = TerminalPrompter;
    // Only `join` installs a handler that raises this flag.
    let interrupt: CancelSignal = Arc::new(AtomicBool::new(false));
    let mut ctx = Context::new(sessions, output, &mut prompter, |sessions| {
        Backend::connect(config, sessions, &interrupt)
    })
    .with_poll_interval(config.poll_interval);

    match command {
        Commands::Join { room } => {
            #[cfg(unix)]
            let _signals = relay_chat::install_interrupt_handler(Arc::clone(&interrupt))
                .context("failed to install interrupt handler")?;
            commands::join::join(&mut ctx, &room, BufReader::new(io::stdin()), &interrupt)
        }
        other => dispatch(&mut ctx, other),
    }
}

/// Runs one subcommand with the given context. `join` here gets no input:
/// it prints the recent history and leaves.
pub fn dispatch(ctx: &mut Context<'_>, command: Commands) -> Result<()> {
    match command {
        Commands::Register => commands::auth::register(ctx),
        Commands::Login => commands::auth::login(ctx),
        Commands::Logout => commands::auth::logout(ctx),
        Commands::SetUsername { username } => commands::profile::set_username(ctx, username),
        Commands::Rooms => commands::rooms::list(ctx),
        Commands::RoomsCreate { name } => commands::rooms::create(ctx, name),
        Commands::Join { room } => {
            let interrupt: CancelSignal = Arc::new(AtomicBool::new(false));
            commands::join::join(ctx, &room, io::empty(), &interrupt)
        }
    }
}

fn open_sessions(config: &RelayConfig) -> Result<SessionStore> {
    match &config.session_root {
        Some(root) => Ok(SessionStore::new(root)),
        None => SessionStore::open_default().context("failed to locate the session directory"),
    }
}
