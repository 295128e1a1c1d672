//! CLI argument definitions for the relay binary.

use clap::{Parser, Subcommand};

/// Terminal chat rooms backed by Supabase
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Relay: chat rooms in your terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create an account and log in
    Register,
    /// Log in with email and password
    Login,
    /// Log out and forget the local session
    Logout,
    /// Set or change your username
    SetUsername {
        /// New username (prompted when omitted)
        username: Option<String>,
    },
    /// List chat rooms
    Rooms,
    /// Create a chat room
    RoomsCreate {
        /// Room name (prompted when omitted)
        name: Option<String>,
    },
    /// Join a chat room
    Join {
        /// Name of the room to join
        room: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommands_use_kebab_case_names() {
        let cli = Cli::try_parse_from(["relay", "rooms-create", "general"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::RoomsCreate {
                name: Some("general".to_string())
            }
        );

        let cli = Cli::try_parse_from(["relay", "set-username"]).unwrap();
        assert_eq!(cli.command, Commands::SetUsername { username: None });
    }

    #[test]
    fn join_requires_a_room() {
        assert!(Cli::try_parse_from(["relay", "join"]).is_err());
        let cli = Cli::try_parse_from(["relay", "join", "general"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Join {
                room: "general".to_string()
            }
        );
    }
}
