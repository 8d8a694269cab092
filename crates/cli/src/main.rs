//! Logistik CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply schema migrations
//! logistik-cli migrate
//!
//! # Create the demo admin and user accounts if missing
//! logistik-cli seed
//!
//! # Create an account (password read from LOGISTIK_NEW_USER_PASSWORD)
//! LOGISTIK_NEW_USER_PASSWORD=... logistik-cli user create -u dispatcher -e dispatch@example.com -r admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed demo accounts
//! - `user create` - Create an account with any role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "logistik-cli")]
#[command(author, version, about = "Logistik CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create the demo admin and user accounts
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login name (3-80 characters)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin` or `user`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::demo_users().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                role,
            } => {
                commands::user::create(&username, &email, &role).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "logistik-cli",
            "user",
            "create",
            "-u",
            "dispatcher",
            "-e",
            "dispatch@logistik.com",
            "-r",
            "admin",
        ]);
        let Ok(Cli {
            command:
                Commands::User {
                    action: UserAction::Create { username, role, .. },
                },
        }) = cli
        else {
            panic!("expected user create");
        };
        assert_eq!(username, "dispatcher");
        assert_eq!(role, "admin");
    }

    #[test]
    fn test_role_defaults_to_user() {
        let cli = Cli::try_parse_from(["logistik-cli", "user", "create", "-u", "abc", "-e", "a@b.co"]);
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::User {
                    action: UserAction::Create { ref role, .. }
                }
            }) if role == "user"
        ));
    }
}
