//! Kiosky CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! kiosky migrate
//!
//! # Create an admin (password read from KIOSKY_ADMIN_PASSWORD)
//! kiosky admin create -e admin@example.com -n "Admin Name"
//!
//! # Change a user's role
//! kiosky user set-role -e owner@example.com -r employee --store 3
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kiosky")]
#[command(author, version, about = "Kiosky CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change a user's role
    SetRole {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// New role (`admin`, `owner`, `employee`, `customer`)
        #[arg(short, long)]
        role: String,

        /// Store the user works at (required for `employee`)
        #[arg(long)]
        store: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name } => {
                commands::admin::create(&email, &name).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::SetRole { email, role, store } => {
                commands::user::set_role(&email, &role, store).await?;
            }
        },
    }
    Ok(())
}
