//! Operator tooling for the Studio Desk database
//!
//! The only way to create an admin account.

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studiodesk_core::Role;
use studiodesk_server::config::database_path;
use studiodesk_server::{accounts, DeskError, PasswordHasher, SqliteStore, UserStore};

#[derive(Parser)]
#[command(name = "studiodesk-admin")]
#[command(about = "Manage Studio Desk user accounts")]
struct Cli {
    /// SQLite database path (defaults to DATABASE_URL, then studiodesk.db)
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a pre-verified admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List all users
    ListUsers,
    /// Show one user's account state
    CheckUser {
        #[arg(long)]
        email: String,
    },
    /// Mark a user's email as verified
    VerifyEmail {
        #[arg(long)]
        email: String,
    },
    /// Delete a user; their tickets are kept without an owner
    DeleteUser {
        #[arg(long)]
        email: String,
    },
    /// Change a user's role (user or admin)
    SetRole {
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studiodesk_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let env_database = std::env::var("DATABASE_URL").ok();
    let path = database_path(cli.database.as_deref().or(env_database.as_deref()));
    let store = SqliteStore::open(&path)?;

    match cli.command {
        Command::CreateAdmin { email, password } => {
            let hasher = match std::env::var("BCRYPT_COST").ok().and_then(|c| c.parse().ok()) {
                Some(cost) => PasswordHasher::new(cost),
                None => PasswordHasher::default(),
            };
            match accounts::provision_admin(&store, &hasher, &email, &password, Utc::now()) {
                Ok(user) => println!("Created admin {} (id {})", user.email, user.id),
                Err(DeskError::DuplicateAccount) => {
                    println!("A user with email {} already exists; nothing changed", email)
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::ListUsers => {
            let users = store.list_users()?;
            if users.is_empty() {
                println!("No users");
            }
            for user in users {
                println!(
                    "{:>5}  {:<40}  {:<5}  {}",
                    user.id,
                    user.email,
                    user.role,
                    if user.email_verified { "verified" } else { "unverified" }
                );
            }
        }

        Command::CheckUser { email } => {
            let Some(user) = accounts::find_user_by_email(&store, &email)? else {
                bail!("No user with email {}", email);
            };
            println!("id:             {}", user.id);
            println!("email:          {}", user.email);
            println!("role:           {}", user.role);
            println!("email verified: {}", user.email_verified);
            println!(
                "pending verify: {}",
                user.verification_token_expires_at
                    .map(|at| format!("until {}", at))
                    .unwrap_or_else(|| "no".to_string())
            );
            println!(
                "pending reset:  {}",
                user.reset_token_expires_at
                    .map(|at| format!("until {}", at))
                    .unwrap_or_else(|| "no".to_string())
            );
            println!("created:        {}", user.created_at);
        }

        Command::VerifyEmail { email } => {
            let user = accounts::require_user(&store, &email)?;
            store.mark_verified(user.id)?;
            println!("Verified {}", user.email);
        }

        Command::DeleteUser { email } => {
            let user = accounts::require_user(&store, &email)?;
            store.delete_user(user.id)?;
            println!("Deleted {}", user.email);
        }

        Command::SetRole { email, role } => {
            let role: Role = role.parse()?;
            let user = accounts::require_user(&store, &email)?;
            store.set_role(user.id, role)?;
            println!("{} is now {}", user.email, role);
        }
    }

    Ok(())
}
