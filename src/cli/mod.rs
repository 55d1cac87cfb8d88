use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod init;
pub mod serve;
pub mod user;
pub mod vapid;

use crate::core::AppConfig;
use crate::directory::Role;

#[derive(Subcommand)]
enum Command {
    /// Create the database schema
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Add a user to the role directory or change their role
    User {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        role: Role,
    },
    /// Generate a VAPID key pair for signing push messages
    Vapid {
        /// Contact URI sent to push services
        #[arg(long, default_value = "mailto:admin@example.com")]
        subject: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::from_env();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::User { id, role }) => {
            user::run(&config.db_path, &id, role).await?;
        }
        Some(Command::Vapid { subject }) => {
            vapid::run(&subject);
        }
        None => {}
    }

    Ok(())
}
