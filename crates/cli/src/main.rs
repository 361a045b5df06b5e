//! Tripmart CLI - Database migrations, demo data and development tokens.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! tm-cli migrate
//!
//! # Load demo data into an empty database
//! tm-cli seed
//!
//! # Mint a bearer token for local testing
//! tm-cli token issue --role seller --subject 5 --ttl-hours 24
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert demo products, a tour guide, itineraries and a promo code
//! - `token issue` - Sign a bearer token with `TRIPMART_AUTH_SECRET`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(author, version, about = "Tripmart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed an empty database with demo data
    Seed,
    /// Work with bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a signed bearer token
    Issue {
        /// Caller role (`seller`, `tourist`, `tour_guide`, `admin`)
        #[arg(short, long)]
        role: String,

        /// Subject id the token speaks for
        #[arg(short, long)]
        subject: i32,

        /// Hours until the token expires
        #[arg(short, long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Token { action } => match action {
            TokenAction::Issue {
                role,
                subject,
                ttl_hours,
            } => {
                let token = commands::token::issue(&role, subject, ttl_hours)?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{token}");
                }
            }
        },
    }
    Ok(())
}
