//! WinnieCho CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! wc-cli migrate
//!
//! # Seed catalog demo data
//! wc-cli seed
//!
//! # Create a staff account
//! wc-cli staff create -e driver@winniecho.test -n "Delivery Driver" -r driver
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wc-cli")]
#[command(author, version, about = "WinnieCho CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with demo categories and products
    Seed,
    /// Add stock to a product (reactivates it when out of stock)
    Restock {
        /// Product ID
        #[arg(short, long)]
        product_id: i32,

        /// Units to add
        #[arg(short, long)]
        quantity: i32,
    },
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a new staff account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin` or `driver`)
        #[arg(short, long, default_value = "driver")]
        role: String,

        /// Password (prompted for interactively in real deployments;
        /// accepted as a flag here for scripting)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Restock {
            product_id,
            quantity,
        } => commands::restock::run(product_id, quantity).await?,
        Commands::Staff { action } => match action {
            StaffAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::staff::create(&email, &name, &role, &password).await?;
            }
        },
    }
    Ok(())
}
