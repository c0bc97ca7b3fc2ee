//! swapmeet - command line client for the swapmeet barter marketplace.
//!
//! Browse listings, manage swap offers and bids, and watch the inbox from
//! the terminal. Credentials are kept in the OS keychain (or a session file)
//! and refreshed automatically when the access token expires.

mod commands;
mod format;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use swapmeet_core::models::ProductQuery;
use swapmeet_core::{ApiClient, Config, RefreshMode, SessionManager};

use commands::{BidAction, SwapAction};

/// Main CLI structure
#[derive(Parser)]
#[command(name = "swapmeet")]
#[command(about = "Trade things you have for things you want", long_about = None)]
#[command(version)]
struct Cli {
    /// API base URL (overrides SWAPMEET_API_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Log in and store credentials
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },
    /// Remove stored credentials
    Logout,
    /// Show the logged-in user and trust score
    Whoami,
    /// Browse and inspect listings
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage swap offers
    Swaps {
        #[command(subcommand)]
        command: SwapCommands,
    },
    /// Manage bids
    Bids {
        #[command(subcommand)]
        command: BidCommands,
    },
    /// Show suggested matches for your listings
    Suggested,
    /// List conversations
    Inbox {
        /// Keep polling the unread count every N seconds
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Send a message in a conversation
    Send {
        conversation: String,
        message: String,
    },
    /// Overview of listings, offers, and unread messages
    Dashboard,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// Search listings
    List {
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Category id
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        min_value: Option<String>,
        #[arg(long)]
        max_value: Option<String>,
        /// Only show listings still available
        #[arg(long)]
        available: bool,
    },
    /// Show one listing
    Show { id: String },
    /// Your own listings
    Mine,
    /// Listing categories
    Categories,
    /// Compatible listings for one of yours
    Matches { id: String },
}

#[derive(Subcommand)]
enum SwapCommands {
    List,
    Accept { id: String },
    Reject { id: String },
    Cancel { id: String },
    Complete { id: String },
}

#[derive(Subcommand)]
enum BidCommands {
    List,
    Accept { id: String },
    Reject { id: String },
    Withdraw { id: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    let base_url = match cli.api_url.as_deref() {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => config.resolve_base_url(),
    };
    debug!(base_url = %base_url, "Resolved API base URL");

    let session_ended = Arc::new(AtomicBool::new(false));
    let flag = session_ended.clone();
    let client = ApiClient::builder(&base_url, config.session_store()?)
        .refresh_mode(RefreshMode::SingleFlight)
        .on_unauthenticated(move || flag.store(true, Ordering::SeqCst))
        .build()?;
    let session = SessionManager::new(client.clone());

    let is_login = matches!(cli.command, Commands::Login { .. });
    let result = run(cli.command, &client, &session, &mut config).await;

    if session_ended.load(Ordering::SeqCst) && !is_login {
        eprintln!("Your session has expired. Run `swapmeet login` to sign in again.");
    }
    info!("swapmeet exiting");
    result
}

async fn run(
    command: Commands,
    client: &ApiClient,
    session: &SessionManager,
    config: &mut Config,
) -> Result<()> {
    match command {
        Commands::Login { email } => commands::login(session, config, email).await,
        Commands::Logout => commands::logout(session),
        Commands::Whoami => commands::whoami(session).await,
        Commands::Products { command } => match command {
            ProductCommands::List {
                search,
                category,
                condition,
                min_value,
                max_value,
                available,
            } => {
                let query = ProductQuery {
                    category,
                    condition,
                    min_value,
                    max_value,
                    search,
                    owner: None,
                    available: available.then_some(true),
                };
                commands::list_products(client, query).await
            }
            ProductCommands::Show { id } => commands::show_product(client, &id).await,
            ProductCommands::Mine => commands::my_products(client).await,
            ProductCommands::Categories => commands::categories(client).await,
            ProductCommands::Matches { id } => commands::matches(client, &id).await,
        },
        Commands::Swaps { command } => match command {
            SwapCommands::List => commands::list_swaps(client).await,
            SwapCommands::Accept { id } => commands::swap_action(client, &id, SwapAction::Accept).await,
            SwapCommands::Reject { id } => commands::swap_action(client, &id, SwapAction::Reject).await,
            SwapCommands::Cancel { id } => commands::swap_action(client, &id, SwapAction::Cancel).await,
            SwapCommands::Complete { id } => {
                commands::swap_action(client, &id, SwapAction::Complete).await
            }
        },
        Commands::Bids { command } => match command {
            BidCommands::List => commands::list_bids(client).await,
            BidCommands::Accept { id } => commands::bid_action(client, &id, BidAction::Accept).await,
            BidCommands::Reject { id } => commands::bid_action(client, &id, BidAction::Reject).await,
            BidCommands::Withdraw { id } => {
                commands::bid_action(client, &id, BidAction::Withdraw).await
            }
        },
        Commands::Suggested => commands::suggested(client).await,
        Commands::Inbox { watch } => commands::inbox(client, watch).await,
        Commands::Send {
            conversation,
            message,
        } => commands::send_message(client, &conversation, &message).await,
        Commands::Dashboard => commands::dashboard(client).await,
    }
}
