//! Command implementations for the swapmeet CLI.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use swapmeet_core::models::{Bid, ProductQuery, SwapRequest};
use swapmeet_core::{ApiClient, Config, SessionManager};

use crate::format::{format_date, format_optional, format_trust, format_value, truncate_string};

/// Width of the title column in listing tables
const TITLE_WIDTH: usize = 32;

/// Shortest allowed inbox polling interval
const MIN_POLL_SECS: u64 = 5;

pub async fn login(session: &SessionManager, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let user = session
        .login(&email, &password)
        .await
        .context("Login failed")?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {} ({})", user.display_name(), format_trust(&user));
    Ok(())
}

pub fn logout(session: &SessionManager) -> Result<()> {
    session.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(session: &SessionManager) -> Result<()> {
    match session.restore().await? {
        Some(user) => {
            println!("{} <{}>", user.display_name(), format_optional(&user.email, "no email"));
            println!("  {}", format_trust(&user));
            if let Some(location) = user.location.as_deref() {
                println!("  {}", location);
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn list_products(client: &ApiClient, query: ProductQuery) -> Result<()> {
    let products = client.list_products(&query).await?;
    if products.is_empty() {
        println!("No listings found");
        return Ok(());
    }
    for product in &products {
        println!(
            "{:<36}  {:<width$}  {:>10}  {}",
            product.id,
            truncate_string(&product.title, TITLE_WIDTH),
            format_value(product.estimated_value.as_deref()),
            format_optional(&product.condition, "-"),
            width = TITLE_WIDTH,
        );
    }
    Ok(())
}

pub async fn my_products(client: &ApiClient) -> Result<()> {
    let products = client.my_products().await?;
    for product in &products {
        let availability = if product.is_available { "available" } else { "traded" };
        println!(
            "{:<36}  {:<width$}  {:>10}  {}",
            product.id,
            truncate_string(&product.title, TITLE_WIDTH),
            format_value(product.estimated_value.as_deref()),
            availability,
            width = TITLE_WIDTH,
        );
    }
    Ok(())
}

pub async fn show_product(client: &ApiClient, id: &str) -> Result<()> {
    let detail = client.get_product(id).await?;
    let product = &detail.product;
    println!("{}", product.title);
    println!("  Value:     {}", format_value(product.estimated_value.as_deref()));
    println!("  Condition: {}", format_optional(&product.condition, "-"));
    if let Some(category) = &product.category {
        println!("  Category:  {}", category.name);
    }
    println!("  Location:  {}", format_optional(&product.location, "-"));
    println!("  Listed:    {}", format_date(product.created_at.as_ref()));
    if let Some(owner) = &product.owner {
        println!("  Owner:     {} ({})", owner.display_name(), format_trust(owner));
    }
    println!("  Media:     {} file(s)", detail.images.len());
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    Ok(())
}

pub async fn categories(client: &ApiClient) -> Result<()> {
    for category in client.categories().await? {
        println!("{:<36}  {:<24}  {}", category.id, category.name, category.product_count);
    }
    Ok(())
}

pub async fn matches(client: &ApiClient, id: &str) -> Result<()> {
    let result = client.product_matches(id).await?;
    println!("Matches for {} ({} total)", result.product.title, result.total_matches);
    for m in &result.matches {
        println!(
            "  {:>5.1}  {:<width$}  {}",
            m.compatibility_score,
            truncate_string(&m.product.title, TITLE_WIDTH),
            format_value(m.product.estimated_value.as_deref()),
            width = TITLE_WIDTH,
        );
    }
    Ok(())
}

pub async fn suggested(client: &ApiClient) -> Result<()> {
    let suggested = client.suggested_matches().await?;
    if suggested.matches.is_empty() {
        println!("{}", suggested.message.as_deref().unwrap_or("No suggestions yet"));
        return Ok(());
    }
    for m in &suggested.matches {
        println!(
            "  {:>5.1}  {} <-> {}",
            m.compatibility_score,
            truncate_string(&m.your_product.title, TITLE_WIDTH),
            truncate_string(&m.matched_product.title, TITLE_WIDTH),
        );
    }
    Ok(())
}

fn print_swap(swap: &SwapRequest) {
    let title = |p: &Option<swapmeet_core::models::Product>| {
        p.as_ref()
            .map(|p| truncate_string(&p.title, TITLE_WIDTH))
            .unwrap_or_else(|| "?".to_string())
    };
    println!(
        "{:<36}  {:<10}  {} -> {}  {}",
        swap.id,
        swap.status,
        title(&swap.sender_product),
        title(&swap.receiver_product),
        format_value(swap.cash_adjustment.as_deref()),
    );
}

pub async fn list_swaps(client: &ApiClient) -> Result<()> {
    for swap in client.list_swaps().await? {
        print_swap(&swap);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum SwapAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

pub async fn swap_action(client: &ApiClient, id: &str, action: SwapAction) -> Result<()> {
    let swap = match action {
        SwapAction::Accept => client.accept_swap(id).await?,
        SwapAction::Reject => client.reject_swap(id).await?,
        SwapAction::Cancel => client.cancel_swap(id).await?,
        SwapAction::Complete => client.complete_swap(id).await?,
    };
    print_swap(&swap);
    Ok(())
}

fn print_bid(bid: &Bid) {
    let product = bid
        .product
        .as_ref()
        .map(|p| truncate_string(&p.title, TITLE_WIDTH))
        .unwrap_or_else(|| "?".to_string());
    println!(
        "{:<36}  {:<10}  {}  {}",
        bid.id,
        bid.status,
        product,
        format_value(bid.cash_offer.as_deref()),
    );
}

pub async fn list_bids(client: &ApiClient) -> Result<()> {
    for bid in client.list_bids().await? {
        print_bid(&bid);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum BidAction {
    Accept,
    Reject,
    Withdraw,
}

pub async fn bid_action(client: &ApiClient, id: &str, action: BidAction) -> Result<()> {
    let bid = match action {
        BidAction::Accept => client.accept_bid(id).await?,
        BidAction::Reject => client.reject_bid(id).await?,
        BidAction::Withdraw => client.withdraw_bid(id).await?,
    };
    print_bid(&bid);
    Ok(())
}

pub async fn inbox(client: &ApiClient, watch: Option<u64>) -> Result<()> {
    let conversations = client.list_conversations().await?;
    for conv in &conversations {
        let preview = conv
            .last_message
            .as_ref()
            .map(|m| truncate_string(&m.content, 48))
            .unwrap_or_default();
        let star = if conv.is_starred() { "*" } else { " " };
        println!("{} {:<36}  {:>3} unread  {}", star, conv.id, conv.unread_count, preview);
    }

    let Some(secs) = watch else {
        return Ok(());
    };
    let period = Duration::from_secs(secs.max(MIN_POLL_SECS));
    info!(interval_secs = period.as_secs(), "Watching inbox");
    println!("Watching for new messages every {}s (Ctrl-C to stop)", period.as_secs());

    let mut ticker = tokio::time::interval(period);
    let mut last: Option<u32> = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let unread = client.unread_count().await?.unread_count;
                debug!(unread, "Polled unread count");
                if last != Some(unread) {
                    println!("[{}] {} unread message(s)", chrono::Local::now().format("%H:%M:%S"), unread);
                    last = Some(unread);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

pub async fn send_message(client: &ApiClient, conversation: &str, content: &str) -> Result<()> {
    let message = client.send_message(conversation, content).await?;
    println!("Sent ({})", format_date(message.created_at.as_ref()));
    Ok(())
}

/// Fetch the main overview concurrently and print whatever succeeded
pub async fn dashboard(client: &ApiClient) -> Result<()> {
    let (products, swaps, bids, unread) = futures::join!(
        client.my_products(),
        client.list_swaps(),
        client.list_bids(),
        client.unread_count(),
    );

    let mut failures = 0;
    match products {
        Ok(products) => println!("Listings:        {}", products.len()),
        Err(e) => {
            failures += 1;
            warn!(error = %e, "Failed to fetch listings");
        }
    }
    match swaps {
        Ok(swaps) => {
            let pending = swaps.iter().filter(|s| s.status == "pending").count();
            println!("Swaps:           {} ({} pending)", swaps.len(), pending);
        }
        Err(e) => {
            failures += 1;
            warn!(error = %e, "Failed to fetch swaps");
        }
    }
    match bids {
        Ok(bids) => println!("Bids:            {}", bids.len()),
        Err(e) => {
            failures += 1;
            warn!(error = %e, "Failed to fetch bids");
        }
    }
    match unread {
        Ok(unread) => println!("Unread messages: {}", unread.unread_count),
        Err(e) => {
            failures += 1;
            warn!(error = %e, "Failed to fetch unread count");
        }
    }

    if failures == 4 {
        anyhow::bail!("Could not load dashboard");
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("No value entered");
    }
    Ok(value)
}
