//! Swap offers, counter-offers, and bids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Product, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterOffer {
    pub id: String,
    #[serde(default)]
    pub sender: Option<User>,
    #[serde(default)]
    pub sender_product: Option<Product>,
    #[serde(default)]
    pub cash_adjustment: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A swap request. `status` is owned by the server's swap workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: String,
    #[serde(default)]
    pub sender: Option<User>,
    #[serde(default)]
    pub receiver: Option<User>,
    #[serde(default)]
    pub sender_product: Option<Product>,
    #[serde(default)]
    pub receiver_product: Option<Product>,
    #[serde(default)]
    pub cash_adjustment: Option<String>,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub counter_offers: Vec<CounterOffer>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSwap {
    /// Receiving user id
    pub receiver: String,
    pub sender_product: String,
    pub receiver_product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_adjustment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCounterOffer {
    pub sender_product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_adjustment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub bidder: Option<User>,
    #[serde(default)]
    pub offered_product: Option<Product>,
    #[serde(default)]
    pub cash_offer: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBid {
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offered_product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_offer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
