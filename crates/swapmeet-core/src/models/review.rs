use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    #[serde(default)]
    pub reviewer: Option<User>,
    #[serde(default)]
    pub reviewed_user: Option<String>,
    #[serde(default)]
    pub swap_request: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub reviewed_user: String,
    pub swap_request: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
