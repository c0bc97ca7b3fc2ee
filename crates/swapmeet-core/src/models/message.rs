//! Messaging models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub sender: Option<User>,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub participants: Vec<User>,
    #[serde(default)]
    pub swap_request: Option<String>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
    /// Contains the current user's id when they starred the conversation
    #[serde(default)]
    pub starred_by: Vec<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn is_starred(&self) -> bool {
        !self.starred_by.is_empty()
    }

    /// Participants other than `user_id`
    pub fn others<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a User> + 'a {
        self.participants.iter().filter(move |u| u.id != user_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "count")]
    pub unread_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_count_accepts_both_field_names() {
        let a: UnreadCount = serde_json::from_str(r#"{"unread_count": 3}"#).unwrap();
        let b: UnreadCount = serde_json::from_str(r#"{"count": 5}"#).unwrap();
        assert_eq!(a.unread_count, 3);
        assert_eq!(b.unread_count, 5);
    }

    #[test]
    fn test_conversation_others_excludes_self() {
        let json = r#"{"id":"c1","participants":[{"id":"u1","username":"me"},{"id":"u2","username":"them"}],"starred_by":["u1"]}"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        let others: Vec<_> = conv.others("u1").map(|u| u.username.as_str()).collect();
        assert_eq!(others, vec!["them"]);
        assert!(conv.is_starred());
    }
}
