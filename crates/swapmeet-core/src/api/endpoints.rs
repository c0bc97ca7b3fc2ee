//! Resource wrappers for the swapmeet API.
//!
//! Each method only shapes arguments into a path, query, and body; all of
//! them go through [`ApiClient::request`] so they share token handling.

use reqwest::Method;

use crate::models::{
    Bid, Category, Compatibility, Conversation, LoginRequest, Message, NewBid, NewCounterOffer,
    NewMessage, NewReview, NewSwap, Notification, Product, ProductDetail, ProductDraft,
    ProductMatches, ProductPatch, ProductQuery, ProfileUpdate, Registration,
    RegistrationResponse, Review, SuggestedMatches, SwapRequest, TokenPair, UnreadCount, User,
};

use super::request::{FormPart, RequestBody, RequestOptions};
use super::{ApiClient, ApiError};

impl ApiClient {
    // ===== Auth =====

    pub async fn register(&self, registration: &Registration) -> Result<RegistrationResponse, ApiError> {
        self.post_json("/auth/auth/register/", registration).await
    }

    /// Exchange credentials for a token pair. Does not touch the store;
    /// see `SessionManager::login` for the full flow.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/auth/auth/login/", &body).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("/auth/users/me/").await
    }

    /// Update the current profile. Sent as multipart when an avatar is attached.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let path = "/auth/users/update_profile/";
        match &update.avatar {
            None => self.patch_json(path, update).await,
            Some(avatar) => {
                let mut parts = text_parts(&serde_json::to_value(update)?);
                parts.push(FormPart::file(
                    "avatar",
                    avatar.file_name.clone(),
                    avatar.mime.clone(),
                    avatar.bytes.clone(),
                ));
                self.send_json(
                    Method::PATCH,
                    path,
                    RequestBody::Multipart(parts),
                    RequestOptions::default(),
                )
                .await
            }
        }
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_json("/auth/users/notifications/").await
    }

    // ===== Products =====

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let options = RequestOptions::new()
            .query_opt("category", query.category.as_deref())
            .query_opt("condition", query.condition.as_deref())
            .query_opt("min_value", query.min_value.as_deref())
            .query_opt("max_value", query.max_value.as_deref())
            .query_opt("search", query.search.as_deref())
            .query_opt("owner", query.owner.as_deref())
            .query_opt("available", query.available);
        self.get_json_with("/products/", options).await
    }

    pub async fn get_product(&self, id: &str) -> Result<ProductDetail, ApiError> {
        self.get_json(&format!("/products/{}/", id)).await
    }

    /// Create a listing. Always multipart; each upload is an `images` part.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<ProductDetail, ApiError> {
        let mut parts = vec![
            FormPart::text("title", draft.title.clone()),
            FormPart::text("description", draft.description.clone()),
            FormPart::text("estimated_value", draft.estimated_value.clone()),
        ];
        let optional = [
            ("category", &draft.category),
            ("condition", &draft.condition),
            ("location", &draft.location),
            ("latitude", &draft.latitude),
            ("longitude", &draft.longitude),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                parts.push(FormPart::text(name, value.clone()));
            }
        }
        for upload in &draft.images {
            parts.push(FormPart::file(
                "images",
                upload.file_name.clone(),
                upload.mime.clone(),
                upload.bytes.clone(),
            ));
        }

        self.send_json(
            Method::POST,
            "/products/",
            RequestBody::Multipart(parts),
            RequestOptions::new().header("Content-Type", "multipart/form-data"),
        )
        .await
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<ProductDetail, ApiError> {
        self.patch_json(&format!("/products/{}/", id), patch).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/products/{}/", id)).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/products/categories/").await
    }

    pub async fn my_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products/my_products/").await
    }

    pub async fn product_matches(&self, id: &str) -> Result<ProductMatches, ApiError> {
        self.get_json(&format!("/matching/products/{}/matches/", id)).await
    }

    // ===== Swaps =====

    pub async fn list_swaps(&self) -> Result<Vec<SwapRequest>, ApiError> {
        self.get_json("/swaps/").await
    }

    pub async fn create_swap(&self, swap: &NewSwap) -> Result<SwapRequest, ApiError> {
        self.post_json("/swaps/", swap).await
    }

    pub async fn accept_swap(&self, id: &str) -> Result<SwapRequest, ApiError> {
        self.post_action(&format!("/swaps/{}/accept/", id)).await
    }

    pub async fn reject_swap(&self, id: &str) -> Result<SwapRequest, ApiError> {
        self.post_action(&format!("/swaps/{}/reject/", id)).await
    }

    pub async fn cancel_swap(&self, id: &str) -> Result<SwapRequest, ApiError> {
        self.post_action(&format!("/swaps/{}/cancel/", id)).await
    }

    pub async fn complete_swap(&self, id: &str) -> Result<SwapRequest, ApiError> {
        self.post_action(&format!("/swaps/{}/complete/", id)).await
    }

    pub async fn counter_swap(&self, id: &str, offer: &NewCounterOffer) -> Result<SwapRequest, ApiError> {
        self.post_json(&format!("/swaps/{}/counter/", id), offer).await
    }

    // ===== Bids =====

    pub async fn list_bids(&self) -> Result<Vec<Bid>, ApiError> {
        self.get_json("/bids/").await
    }

    pub async fn create_bid(&self, bid: &NewBid) -> Result<Bid, ApiError> {
        self.post_json("/bids/", bid).await
    }

    pub async fn accept_bid(&self, id: &str) -> Result<Bid, ApiError> {
        self.post_action(&format!("/bids/{}/accept/", id)).await
    }

    pub async fn reject_bid(&self, id: &str) -> Result<Bid, ApiError> {
        self.post_action(&format!("/bids/{}/reject/", id)).await
    }

    pub async fn withdraw_bid(&self, id: &str) -> Result<Bid, ApiError> {
        self.post_action(&format!("/bids/{}/withdraw/", id)).await
    }

    // ===== Matching =====

    pub async fn suggested_matches(&self) -> Result<SuggestedMatches, ApiError> {
        self.get_json("/matching/products/suggested/").await
    }

    pub async fn compatibility(&self, product1: &str, product2: &str) -> Result<Compatibility, ApiError> {
        let options = RequestOptions::new()
            .query("product1", product1)
            .query("product2", product2);
        self.get_json_with("/matching/compatibility/", options).await
    }

    // ===== Reviews =====

    pub async fn user_reviews(&self, user_id: &str) -> Result<Vec<Review>, ApiError> {
        self.get_json(&format!("/reviews/user/{}/", user_id)).await
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        self.post_json("/reviews/", review).await
    }

    // ===== Messaging =====

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json("/messages/").await
    }

    pub async fn conversation_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.get_json(&format!("/messages/{}/messages/", conversation_id)).await
    }

    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError> {
        let body = NewMessage {
            content: content.to_string(),
        };
        self.post_json(&format!("/messages/{}/send/", conversation_id), &body).await
    }

    pub async fn unread_count(&self) -> Result<UnreadCount, ApiError> {
        self.get_json("/messages/unread-count/").await
    }

    pub async fn star_conversation(&self, conversation_id: &str) -> Result<serde_json::Value, ApiError> {
        self.post_action(&format!("/messages/{}/star/", conversation_id)).await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<serde_json::Value, ApiError> {
        self.post_action(&format!("/messages/{}/delete/", conversation_id)).await
    }
}

/// Flatten a JSON object of scalars into text form parts
fn text_parts(value: &serde_json::Value) -> Vec<FormPart> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(FormPart::text(name.clone(), s.clone())),
            other => Some(FormPart::text(name.clone(), other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::PartValue;

    #[test]
    fn test_text_parts_skips_nulls() {
        let value = serde_json::json!({"bio": "Collector", "location": null, "count": 3});
        let parts = text_parts(&value);
        let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bio", "count"]);
        match &parts[1].value {
            PartValue::Text(text) => assert_eq!(text, "3"),
            PartValue::File { .. } => panic!("expected text part"),
        }
    }
}
