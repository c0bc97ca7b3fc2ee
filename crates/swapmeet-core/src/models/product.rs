//! Listing models: products, categories, images, and listing payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub product_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A listing as returned by list endpoints and embedded in swaps/bids.
///
/// `estimated_value` is a decimal string; the client only displays it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub estimated_value: Option<String>,
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Product list filters; unset filters are not sent
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub condition: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub search: Option<String>,
    pub owner: Option<String>,
    pub available: Option<bool>,
}

/// An image or video attached to a new listing
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// New listing, sent as multipart form data
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    /// Category id
    pub category: Option<String>,
    pub condition: Option<String>,
    pub estimated_value: String,
    pub location: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub images: Vec<Upload>,
}

/// Partial listing update sent as JSON
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_detail_flattens_listing_fields() {
        let json = r#"{
            "id": "p1",
            "title": "Road bike",
            "description": "Barely used",
            "estimated_value": "250.00",
            "is_available": true,
            "is_active": true,
            "images": [{"id": "i1", "image": "/media/products/bike.jpg", "is_primary": true}],
            "owner": {"id": "u1", "username": "sam"}
        }"#;
        let detail: ProductDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.product.title, "Road bike");
        assert_eq!(detail.product.estimated_value.as_deref(), Some("250.00"));
        assert_eq!(detail.images.len(), 1);
        assert!(detail.images[0].is_primary);
        assert_eq!(detail.product.owner.unwrap().username, "sam");
    }
}
