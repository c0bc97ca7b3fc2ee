//! Match results. Scores are computed server-side and only displayed here.

use serde::{Deserialize, Serialize};

use super::Product;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product: Product,
    pub compatibility_score: f64,
    #[serde(default)]
    pub breakdown: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatches {
    pub product: Product,
    #[serde(default)]
    pub matches: Vec<ProductMatch>,
    #[serde(default)]
    pub total_matches: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedMatch {
    pub your_product: Product,
    pub matched_product: Product,
    pub compatibility_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestedMatches {
    #[serde(default)]
    pub matches: Vec<SuggestedMatch>,
    #[serde(default)]
    pub total_matches: u32,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compatibility {
    pub product1: Product,
    pub product2: Product,
    pub compatibility_score: f64,
    #[serde(default)]
    pub breakdown: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_matches_without_products() {
        let json = r#"{"message": "No products available for matching", "matches": []}"#;
        let parsed: SuggestedMatches = serde_json::from_str(json).unwrap();
        assert!(parsed.matches.is_empty());
        assert_eq!(parsed.total_matches, 0);
        assert!(parsed.message.is_some());
    }
}
