//! Product analysis result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ModelResult;

/// Placeholder for a single-line field the analysis did not contain.
pub const NOT_FOUND: &str = "Not found";

/// Placeholder for a missing description block.
pub const NO_DESCRIPTION: &str = "No description found.";

/// Placeholder for a missing visual features block.
pub const NO_VISUAL_FEATURES: &str = "No visual features found.";

/// Product knowledge extracted from a product page.
///
/// Every free-text field always holds text: absent data is represented by
/// one of the placeholder constants so prompt construction never sees an
/// empty value. A new analysis replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    /// Page the analysis was run against
    pub url: String,
    pub name: String,
    pub description: String,
    pub visual_features: String,
    pub target_audience: String,
    /// Selling points in the order the analysis listed them
    pub selling_points: Vec<String>,
    /// Reference images found while researching the product (may be empty)
    #[serde(default)]
    pub reference_images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductData {
    /// Create product data with every field set to its placeholder.
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: NOT_FOUND.to_string(),
            description: NO_DESCRIPTION.to_string(),
            visual_features: NO_VISUAL_FEATURES.to_string(),
            target_audience: NOT_FOUND.to_string(),
            selling_points: Vec::new(),
            reference_images: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Short subject line used when describing the product to the video model.
    pub fn video_subject(&self) -> String {
        format!("{}, {}", self.name, self.visual_features)
    }

    /// The first `n` selling points joined for prompt text.
    pub fn key_points(&self, n: usize) -> String {
        self.selling_points
            .iter()
            .take(n)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a user-supplied product URL, accepting bare hosts such as
/// `shop.example/item` by assuming https.
pub fn parse_product_url(input: &str) -> ModelResult<Url> {
    let trimmed = input.trim();
    match Url::parse(trimmed) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Ok(Url::parse(&format!("https://{}", trimmed))?)
        }
        Err(e) => Err(e.into()),
    }
}
