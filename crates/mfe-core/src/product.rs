//! Catalog item model shared by all participants.

use serde::{Deserialize, Serialize};

/// One catalog item as rendered by the products fragment and carried in
/// cart payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

impl Product {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        description: impl Into<String>,
        image: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            description: description.into(),
            image: image.into(),
            category: category.into(),
        }
    }
}

/// The demo catalog served by the products participant.
#[must_use]
pub fn demo_catalog() -> Vec<Product> {
    vec![
        Product::new(
            "1",
            "Wireless Headphones",
            79.99,
            "High-quality wireless headphones with noise cancellation",
            "https://placehold.co/300x200/4A90E2/ffffff?text=Headphones",
            "Electronics",
        ),
        Product::new(
            "2",
            "Smart Watch",
            199.99,
            "Feature-rich smartwatch with fitness tracking",
            "https://placehold.co/300x200/7B68EE/ffffff?text=Smart+Watch",
            "Electronics",
        ),
        Product::new(
            "3",
            "Laptop Stand",
            49.99,
            "Ergonomic laptop stand for better posture",
            "https://placehold.co/300x200/50C878/ffffff?text=Laptop+Stand",
            "Accessories",
        ),
        Product::new(
            "4",
            "USB-C Hub",
            39.99,
            "Multi-port USB-C hub with HDMI and card readers",
            "https://placehold.co/300x200/FF6B6B/ffffff?text=USB-C+Hub",
            "Accessories",
        ),
        Product::new(
            "5",
            "Mechanical Keyboard",
            129.99,
            "RGB mechanical keyboard with blue switches",
            "https://placehold.co/300x200/FFA07A/ffffff?text=Keyboard",
            "Electronics",
        ),
        Product::new(
            "6",
            "Wireless Mouse",
            29.99,
            "Ergonomic wireless mouse with adjustable DPI",
            "https://placehold.co/300x200/9370DB/ffffff?text=Mouse",
            "Electronics",
        ),
        Product::new(
            "7",
            "Monitor 27\"",
            299.99,
            "4K UHD monitor with HDR support",
            "https://placehold.co/300x200/20B2AA/ffffff?text=Monitor",
            "Electronics",
        ),
        Product::new(
            "8",
            "Desk Lamp",
            34.99,
            "LED desk lamp with adjustable brightness",
            "https://placehold.co/300x200/FFD700/ffffff?text=Desk+Lamp",
            "Accessories",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_unique_ids() {
        let catalog = demo_catalog();
        assert_eq!(catalog.len(), 8);

        let mut ids: Vec<_> = catalog.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
