//! Offers - the traffic catalog sourced from the remote authority

use serde::{Deserialize, Serialize};

/// A routable offer. Immutable from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub name: String,
}

/// Id-addressed offer catalog for the session, rebuilt wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct OfferCatalog {
    offers: Vec<Offer>,
}

impl OfferCatalog {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    pub fn get(&self, offer_id: i64) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == offer_id)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter()
    }

    /// Match offers by id substring or case-insensitive name substring.
    ///
    /// This is the lookup behind the attach-offer autocomplete; the widget
    /// itself lives outside the core.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Offer> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.offers
            .iter()
            .filter(|o| {
                o.id.to_string().contains(&query) || o.name.to_lowercase().contains(&query)
            })
            .take(limit)
            .collect()
    }
}
