//! Scryfall API client for card metadata lookups by MTGO card id
//!
//! Uses async reqwest for non-blocking HTTP requests.

use crate::error::{LeagueError, Result};
use serde::Deserialize;

/// Scryfall card response (the fields the collection refresh needs)
#[derive(Debug, Deserialize)]
pub struct ScryfallCard {
    pub name: String,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub prices: Option<Prices>,
}

#[derive(Debug, Deserialize)]
pub struct Prices {
    /// MTGO ticket price, as a decimal string
    pub tix: Option<String>,
    pub usd: Option<String>,
}

impl ScryfallCard {
    /// The MTGO ticket price, if Scryfall has one
    pub fn tix_price(&self) -> Option<f64> {
        self.prices
            .as_ref()
            .and_then(|p| p.tix.as_deref())
            .and_then(|s| s.parse().ok())
    }
}

/// Production Scryfall endpoint
pub const API_BASE_URL: &str = "https://api.scryfall.com";

/// Fetch a card by its MTGO catalog id from a Scryfall-shaped API at
/// `base_url` (the production endpoint is [`API_BASE_URL`])
pub async fn fetch_card_by_mtgo_id(
    client: &reqwest::Client,
    base_url: &str,
    mtgo_id: u64,
) -> Result<ScryfallCard> {
    let url = format!("{}/cards/mtgo/{}", base_url, mtgo_id);

    log::debug!("Fetching card metadata for MTGO id {}", mtgo_id);

    let response = client
        .get(&url)
        .header("User-Agent", "league_sync/1.0")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(LeagueError::HttpStatus(response.status()));
    }

    Ok(response.json::<ScryfallCard>().await?)
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
