//! Derived card-collection refresh from MTGO .dek exports
//!
//! Two configured exports (owned cards, wishlist) are parsed and
//! cross-referenced with external card metadata, then the derived
//! `collection` table is rebuilt wholesale. The rebuild runs only when the
//! exports' source tags are not yet present in the table, and only writes
//! when the metadata lookup covered at least 99% of the source rows.

use crate::config::SyncConfig;
use crate::database::{self, CollectionRow, MtgoCard};
use crate::error::{LeagueError, Result};
use crate::scryfall;
use rusqlite::Connection;
use std::fs;
use std::sync::{Arc, Mutex};

/// Minimum share of source rows the metadata lookup must resolve before
/// the derived table is rewritten
const MIN_LOOKUP_COVERAGE: f64 = 0.99;

/// One `<Cards .../>` element from a .dek export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DekRow {
    pub cat_id: u64,
    pub quantity: i64,
    pub name: String,
}

/// True when the lookup resolved enough of the source rows for the derived
/// table to be rewritten. An empty source trivially passes.
fn meets_coverage(resolved: usize, total: usize) -> bool {
    total == 0 || (resolved as f64) >= (total as f64) * MIN_LOOKUP_COVERAGE
}

/// Extract one double-quoted attribute value from an element line
fn attr<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", key);
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')?;
    Some(&line[start..start + end])
}

/// Parse the `<Cards CatID=".." Quantity=".." Name=".."/>` rows of a .dek
/// export. Lines missing any of the three attributes are skipped.
pub fn parse_dek(text: &str) -> Vec<DekRow> {
    let mut rows = Vec::new();
    for line in text.lines() {
        if !line.contains("<Cards") {
            continue;
        }
        let cat_id = attr(line, "CatID").and_then(|v| v.parse().ok());
        let quantity = attr(line, "Quantity").and_then(|v| v.parse().ok());
        let name = attr(line, "Name");
        if let (Some(cat_id), Some(quantity), Some(name)) = (cat_id, quantity, name) {
            rows.push(DekRow {
                cat_id,
                quantity,
                name: name.to_string(),
            });
        }
    }
    rows
}

/// Look up card metadata for an MTGO id, going through the `mtgo_card`
/// cache table before the network. Lookup misses (network failures, ids
/// Scryfall doesn't know) resolve to `None`; database failures propagate.
async fn lookup_card(
    db: &Arc<Mutex<Connection>>,
    client: &reqwest::Client,
    api_base_url: &str,
    mtgo_id: u64,
) -> Result<Option<MtgoCard>> {
    {
        let conn = db.lock().unwrap();
        if let Some(card) = database::get_mtgo_card(&conn, mtgo_id)? {
            return Ok(Some(card));
        }
    }

    match scryfall::fetch_card_by_mtgo_id(client, api_base_url, mtgo_id).await {
        Ok(fetched) => {
            let card = MtgoCard {
                id: mtgo_id,
                name: fetched.name.clone(),
                layout: fetched.layout.clone(),
                price_as_of: chrono::Utc::now().format("%Y-%m-%d").to_string(),
                price: fetched.tix_price(),
            };
            let conn = db.lock().unwrap();
            database::upsert_mtgo_card(&conn, &card)?;
            Ok(Some(card))
        }
        Err(e) => {
            log::debug!("Card lookup failed for MTGO id {}: {}", mtgo_id, e);
            Ok(None)
        }
    }
}

/// Refresh the derived collection table from the configured .dek exports.
///
/// Skips silently when no exports are configured, when a configured export
/// file is missing, when both source tags are already recorded, or when
/// lookup coverage falls below the 99% threshold. Only database errors are
/// returned.
pub async fn refresh_collection(db: &Arc<Mutex<Connection>>, config: &SyncConfig) -> Result<()> {
    refresh_collection_from(db, config, scryfall::API_BASE_URL).await
}

/// Refresh against a Scryfall-shaped API at `api_base_url`
async fn refresh_collection_from(
    db: &Arc<Mutex<Connection>>,
    config: &SyncConfig,
    api_base_url: &str,
) -> Result<()> {
    let (owned, wishlist) = match (&config.owned_dek, &config.wishlist_dek) {
        (Some(owned), Some(wishlist)) => (owned.clone(), wishlist.clone()),
        _ => {
            log::debug!("No collection exports configured, skipping refresh");
            return Ok(());
        }
    };

    {
        let conn = db.lock().unwrap();
        if database::collection_has_source(&conn, &owned)?
            && database::collection_has_source(&conn, &wishlist)?
        {
            log::debug!("Collection already derived from {} and {}", owned, wishlist);
            return Ok(());
        }
    }

    let mut sources = Vec::new();
    for (list, file_name) in [("owned", &owned), ("wishlist", &wishlist)] {
        let path = config.dek_path(file_name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Cannot read collection export {}: {}", path.display(), e);
                return Ok(());
            }
        };
        sources.push((list, file_name.clone(), parse_dek(&text)));
    }

    let total: usize = sources.iter().map(|(_, _, rows)| rows.len()).sum();
    let client = reqwest::Client::new();
    let mut rows = Vec::new();
    let mut resolved = 0usize;

    for (list, source, dek_rows) in &sources {
        for dek_row in dek_rows {
            match lookup_card(db, &client, api_base_url, dek_row.cat_id).await? {
                Some(card) => {
                    resolved += 1;
                    rows.push(CollectionRow {
                        mtgo_id: dek_row.cat_id,
                        name: card.name,
                        quantity: dek_row.quantity,
                        price: card.price,
                        list: list.to_string(),
                        source: source.clone(),
                    });
                }
                None => log::debug!("Unresolved collection row: {}", dek_row.name),
            }
        }
    }

    if !meets_coverage(resolved, total) {
        log::warn!(
            "{}; collection refresh skipped, nothing written",
            LeagueError::PartialLookup { resolved, total }
        );
        return Ok(());
    }

    let written = {
        let mut conn = db.lock().unwrap();
        database::replace_collection(&mut conn, &rows)?
    };
    log::info!(
        "Collection refreshed: {} rows from {} and {}",
        written,
        owned,
        wishlist
    );
    Ok(())
}
