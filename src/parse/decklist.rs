//! Decklist export parsing
//!
//! Exports are `<count> <name>` rows, one blank line between main deck and
//! sideboard, optionally preceded by a `PlayerName\n=\n` header. Basic lands
//! are dropped; split/double-faced names are canonicalized so they line up
//! with the names recorded from draft logs.

use super::classify::{card_row_name, is_basic_land};

/// Canonical forms for names the MTGO decklist export writes differently
/// than the draft log does. Slash forms become `A // B`; double-faced cards
/// exported by front face only get their full name.
const NAME_REMAP: &[(&str, &str)] = &[
    ("Fire/Ice", "Fire // Ice"),
    ("Wear/Tear", "Wear // Tear"),
    ("Life/Death", "Life // Death"),
    ("Assault/Battery", "Assault // Battery"),
    ("Turn/Burn", "Turn // Burn"),
    ("Commit/Memory", "Commit // Memory"),
    ("Delver of Secrets", "Delver of Secrets // Insectile Aberration"),
    ("Brazen Borrower", "Brazen Borrower // Petty Theft"),
    ("Bonecrusher Giant", "Bonecrusher Giant // Stomp"),
];

/// One card row from a decklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub card_name: String,
    /// true for main-deck rows, false for sideboard rows
    pub is_main: bool,
}

/// A parsed decklist export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDeck {
    /// From the `Name\n=\n` header variant; absent otherwise
    pub player_full_name: Option<String>,
    pub card_rows: Vec<CardRow>,
}

fn remap_name(name: &str) -> &str {
    NAME_REMAP
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Parse a decklist export. Pure and infallible; an export with no card
/// rows simply yields an empty `card_rows` (callers decide whether that is
/// an error).
pub fn parse_deck(text: &str) -> ParsedDeck {
    let text = text.replace('\r', "");

    let (player_full_name, body) = match text.split_once("=\n") {
        Some((head, rest)) => {
            let head = head.trim();
            let name = if head.is_empty() {
                None
            } else {
                Some(head.to_string())
            };
            (name, rest)
        }
        None => (None, text.as_str()),
    };

    let mut card_rows = Vec::new();
    let mut is_main = true;
    for line in body.lines() {
        if line.trim().is_empty() {
            // First blank line splits main deck from sideboard
            is_main = false;
            continue;
        }
        let name = match card_row_name(line) {
            Some(name) => name,
            None => continue,
        };
        if name.is_empty() || is_basic_land(name) {
            continue;
        }
        card_rows.push(CardRow {
            card_name: remap_name(name).to_string(),
            is_main,
        });
    }

    ParsedDeck {
        player_full_name,
        card_rows,
    }
}
