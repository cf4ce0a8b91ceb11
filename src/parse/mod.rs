//! Parsers for MTGO text exports (draft logs and decklists)

mod classify;
mod decklist;
mod draft_log;

pub use classify::{is_decklist, is_draft_log};
pub use decklist::{parse_deck, CardRow, ParsedDeck};
pub use draft_log::{parse_log, ParsedLog, ParsedPick, PICKS_PER_DRAFT, POD_SIZE};

/// Shared fixture builders for parser and reconciliation tests
#[cfg(test)]
pub mod testutil {
    /// Build a structurally valid draft log: one header block (8 players,
    /// the marker on `seat_idx`, 0-based) followed by 45 pick blocks.
    ///
    /// Picked cards are named "<prefix> Pick <n>" so tests can predict them.
    pub fn build_log(players: [&str; 8], seat_idx: usize, prefix: &str) -> String {
        let mut out = String::new();
        out.push_str("Event #: 12345678\n");
        out.push_str("Time:    7/7/2020 8:24:31 PM\n");
        out.push_str("Players:\n");
        for (i, p) in players.iter().enumerate() {
            if i == seat_idx {
                out.push_str(&format!("--> {}\n", p));
            } else {
                out.push_str(&format!("    {}\n", p));
            }
        }
        for i in 1..=45u32 {
            let pack = (i - 1) / 15 + 1;
            let pick = (i - 1) % 15 + 1;
            out.push_str(&format!("\nPack {} pick {}:\n", pack, pick));
            out.push_str(&format!("--> {} Pick {}\n", prefix, i));
            // Two cards left in the pack at every pick keeps the fixture small
            out.push_str(&format!("    Leftover {}a\n", i));
            out.push_str(&format!("    Leftover {}b\n", i));
        }
        out
    }

    /// Build a decklist export: optional name header, main rows, blank
    /// separator, sideboard rows.
    pub fn build_decklist(name: Option<&str>, main: &[&str], side: &[&str]) -> String {
        let mut out = String::new();
        if let Some(name) = name {
            out.push_str(name);
            out.push_str("\n=\n");
        }
        for card in main {
            out.push_str(&format!("1 {}\n", card));
        }
        out.push('\n');
        for card in side {
            out.push_str(&format!("1 {}\n", card));
        }
        out
    }
}
