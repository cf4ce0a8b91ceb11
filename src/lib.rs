//! League Sync - OCL Draft League Data Pipeline
//!
//! Parses MTGO draft logs and decklist exports dropped into per-event
//! directories, reconciles them against a SQLite store, and maintains a
//! derived card-collection table augmented with external card metadata.

pub mod collection;
pub mod config;
pub mod database;
pub mod error;
pub mod parse;
pub mod reconcile;
pub mod scryfall;
pub mod sync;

pub use config::SyncConfig;
pub use error::{LeagueError, Result};
pub use parse::{is_decklist, is_draft_log, parse_deck, parse_log, ParsedDeck, ParsedLog};
