//! Per-event reconciliation of raw text exports against persisted state
//!
//! Scans an event's directory, classifies each text file, and decides what
//! to (re)write. The pick/entry rows' recorded source file names form a
//! provenance ledger: a file whose name is already recorded is never
//! reprocessed, which makes a sync cycle safe to rerun at any time.

use crate::database::{self, Seating};
use crate::error::{LeagueError, Result};
use crate::parse::{self, ParsedDeck, POD_SIZE};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// One raw text file from an event directory
struct EventFile {
    name: String,
    text: String,
}

/// List the `.txt` files of an event directory, sorted by name for
/// deterministic processing order (files are independent, so any order is
/// correct; sorted keeps the logs stable).
fn list_txt_files(dir: &Path) -> Result<Vec<EventFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let text = fs::read_to_string(&path)?;
        files.push(EventFile { name, text });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Reconcile one event's directory against the database.
///
/// Per-file failures (malformed logs, unattributable decklists) are logged
/// and skipped; database failures propagate to the caller.
pub fn reconcile_event(conn: &mut Connection, event_id: &str, dir: &Path) -> Result<()> {
    let mut logs = Vec::new();
    let mut decks = Vec::new();
    for file in list_txt_files(dir)? {
        if parse::is_draft_log(&file.text) {
            logs.push(file);
        } else if parse::is_decklist(&file.text) {
            decks.push(file);
        } else {
            // Unrelated files may live alongside real exports
            log::debug!("Event {}: ignoring unrecognized file {}", event_id, file.name);
        }
    }

    let known_logs = database::draftlog_sources(conn, event_id)?;
    if logs.iter().any(|f| !known_logs.contains(&f.name)) {
        // A new log can shift the seat-to-player mapping, so every log for
        // the event is reprocessed as a batch.
        let dropped = database::delete_picks(conn, event_id)?;
        log::info!(
            "Event {}: new draft logs, reprocessing all logs ({} picks dropped)",
            event_id,
            dropped
        );

        let mut seatings = database::confirmed_seatings(conn, event_id)?;
        if seatings.len() != POD_SIZE {
            if !seatings.is_empty() {
                log::warn!(
                    "Event {}: {} seatings on record instead of {}, rebuilding entries",
                    event_id,
                    seatings.len(),
                    POD_SIZE
                );
            }
            database::delete_entries(conn, event_id)?;
            seatings.clear();
        }

        for file in &logs {
            match process_log(conn, event_id, file, &seatings) {
                Ok(player_id) => log::info!(
                    "Event {}: ingested draft log {} for {}",
                    event_id,
                    file.name,
                    player_id
                ),
                Err(e @ LeagueError::Database(_)) => return Err(e),
                Err(e) => log::warn!("Event {}: skipping draft log {}: {}", event_id, file.name, e),
            }
        }
    }

    let known_decks = database::decklist_sources(conn, event_id)?;
    for file in decks.iter().filter(|f| !known_decks.contains(&f.name)) {
        match process_deck(conn, event_id, file) {
            Ok(player_id) => log::info!(
                "Event {}: merged decklist {} for {}",
                event_id,
                file.name,
                player_id
            ),
            Err(e @ LeagueError::Database(_)) => return Err(e),
            Err(e) => log::warn!("Event {}: skipping decklist {}: {}", event_id, file.name, e),
        }
    }

    Ok(())
}

/// Parse one draft log, derive the drafter's identity, and insert its picks.
/// Returns the resolved player id.
fn process_log(
    conn: &mut Connection,
    event_id: &str,
    file: &EventFile,
    seatings: &[Seating],
) -> Result<String> {
    let parsed = parse::parse_log(&file.text)?;

    let player_id = if seatings.len() == POD_SIZE {
        // Seatings are confirmed: the seat number decides, not the tag
        let seat = seatings
            .iter()
            .find(|s| s.seat_num == parsed.seat_num)
            .ok_or_else(|| {
                LeagueError::MissingPlayer(format!("no entry at seat {}", parsed.seat_num))
            })?;
        if let Some(player) = database::get_player(conn, &seat.player_id)? {
            log::debug!(
                "Event {}: seat {} is {}",
                event_id,
                parsed.seat_num,
                player.full_name
            );
        }
        seat.player_id.clone()
    } else {
        // No confirmed seatings: the log's self-reported tag is the
        // provisional identity, usable only if such a player exists
        if database::get_player(conn, &parsed.player_tag)?.is_none() {
            return Err(LeagueError::MissingPlayer(parsed.player_tag));
        }
        database::insert_entry(conn, event_id, &parsed.player_tag, parsed.seat_num)?;
        parsed.player_tag.clone()
    };

    database::insert_picks(conn, event_id, &player_id, &parsed.picks, &file.name)?;
    Ok(player_id)
}

/// Parse one decklist, attribute it to a player, and merge its rows into
/// the event's picks. All writes happen in one transaction, so an
/// attribution failure writes nothing.
fn process_deck(conn: &mut Connection, event_id: &str, file: &EventFile) -> Result<String> {
    let deck = parse::parse_deck(&file.text);
    if deck.card_rows.is_empty() {
        return Err(LeagueError::NoCards(file.name.clone()));
    }

    let player_id = resolve_deck_player(conn, event_id, &deck)?;

    let tx = conn.transaction()?;
    for row in &deck.card_rows {
        match database::first_unset_pick(&tx, event_id, &player_id, &row.card_name)? {
            Some(pick_id) => {
                database::set_pick_main(&tx, event_id, &player_id, pick_id, row.is_main, &file.name)?;
            }
            None => {
                // No logged pick left for this card: a correction or an
                // extra copy, recorded as a fresh pick
                let pick_id = database::max_pick_id(&tx, event_id, &player_id)? + 1;
                database::insert_synthesized_pick(
                    &tx,
                    event_id,
                    &player_id,
                    pick_id,
                    &row.card_name,
                    row.is_main,
                    &file.name,
                )?;
            }
        }
    }
    tx.commit()?;

    Ok(player_id)
}

/// Resolve which player a decklist belongs to.
///
/// A name header wins when present. Otherwise the deck's first card name
/// must match the recorded picks of exactly one entry; zero or several
/// matches make the deck unattributable.
fn resolve_deck_player(conn: &Connection, event_id: &str, deck: &ParsedDeck) -> Result<String> {
    if let Some(full_name) = &deck.player_full_name {
        return match database::get_player_by_full_name(conn, full_name)? {
            Some(player) => Ok(player.id),
            None => Err(LeagueError::MissingPlayer(full_name.clone())),
        };
    }

    let first_card = &deck.card_rows[0].card_name;
    let candidates = database::entries_holding_card(conn, event_id, first_card)?;
    match candidates.as_slice() {
        [player_id] => Ok(player_id.clone()),
        [] => Err(LeagueError::AmbiguousAttribution(format!(
            "no entry's picks contain {}",
            first_card
        ))),
        _ => Err(LeagueError::AmbiguousAttribution(format!(
            "{} entries' picks contain {}",
            candidates.len(),
            first_card
        ))),
    }
}
