//! Database operations for league sync
//!
//! Uses parameterized queries exclusively for security (no SQL string
//! concatenation). Multi-row writes are transactional.

use crate::parse::ParsedPick;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// A player known to the league (seeded from the external directory)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub full_name: String,
    pub account: Option<String>,
}

/// One confirmed seating: a seat number bound to a player for an event
#[derive(Debug, Clone)]
pub struct Seating {
    pub seat_num: u32,
    pub player_id: String,
}

/// Cached metadata for one MTGO card id
#[derive(Debug, Clone)]
pub struct MtgoCard {
    pub id: u64,
    pub name: String,
    pub layout: Option<String>,
    pub price_as_of: String,
    pub price: Option<f64>,
}

/// One row of the derived card-collection table
#[derive(Debug, Clone)]
pub struct CollectionRow {
    pub mtgo_id: u64,
    pub name: String,
    pub quantity: i64,
    pub price: Option<f64>,
    /// "owned" or "wishlist"
    pub list: String,
    /// Source tag of the export this row came from (the .dek file name)
    pub source: String,
}

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `player` / `event`: league directory (seeded externally)
/// - `entry`: per-event participation with seat assignment
/// - `pick`: per-pick rows carrying the source-file provenance ledger
/// - `mtgo_card`: cache of external card-metadata lookups
/// - `collection`: derived owned/wishlist card table
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS player (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            account TEXT
        );

        CREATE TABLE IF NOT EXISTS event (
            id TEXT PRIMARY KEY,
            sheet_id TEXT
        );

        -- Participation records; (event, player) is never duplicated
        CREATE TABLE IF NOT EXISTS entry (
            event_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            seat_num INTEGER,
            account TEXT,
            is_open INTEGER NOT NULL DEFAULT 1,
            final_position INTEGER,
            qps_awarded INTEGER,
            cps_awarded INTEGER,
            PRIMARY KEY (event_id, player_id)
        );

        CREATE INDEX IF NOT EXISTS idx_entry_event_seat ON entry(event_id, seat_num);

        -- Draft picks; pack_num/pick_num are NULL for picks synthesized
        -- from decklist rows with no logged counterpart
        CREATE TABLE IF NOT EXISTS pick (
            event_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            pick_id INTEGER NOT NULL,
            pack_num INTEGER,
            pick_num INTEGER,
            card_name TEXT NOT NULL,
            other_card_names TEXT,
            is_main INTEGER,
            decklist_source TEXT,
            draftlog_source TEXT,
            PRIMARY KEY (event_id, player_id, pick_id)
        );

        CREATE INDEX IF NOT EXISTS idx_pick_event_card ON pick(event_id, card_name);

        -- External card-metadata lookup cache, keyed by MTGO card id
        CREATE TABLE IF NOT EXISTS mtgo_card (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            layout TEXT,
            price_as_of TEXT NOT NULL,
            price REAL
        );

        -- Derived collection table, rebuilt wholesale from the .dek exports
        CREATE TABLE IF NOT EXISTS collection (
            mtgo_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            price REAL,
            list TEXT NOT NULL,
            source TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_collection_source ON collection(source);
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

// ── Players & events ───────────────────────────────────────────────────────

pub fn upsert_player(conn: &Connection, player: &Player) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO player (id, full_name, account) VALUES (?1, ?2, ?3)",
        params![&player.id, &player.full_name, &player.account],
    )?;
    Ok(())
}

pub fn get_player(conn: &Connection, id: &str) -> DbResult<Option<Player>> {
    conn.query_row(
        "SELECT id, full_name, account FROM player WHERE id = ?1",
        params![id],
        |row| {
            Ok(Player {
                id: row.get(0)?,
                full_name: row.get(1)?,
                account: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn get_player_by_full_name(conn: &Connection, full_name: &str) -> DbResult<Option<Player>> {
    conn.query_row(
        "SELECT id, full_name, account FROM player WHERE full_name = ?1",
        params![full_name],
        |row| {
            Ok(Player {
                id: row.get(0)?,
                full_name: row.get(1)?,
                account: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Register configured events that the store hasn't seen yet
pub fn register_events(conn: &Connection, event_ids: &[String]) -> DbResult<()> {
    let mut stmt = conn.prepare_cached("INSERT OR IGNORE INTO event (id) VALUES (?1)")?;
    for id in event_ids {
        stmt.execute(params![id])?;
    }
    Ok(())
}

/// All event ids known to the store, ordered for deterministic sync logs
pub fn event_ids(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM event ORDER BY id")?;
    let ids: DbResult<Vec<String>> = stmt.query_map([], |row| row.get(0))?.collect();
    ids
}

// ── Entries (seatings) ─────────────────────────────────────────────────────

/// Confirmed seatings for an event, ordered by seat number
pub fn confirmed_seatings(conn: &Connection, event_id: &str) -> DbResult<Vec<Seating>> {
    let mut stmt = conn.prepare(
        "SELECT seat_num, player_id FROM entry
         WHERE event_id = ?1 AND seat_num IS NOT NULL AND player_id != ''
         ORDER BY seat_num",
    )?;
    let seatings: DbResult<Vec<Seating>> = stmt
        .query_map(params![event_id], |row| {
            Ok(Seating {
                seat_num: row.get(0)?,
                player_id: row.get(1)?,
            })
        })?
        .collect();
    seatings
}

pub fn insert_entry(
    conn: &Connection,
    event_id: &str,
    player_id: &str,
    seat_num: u32,
) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO entry (event_id, player_id, seat_num) VALUES (?1, ?2, ?3)",
        params![event_id, player_id, seat_num],
    )?;
    Ok(())
}

pub fn delete_entries(conn: &Connection, event_id: &str) -> DbResult<usize> {
    conn.execute("DELETE FROM entry WHERE event_id = ?1", params![event_id])
}

// ── Picks & provenance ledger ──────────────────────────────────────────────

/// File names already ingested as draft logs for an event
pub fn draftlog_sources(conn: &Connection, event_id: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT draftlog_source FROM pick
         WHERE event_id = ?1 AND draftlog_source IS NOT NULL",
    )?;
    let sources: DbResult<Vec<String>> = stmt.query_map(params![event_id], |row| row.get(0))?.collect();
    sources
}

/// File names already ingested as decklists for an event
pub fn decklist_sources(conn: &Connection, event_id: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT decklist_source FROM pick
         WHERE event_id = ?1 AND decklist_source IS NOT NULL",
    )?;
    let sources: DbResult<Vec<String>> = stmt.query_map(params![event_id], |row| row.get(0))?.collect();
    sources
}

pub fn delete_picks(conn: &Connection, event_id: &str) -> DbResult<usize> {
    conn.execute("DELETE FROM pick WHERE event_id = ?1", params![event_id])
}

/// Insert all picks from one parsed draft log, tagged with its source file.
/// All inserts run in a single transaction.
pub fn insert_picks(
    conn: &mut Connection,
    event_id: &str,
    player_id: &str,
    picks: &[ParsedPick],
    source: &str,
) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let count = insert_picks_tx(&tx, event_id, player_id, picks, source)?;
    tx.commit()?;
    Ok(count)
}

fn insert_picks_tx(
    tx: &Transaction<'_>,
    event_id: &str,
    player_id: &str,
    picks: &[ParsedPick],
    source: &str,
) -> DbResult<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO pick
         (event_id, player_id, pick_id, pack_num, pick_num, card_name, other_card_names, draftlog_source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    let mut count = 0;
    for pick in picks {
        stmt.execute(params![
            event_id,
            player_id,
            pick.pick_id,
            pick.pack_num,
            pick.pick_num,
            &pick.card_name,
            &pick.other_card_names,
            source,
        ])?;
        count += 1;
    }
    Ok(count)
}

/// Entries whose recorded picks contain the given card name. Used for the
/// decklist-attribution fallback; more than one hit means the deck cannot
/// be attributed.
pub fn entries_holding_card(
    conn: &Connection,
    event_id: &str,
    card_name: &str,
) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.player_id FROM pick p
         JOIN entry e ON e.event_id = p.event_id AND e.player_id = p.player_id
         WHERE p.event_id = ?1 AND p.card_name = ?2",
    )?;
    let players: DbResult<Vec<String>> = stmt
        .query_map(params![event_id, card_name], |row| row.get(0))?
        .collect();
    players
}

/// Lowest pick id for this card whose `is_main` is still unset, if any.
/// Picking the lowest keeps the merge deterministic when a card was drafted
/// more than once.
pub fn first_unset_pick(
    conn: &Connection,
    event_id: &str,
    player_id: &str,
    card_name: &str,
) -> DbResult<Option<i64>> {
    conn.query_row(
        "SELECT pick_id FROM pick
         WHERE event_id = ?1 AND player_id = ?2 AND card_name = ?3 AND is_main IS NULL
         ORDER BY pick_id LIMIT 1",
        params![event_id, player_id, card_name],
        |row| row.get(0),
    )
    .optional()
}

/// Record the main/sideboard decision for one pick, at most once per pick
pub fn set_pick_main(
    conn: &Connection,
    event_id: &str,
    player_id: &str,
    pick_id: i64,
    is_main: bool,
    source: &str,
) -> DbResult<()> {
    conn.execute(
        "UPDATE pick SET is_main = ?4, decklist_source = ?5
         WHERE event_id = ?1 AND player_id = ?2 AND pick_id = ?3",
        params![event_id, player_id, pick_id, is_main as i64, source],
    )?;
    Ok(())
}

pub fn max_pick_id(conn: &Connection, event_id: &str, player_id: &str) -> DbResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(pick_id), 0) FROM pick WHERE event_id = ?1 AND player_id = ?2",
        params![event_id, player_id],
        |row| row.get(0),
    )
}

/// Insert a pick that exists only in a decklist (no logged counterpart)
pub fn insert_synthesized_pick(
    conn: &Connection,
    event_id: &str,
    player_id: &str,
    pick_id: i64,
    card_name: &str,
    is_main: bool,
    source: &str,
) -> DbResult<()> {
    conn.execute(
        "INSERT INTO pick (event_id, player_id, pick_id, card_name, is_main, decklist_source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![event_id, player_id, pick_id, card_name, is_main as i64, source],
    )?;
    Ok(())
}

// ── Card-metadata cache & collection ───────────────────────────────────────

pub fn get_mtgo_card(conn: &Connection, id: u64) -> DbResult<Option<MtgoCard>> {
    conn.query_row(
        "SELECT id, name, layout, price_as_of, price FROM mtgo_card WHERE id = ?1",
        params![id],
        |row| {
            Ok(MtgoCard {
                id: row.get(0)?,
                name: row.get(1)?,
                layout: row.get(2)?,
                price_as_of: row.get(3)?,
                price: row.get(4)?,
            })
        },
    )
    .optional()
}

pub fn upsert_mtgo_card(conn: &Connection, card: &MtgoCard) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO mtgo_card (id, name, layout, price_as_of, price)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![card.id, &card.name, &card.layout, &card.price_as_of, card.price],
    )?;
    Ok(())
}

/// True iff collection rows from this source tag are already present
pub fn collection_has_source(conn: &Connection, source: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM collection WHERE source = ?1",
        params![source],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Replace the whole derived collection table in one transaction
pub fn replace_collection(conn: &mut Connection, rows: &[CollectionRow]) -> DbResult<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM collection", [])?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO collection (mtgo_id, name, quantity, price, list, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.mtgo_id,
                &row.name,
                row.quantity,
                row.price,
                &row.list,
                &row.source,
            ])?;
        }
    }
    tx.commit()?;
    Ok(rows.len())
}

// ── Stats ──────────────────────────────────────────────────────────────────

pub fn get_player_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM player", [], |row| row.get(0))
}

pub fn get_pick_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM pick", [], |row| row.get(0))
}

#[cfg(test)]
pub(crate) fn test_player(id: &str, full_name: &str) -> Player {
    Player {
        id: id.to_string(),
        full_name: full_name.to_string(),
        account: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParsedPick;

    /// Create an in-memory database for testing
    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn test_pick(pick_id: u32, card_name: &str) -> ParsedPick {
        ParsedPick {
            pick_id,
            pack_num: (pick_id - 1) / 15 + 1,
            pick_num: (pick_id - 1) % 15 + 1,
            card_name: card_name.to_string(),
            other_card_names: String::new(),
        }
    }

    #[test]
    fn init_schema_creates_tables() {
        let conn = test_db();
        for table in ["player", "event", "entry", "pick", "mtgo_card", "collection"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn player_lookup_by_id_and_full_name() {
        let conn = test_db();
        upsert_player(&conn, &test_player("janed", "Jane Doe")).unwrap();

        assert_eq!(get_player(&conn, "janed").unwrap().unwrap().full_name, "Jane Doe");
        assert_eq!(
            get_player_by_full_name(&conn, "Jane Doe").unwrap().unwrap().id,
            "janed"
        );
        assert!(get_player(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn register_events_is_idempotent() {
        let conn = test_db();
        let ids = vec!["2020-07".to_string(), "2020-08".to_string()];
        register_events(&conn, &ids).unwrap();
        register_events(&conn, &ids).unwrap();
        assert_eq!(event_ids(&conn).unwrap(), ids);
    }

    #[test]
    fn seatings_ordered_by_seat() {
        let conn = test_db();
        insert_entry(&conn, "ev1", "p3", 3).unwrap();
        insert_entry(&conn, "ev1", "p1", 1).unwrap();
        insert_entry(&conn, "ev2", "px", 2).unwrap();

        let seatings = confirmed_seatings(&conn, "ev1").unwrap();
        assert_eq!(seatings.len(), 2);
        assert_eq!(seatings[0].seat_num, 1);
        assert_eq!(seatings[0].player_id, "p1");
        assert_eq!(seatings[1].seat_num, 3);
    }

    #[test]
    fn insert_picks_records_provenance() {
        let mut conn = test_db();
        let picks = vec![test_pick(1, "Card A"), test_pick(2, "Card B")];
        let count = insert_picks(&mut conn, "ev1", "p1", &picks, "log1.txt").unwrap();
        assert_eq!(count, 2);

        assert_eq!(draftlog_sources(&conn, "ev1").unwrap(), vec!["log1.txt"]);
        assert!(decklist_sources(&conn, "ev1").unwrap().is_empty());
        assert_eq!(get_pick_count(&conn).unwrap(), 2);
    }

    #[test]
    fn first_unset_pick_takes_lowest_and_respects_set() {
        let mut conn = test_db();
        // Same card drafted twice
        let picks = vec![test_pick(5, "Card A"), test_pick(9, "Card A")];
        insert_picks(&mut conn, "ev1", "p1", &picks, "log1.txt").unwrap();

        assert_eq!(first_unset_pick(&conn, "ev1", "p1", "Card A").unwrap(), Some(5));
        set_pick_main(&conn, "ev1", "p1", 5, true, "deck1.txt").unwrap();
        assert_eq!(first_unset_pick(&conn, "ev1", "p1", "Card A").unwrap(), Some(9));
        set_pick_main(&conn, "ev1", "p1", 9, false, "deck1.txt").unwrap();
        assert_eq!(first_unset_pick(&conn, "ev1", "p1", "Card A").unwrap(), None);
    }

    #[test]
    fn max_pick_id_defaults_to_zero() {
        let conn = test_db();
        assert_eq!(max_pick_id(&conn, "ev1", "p1").unwrap(), 0);
        insert_synthesized_pick(&conn, "ev1", "p1", 1, "Card A", true, "deck1.txt").unwrap();
        assert_eq!(max_pick_id(&conn, "ev1", "p1").unwrap(), 1);
    }

    #[test]
    fn entries_holding_card_requires_entry_row() {
        let mut conn = test_db();
        insert_picks(&mut conn, "ev1", "p1", &[test_pick(1, "Card A")], "l1.txt").unwrap();
        // No entry row yet: the pick alone is not attributable
        assert!(entries_holding_card(&conn, "ev1", "Card A").unwrap().is_empty());

        insert_entry(&conn, "ev1", "p1", 1).unwrap();
        assert_eq!(entries_holding_card(&conn, "ev1", "Card A").unwrap(), vec!["p1"]);
    }

    #[test]
    fn mtgo_card_cache_round_trip() {
        let conn = test_db();
        assert!(get_mtgo_card(&conn, 42).unwrap().is_none());

        let card = MtgoCard {
            id: 42,
            name: "Griselbrand".to_string(),
            layout: Some("normal".to_string()),
            price_as_of: "2026-08-31".to_string(),
            price: Some(4.2),
        };
        upsert_mtgo_card(&conn, &card).unwrap();

        let cached = get_mtgo_card(&conn, 42).unwrap().unwrap();
        assert_eq!(cached.name, "Griselbrand");
        assert_eq!(cached.price, Some(4.2));
    }

    #[test]
    fn replace_collection_replaces_wholesale() {
        let mut conn = test_db();
        let row = |id: u64, source: &str| CollectionRow {
            mtgo_id: id,
            name: format!("Card {}", id),
            quantity: 1,
            price: None,
            list: "owned".to_string(),
            source: source.to_string(),
        };

        replace_collection(&mut conn, &[row(1, "owned.dek"), row(2, "owned.dek")]).unwrap();
        assert!(collection_has_source(&conn, "owned.dek").unwrap());
        assert!(!collection_has_source(&conn, "wish.dek").unwrap());

        replace_collection(&mut conn, &[row(3, "wish.dek")]).unwrap();
        assert!(!collection_has_source(&conn, "owned.dek").unwrap());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM collection", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
