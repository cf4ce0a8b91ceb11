//! Sync orchestration
//!
//! One cycle registers configured events, reconciles every known event's
//! directory sequentially, then refreshes the derived collection table.
//! Events are processed one at a time; a failing event is logged and the
//! cycle moves on, while database-level failures of the cycle itself
//! propagate to the caller.

use crate::collection;
use crate::config::SyncConfig;
use crate::database;
use crate::error::Result;
use crate::reconcile;
use rusqlite::Connection;
use std::fs;
use std::sync::{Arc, Mutex};

/// Run a single sync cycle
pub async fn run_sync(db: &Arc<Mutex<Connection>>, config: &SyncConfig) -> Result<()> {
    {
        let mut conn = db.lock().unwrap();
        database::register_events(&conn, &config.events)?;

        let event_ids = database::event_ids(&conn)?;
        log::info!("Reconciling {} event(s)", event_ids.len());
        for event_id in &event_ids {
            let dir = config.event_dir(event_id);
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
                log::info!("Created event directory {}", dir.display());
            }
            // Partial-failure isolation: one bad event must not stop the rest
            if let Err(e) = reconcile::reconcile_event(&mut conn, event_id, &dir) {
                log::error!("Event {}: reconciliation failed: {}", event_id, e);
            }
        }
    }

    collection::refresh_collection(db, config).await?;

    log::info!("Sync cycle completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{init_schema, test_player, upsert_player};
    use crate::parse::testutil::build_log;

    fn test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn test_config(dir: &std::path::Path, events: &[&str]) -> SyncConfig {
        SyncConfig {
            data_folder: dir.to_path_buf(),
            events: events.iter().map(|s| s.to_string()).collect(),
            owned_dek: None,
            wishlist_dek: None,
        }
    }

    #[tokio::test]
    async fn creates_event_directories_and_registers_events() {
        let db = test_db();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["2020-07", "2020-08"]);

        run_sync(&db, &config).await.unwrap();

        assert!(dir.path().join("events/2020-07").is_dir());
        assert!(dir.path().join("events/2020-08").is_dir());
        let conn = db.lock().unwrap();
        assert_eq!(
            database::event_ids(&conn).unwrap(),
            vec!["2020-07", "2020-08"]
        );
    }

    #[tokio::test]
    async fn end_to_end_cycle_ingests_event_files() {
        let db = test_db();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["2020-07"]);
        {
            let conn = db.lock().unwrap();
            upsert_player(&conn, &test_player("PlayerB", "Bob Baker")).unwrap();
        }

        // First cycle creates the directory; drop a log in and cycle again
        run_sync(&db, &config).await.unwrap();
        let players = [
            "PlayerA", "PlayerB", "PlayerC", "PlayerD", "PlayerE", "PlayerF", "PlayerG", "PlayerH",
        ];
        fs::write(
            dir.path().join("events/2020-07/log_b.txt"),
            build_log(players, 1, "X"),
        )
        .unwrap();
        run_sync(&db, &config).await.unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(database::get_pick_count(&conn).unwrap(), 45);
        assert_eq!(
            database::draftlog_sources(&conn, "2020-07").unwrap(),
            vec!["log_b.txt"]
        );
    }

    #[tokio::test]
    async fn failing_event_does_not_stop_others() {
        let db = test_db();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["2020-06", "2020-07"]);
        {
            let conn = db.lock().unwrap();
            upsert_player(&conn, &test_player("PlayerB", "Bob Baker")).unwrap();
        }

        // 2020-06's directory path is occupied by a plain file, so its
        // reconciliation fails; 2020-07 holds a valid log
        fs::create_dir_all(dir.path().join("events/2020-07")).unwrap();
        fs::write(dir.path().join("events/2020-06"), "not a directory").unwrap();
        let players = [
            "PlayerA", "PlayerB", "PlayerC", "PlayerD", "PlayerE", "PlayerF", "PlayerG", "PlayerH",
        ];
        fs::write(
            dir.path().join("events/2020-07/log_b.txt"),
            build_log(players, 1, "X"),
        )
        .unwrap();

        run_sync(&db, &config).await.unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(database::get_pick_count(&conn).unwrap(), 45);
        assert_eq!(
            database::draftlog_sources(&conn, "2020-07").unwrap(),
            vec!["log_b.txt"]
        );
    }

    #[tokio::test]
    async fn rerunning_a_cycle_is_idempotent() {
        let db = test_db();
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), &["2020-07"]);

        run_sync(&db, &config).await.unwrap();
        run_sync(&db, &config).await.unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(database::event_ids(&conn).unwrap(), vec!["2020-07"]);
    }
}
