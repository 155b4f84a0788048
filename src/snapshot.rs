//! Whole-store export and import.
//!
//! A snapshot is one JSON document carrying every user, routine, and daily
//! log plus an export timestamp. Import replaces the entire store contents
//! atomically and takes the snapshot at face value: records go in verbatim,
//! with no foreign-key validation and no id remapping.

use crate::dlog;
use crate::models::{now_iso, Snapshot};
use crate::storage::{Store, StoreError};

/// Collect the current store contents into a snapshot.
pub fn export_snapshot(store: &Store) -> Result<Snapshot, StoreError> {
    Ok(Snapshot {
        users: store.list_users()?,
        routines: store.list_routines()?,
        daily_logs: store.list_logs()?,
        exported_at: now_iso(),
    })
}

/// Serialize a snapshot the way the backup file stores it.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Conventional backup file name for a given day key.
pub fn backup_file_name(day: &str) -> String {
    format!("daily-loop-backup-{day}.json")
}

/// Parse and apply a snapshot: clear all three collections, then bulk-insert
/// every record from the document, all inside one transaction. Unparseable
/// input fails with `InvalidFormat` before anything is touched; missing
/// arrays are treated as empty.
pub fn import_snapshot(store: &Store, json: &str) -> Result<(), StoreError> {
    let snapshot: Snapshot = serde_json::from_str(json)
        .map_err(|e| StoreError::InvalidFormat(format!("snapshot: {e}")))?;

    store.in_transaction(|s| {
        s.clear_collections()?;
        for user in &snapshot.users {
            s.upsert_user(user)?;
        }
        for routine in &snapshot.routines {
            s.upsert_routine(routine)?;
        }
        for log in &snapshot.daily_logs {
            s.upsert_log(log)?;
        }
        Ok(())
    })?;
    dlog!(
        "imported snapshot: {} user(s), {} routine(s), {} log(s)",
        snapshot.users.len(),
        snapshot.routines.len(),
        snapshot.daily_logs.len()
    );
    Ok(())
}

/// Clear the three record collections in one transaction. Settings survive.
pub fn reset_all(store: &Store) -> Result<(), StoreError> {
    store.in_transaction(|s| s.clear_collections())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyLog, Routine, User};

    fn populated_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        let user = User::new("Mina", "🦊", 0);
        store.insert_user(&user).unwrap();
        let routine = Routine::timed(&user.id, "Reading", 0, 30);
        store.insert_routine(&routine).unwrap();
        store
            .insert_log(&DailyLog::fresh("2026-08-26", &routine))
            .unwrap();
        store
    }

    #[test]
    fn export_reset_import_round_trip() {
        let store = populated_store();
        let before = export_snapshot(&store).unwrap();
        let json = snapshot_to_json(&before).unwrap();

        reset_all(&store).unwrap();
        assert!(store.list_users().unwrap().is_empty());
        assert!(store.list_routines().unwrap().is_empty());
        assert!(store.list_logs().unwrap().is_empty());

        import_snapshot(&store, &json).unwrap();
        let after = export_snapshot(&store).unwrap();
        assert_eq!(after.users, before.users);
        assert_eq!(after.routines, before.routines);
        assert_eq!(after.daily_logs, before.daily_logs);
    }

    #[test]
    fn import_replaces_existing_contents() {
        let store = populated_store();
        let other = Store::open_in_memory().unwrap();
        let user = User::new("Juno", "🐻", 0);
        other.insert_user(&user).unwrap();
        let json = snapshot_to_json(&export_snapshot(&other).unwrap()).unwrap();

        import_snapshot(&store, &json).unwrap();
        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Juno");
        assert!(store.list_routines().unwrap().is_empty());
    }

    #[test]
    fn unparseable_input_leaves_store_untouched() {
        let store = populated_store();
        let err = import_snapshot(&store, "not json {").unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat(_)));
        assert_eq!(store.list_users().unwrap().len(), 1);

        let err = import_snapshot(&store, "[1, 2, 3]").unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat(_)));
    }

    #[test]
    fn partial_snapshot_arrays_default_to_empty() {
        let store = populated_store();
        import_snapshot(&store, r#"{"exportedAt":"2026-08-26T00:00:00Z"}"#).unwrap();
        assert!(store.list_users().unwrap().is_empty());
        assert!(store.list_logs().unwrap().is_empty());
    }

    #[test]
    fn snapshot_without_export_timestamp_imports() {
        let store = populated_store();
        let user = User::new("Juno", "🐻", 0);
        let json = format!(
            r#"{{"users": [{}], "routines": [], "dailyLogs": []}}"#,
            serde_json::to_string(&user).unwrap()
        );

        import_snapshot(&store, &json).unwrap();
        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Juno");
    }

    #[test]
    fn dangling_references_are_accepted_verbatim() {
        let store = populated_store();
        let json = r#"{
            "users": [],
            "routines": [],
            "dailyLogs": [{
                "date": "2026-08-26",
                "routineId": "ghost-routine",
                "userId": "ghost-user",
                "done": true,
                "updatedAt": "2026-08-26T10:00:00Z"
            }],
            "exportedAt": "2026-08-26T10:00:00Z"
        }"#;
        import_snapshot(&store, json).unwrap();

        let log = store.get_log("2026-08-26", "ghost-routine").unwrap().unwrap();
        assert!(log.done);
        assert_eq!(log.user_id, "ghost-user");
    }

    #[test]
    fn duplicate_keys_in_snapshot_are_accepted() {
        let store = populated_store();
        let mut first = User::new("Dup", "🙂", 0);
        let mut second = first.clone();
        first.name = "First".to_string();
        second.name = "Second".to_string();
        let snapshot = Snapshot {
            users: vec![first, second],
            routines: Vec::new(),
            daily_logs: Vec::new(),
            exported_at: now_iso(),
        };
        let json = snapshot_to_json(&snapshot).unwrap();

        import_snapshot(&store, &json).unwrap();
        let users = store.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Second");
    }

    #[test]
    fn backup_name_follows_pattern() {
        assert_eq!(
            backup_file_name("2026-08-26"),
            "daily-loop-backup-2026-08-26.json"
        );
    }

    #[test]
    fn reset_keeps_settings() {
        let store = populated_store();
        store
            .put_settings_blob(crate::storage::NOTIFICATION_SETTINGS_KEY, "{}")
            .unwrap();
        reset_all(&store).unwrap();
        assert!(store
            .get_settings_blob(crate::storage::NOTIFICATION_SETTINGS_KEY)
            .unwrap()
            .is_some());
    }
}
