//! End-to-end flows across the store, initializer, ordering, and snapshot
//! services, exercised the way the application shell drives them.

use daily_loop::daily::{self, DayStats};
use daily_loop::models::{DailyLog, Routine, User};
use daily_loop::ordering;
use daily_loop::snapshot;
use daily_loop::storage::Store;

fn family_store() -> (Store, User, User) {
    let store = Store::open_in_memory().unwrap();
    let mina = User::new("Mina", "🦊", 0);
    let juno = User::new("Juno", "🐻", 1);
    store.insert_user(&mina).unwrap();
    store.insert_user(&juno).unwrap();
    (store, mina, juno)
}

#[test]
fn initializer_covers_every_user_and_stays_idempotent() {
    let (store, mina, juno) = family_store();
    store
        .insert_routine(&Routine::check(&mina.id, "Brush teeth", 0))
        .unwrap();
    store
        .insert_routine(&Routine::timed(&mina.id, "Reading", 1, 30))
        .unwrap();
    store
        .insert_routine(&Routine::counted(&juno.id, "Push-ups", 0, 20))
        .unwrap();

    let day = "2026-08-26";
    assert_eq!(daily::ensure_today_logs(&store, day).unwrap(), 3);

    let first: Vec<DailyLog> = store.list_logs_by_date(day).unwrap();
    assert_eq!(daily::ensure_today_logs(&store, day).unwrap(), 0);
    let second: Vec<DailyLog> = store.list_logs_by_date(day).unwrap();
    assert_eq!(first, second);

    assert_eq!(store.list_logs_for_user_on(day, &mina.id).unwrap().len(), 2);
    assert_eq!(store.list_logs_for_user_on(day, &juno.id).unwrap().len(), 1);
}

#[test]
fn timed_routine_full_scenario() {
    let (store, mina, _) = family_store();
    let reading = Routine::timed(&mina.id, "Reading", 0, 30);
    store.insert_routine(&reading).unwrap();

    let day = "2026-08-26";
    daily::ensure_today_logs(&store, day).unwrap();

    let log = store.get_log(day, &reading.id).unwrap().unwrap();
    assert_eq!((log.spent_minutes, log.done), (Some(0), false));

    let log = daily::add_minutes(&store, day, &reading.id, 30).unwrap();
    assert_eq!((log.spent_minutes, log.done), (Some(30), true));

    let log = daily::add_minutes(&store, day, &reading.id, 5).unwrap();
    assert_eq!((log.spent_minutes, log.done), (Some(35), true));
}

#[test]
fn user_reorder_scenario() {
    let store = Store::open_in_memory().unwrap();
    let a = User::new("A", "🅰️", 0);
    let b = User::new("B", "🅱️", 1);
    store.insert_user(&a).unwrap();
    store.insert_user(&b).unwrap();

    ordering::move_user_down(&store, &a.id).unwrap();

    assert_eq!(store.get_user(&a.id).unwrap().unwrap().sort_order, 1);
    assert_eq!(store.get_user(&b.id).unwrap().unwrap().sort_order, 0);
    let names: Vec<String> = store
        .list_users()
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn snapshot_round_trip_preserves_everything() {
    let (store, mina, juno) = family_store();
    let r1 = Routine::timed(&mina.id, "Reading", 0, 30);
    let r2 = Routine::counted(&juno.id, "Push-ups", 0, 20);
    store.insert_routine(&r1).unwrap();
    store.insert_routine(&r2).unwrap();
    daily::ensure_today_logs(&store, "2026-08-25").unwrap();
    daily::ensure_today_logs(&store, "2026-08-26").unwrap();
    daily::add_minutes(&store, "2026-08-26", &r1.id, 40).unwrap();

    let exported = snapshot::export_snapshot(&store).unwrap();
    let json = snapshot::snapshot_to_json(&exported).unwrap();
    snapshot::reset_all(&store).unwrap();
    snapshot::import_snapshot(&store, &json).unwrap();

    let restored = snapshot::export_snapshot(&store).unwrap();
    assert_eq!(restored.users, exported.users);
    assert_eq!(restored.routines, exported.routines);
    assert_eq!(restored.daily_logs, exported.daily_logs);

    // The mutated log really came back
    let log = store.get_log("2026-08-26", &r1.id).unwrap().unwrap();
    assert_eq!((log.spent_minutes, log.done), (Some(40), true));
}

#[test]
fn import_with_dangling_routine_reference_succeeds() {
    let (store, _, _) = family_store();
    let json = r#"{
        "routines": [],
        "dailyLogs": [{
            "date": "2026-08-20",
            "routineId": "vanished",
            "userId": "also-vanished",
            "done": false,
            "updatedAt": "2026-08-20T07:00:00Z",
            "currentCount": 3
        }],
        "exportedAt": "2026-08-26T12:00:00Z"
    }"#;

    snapshot::import_snapshot(&store, json).unwrap();
    let log = store.get_log("2026-08-20", "vanished").unwrap().unwrap();
    assert_eq!(log.current_count, Some(3));
    assert!(store.list_users().unwrap().is_empty());
}

#[test]
fn streaks_are_scoped_per_user() {
    let (store, mina, juno) = family_store();
    let m = Routine::check(&mina.id, "Brush teeth", 0);
    let j = Routine::check(&juno.id, "Water plants", 0);
    store.insert_routine(&m).unwrap();
    store.insert_routine(&j).unwrap();

    for day in ["2026-08-24", "2026-08-25", "2026-08-26"] {
        daily::ensure_today_logs(&store, day).unwrap();
        daily::set_done(&store, day, &m.id, true).unwrap();
    }
    daily::set_done(&store, "2026-08-26", &j.id, true).unwrap();

    let days: Vec<String> = vec![
        "2026-08-26".to_string(),
        "2026-08-25".to_string(),
        "2026-08-24".to_string(),
    ];
    let mina_stats = daily::day_stats(&store, &mina.id, &days).unwrap();
    let juno_stats = daily::day_stats(&store, &juno.id, &days).unwrap();

    assert_eq!(daily::streak_from_stats(&mina_stats, "2026-08-26"), 3);
    assert_eq!(daily::streak_from_stats(&juno_stats, "2026-08-26"), 1);
    assert_eq!(
        juno_stats[1],
        DayStats {
            date: "2026-08-25".to_string(),
            completed: 0,
            total: 1
        }
    );
}
