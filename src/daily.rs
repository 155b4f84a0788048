//! Daily log initialization and progress recording.
//!
//! [`ensure_today_logs`] runs once per session before any "today" view is
//! read: it guarantees exactly one log per active routine per user for the
//! given day. The mutation helpers implement the progress rules (a timed
//! routine is done once its minutes reach the target, a counted one once its
//! count does, and neither ever un-completes by overshooting).

use crate::dlog;
use crate::models::{DailyLog, RoutineKind};
use crate::storage::{LogPatch, Store, StoreError};

/// Ensure a zero-progress log exists for every active routine of every user
/// on `day`. Existing logs are never touched, so repeat calls are free, and
/// logs belonging to since-deactivated routines survive. A concurrent
/// initializer in another process may win the insert race; its duplicate is
/// accepted silently.
pub fn ensure_today_logs(store: &Store, day: &str) -> Result<usize, StoreError> {
    let mut created = 0;
    for routine in store.list_active_routines()? {
        if store.get_log(day, &routine.id)?.is_some() {
            continue;
        }
        match store.insert_log(&DailyLog::fresh(day, &routine)) {
            Ok(()) => created += 1,
            Err(StoreError::DuplicateKey(_)) => {}
            Err(e) => return Err(e),
        }
    }
    if created > 0 {
        dlog!("initialized {created} log(s) for {day}");
    }
    Ok(created)
}

/// Set the done flag on a log directly (check-off routines).
pub fn set_done(store: &Store, day: &str, routine_id: &str, done: bool) -> Result<(), StoreError> {
    store.update_log(
        day,
        routine_id,
        &LogPatch {
            done: Some(done),
            ..Default::default()
        },
    )
}

/// Flip the done flag on a log.
pub fn toggle_done(store: &Store, day: &str, routine_id: &str) -> Result<bool, StoreError> {
    let log = store
        .get_log(day, routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("log ({day}, {routine_id})")))?;
    let done = !log.done;
    set_done(store, day, routine_id, done)?;
    Ok(done)
}

/// Add minutes to a timed routine's log. The log completes when the
/// accumulated minutes reach the target and stays complete past it.
pub fn add_minutes(
    store: &Store,
    day: &str,
    routine_id: &str,
    minutes: u32,
) -> Result<DailyLog, StoreError> {
    let routine = store
        .get_routine(routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("routine {routine_id}")))?;
    if routine.kind != RoutineKind::Time {
        return Err(StoreError::InvalidFormat(format!(
            "routine {routine_id} is not time-based"
        )));
    }
    let log = store
        .get_log(day, routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("log ({day}, {routine_id})")))?;

    let spent = log.spent_minutes.unwrap_or(0).saturating_add(minutes);
    let target = routine.target_minutes.unwrap_or(0);
    store.update_log(
        day,
        routine_id,
        &LogPatch {
            done: Some(spent >= target),
            spent_minutes: Some(spent),
            ..Default::default()
        },
    )?;
    store
        .get_log(day, routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("log ({day}, {routine_id})")))
}

/// Add repetitions to a counted routine's log; completion mirrors
/// [`add_minutes`].
pub fn add_count(
    store: &Store,
    day: &str,
    routine_id: &str,
    n: u32,
) -> Result<DailyLog, StoreError> {
    let routine = store
        .get_routine(routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("routine {routine_id}")))?;
    if routine.kind != RoutineKind::Count {
        return Err(StoreError::InvalidFormat(format!(
            "routine {routine_id} is not count-based"
        )));
    }
    let log = store
        .get_log(day, routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("log ({day}, {routine_id})")))?;

    let count = log.current_count.unwrap_or(0).saturating_add(n);
    let target = routine.target_count.unwrap_or(0);
    store.update_log(
        day,
        routine_id,
        &LogPatch {
            done: Some(count >= target),
            current_count: Some(count),
            ..Default::default()
        },
    )?;
    store
        .get_log(day, routine_id)?
        .ok_or_else(|| StoreError::NotFound(format!("log ({day}, {routine_id})")))
}

/// Completion summary for one day of one user's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStats {
    pub date: String,
    pub completed: usize,
    pub total: usize,
}

/// Per-day completion counts for `user_id` over the given days. Only logs of
/// currently active routines count, so deactivating a routine also removes it
/// from past totals.
pub fn day_stats(store: &Store, user_id: &str, days: &[String]) -> Result<Vec<DayStats>, StoreError> {
    let active_ids: std::collections::HashSet<String> = store
        .list_active_routines_by_user(user_id)?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let mut stats = Vec::with_capacity(days.len());
    for day in days {
        let logs = store.list_logs_for_user_on(day, user_id)?;
        let counted: Vec<&DailyLog> = logs
            .iter()
            .filter(|l| active_ids.contains(&l.routine_id))
            .collect();
        stats.push(DayStats {
            date: day.clone(),
            completed: counted.iter().filter(|l| l.done).count(),
            total: counted.len(),
        });
    }
    Ok(stats)
}

/// Consecutive fully-completed days for `user_id`, walking `stats` from the
/// newest day backwards. A day with nothing to do is neutral when it is
/// `today` (the day just started) and breaks the run otherwise; an
/// incomplete day always breaks it.
pub fn streak_from_stats(stats: &[DayStats], today: &str) -> usize {
    let mut streak = 0;
    for stat in stats {
        if stat.total == 0 {
            if stat.date == today {
                continue;
            }
            break;
        }
        if stat.completed == stat.total {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Streak over the most recent `window` days ending today.
pub fn streak(store: &Store, user_id: &str, window: usize) -> Result<usize, StoreError> {
    let days = crate::date::recent_day_keys(window);
    let stats = day_stats(store, user_id, &days)?;
    Ok(streak_from_stats(&stats, &crate::date::today_key()))
}
