//! Daily reminder settings and the background poll loop.
//!
//! The reminder is a small state machine over the persisted settings blob:
//! `disabled`, `armed` (enabled, not yet fired today), `fired` (enabled,
//! already fired today). A fixed-cadence poll compares the wall clock against
//! the configured time; firing persists today's day key into `last_notified`,
//! which is what makes firing at-most-once per calendar day regardless of how
//! often the poll runs. A new day re-arms lazily on the next poll.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{oneshot, Mutex};

use crate::date::parse_clock;
use crate::dlog;
use crate::models::NotificationSettings;
use crate::storage::{Store, StoreError, NOTIFICATION_SETTINGS_KEY};

/// Poll cadence of the reminder loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Load the reminder settings, falling back to defaults when the blob is
/// absent or corrupt.
pub fn load_settings(store: &Store) -> Result<NotificationSettings, StoreError> {
    let settings = store
        .get_settings_blob(NOTIFICATION_SETTINGS_KEY)?
        .and_then(|blob| serde_json::from_str(&blob).ok())
        .unwrap_or_default();
    Ok(settings)
}

pub fn save_settings(store: &Store, settings: &NotificationSettings) -> Result<(), StoreError> {
    let blob = serde_json::to_string(settings)?;
    store.put_settings_blob(NOTIFICATION_SETTINGS_KEY, &blob)
}

/// Where the reminder currently stands for the given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPhase {
    Disabled,
    /// Enabled and not yet fired today.
    Armed,
    /// Enabled and already fired today.
    Fired,
}

pub fn phase(settings: &NotificationSettings, today: &str) -> ReminderPhase {
    if !settings.enabled {
        ReminderPhase::Disabled
    } else if settings.last_notified.as_deref() == Some(today) {
        ReminderPhase::Fired
    } else {
        ReminderPhase::Armed
    }
}

/// Whether an armed reminder should fire at wall-clock instant `now`:
/// enabled, not yet fired on `now`'s day, and past the configured time.
/// An unparseable time never fires.
pub fn should_fire(settings: &NotificationSettings, now: DateTime<Local>) -> bool {
    if !settings.enabled {
        return false;
    }
    let today = crate::date::day_key(now.date_naive());
    if settings.last_notified.as_deref() == Some(today.as_str()) {
        return false;
    }
    match parse_clock(&settings.time) {
        Some(target) => now.time() >= target,
        None => false,
    }
}

/// Record that today's reminder fired.
pub fn mark_notified(store: &Store, today: &str) -> Result<(), StoreError> {
    let mut settings = load_settings(store)?;
    settings.last_notified = Some(today.to_string());
    save_settings(store, &settings)
}

/// Delivery seam for the reminder. The CLI logs; a GUI shell would raise a
/// system notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes through the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        dlog!("reminder: {title} - {body}");
    }
}

const REMINDER_MESSAGES: &[(&str, &str)] = &[
    ("Good morning!", "Ready to start today's routines?"),
    ("A new day begins!", "Let's complete today's loop."),
    ("Check your goals!", "Your routines are waiting."),
    ("You've got this!", "Time to check off today's routines."),
];

/// Pick a reminder message. Rotates by wall-clock day so consecutive days
/// get different texts.
fn reminder_message(now: DateTime<Local>) -> (&'static str, &'static str) {
    let day = now.timestamp() / 86_400;
    REMINDER_MESSAGES[(day.rem_euclid(REMINDER_MESSAGES.len() as i64)) as usize]
}

/// One poll step: fire and persist if due. Idempotent within a day.
pub async fn poll_once(
    store: &Mutex<Store>,
    notifier: &dyn Notifier,
    now: DateTime<Local>,
) -> Result<bool, StoreError> {
    let store = store.lock().await;
    let settings = load_settings(&store)?;
    if !should_fire(&settings, now) {
        return Ok(false);
    }
    let (title, body) = reminder_message(now);
    notifier.notify(title, body);
    let today = crate::date::day_key(now.date_naive());
    mark_notified(&store, &today)?;
    dlog!("reminder fired for {today}");
    Ok(true)
}

/// Handle to the running reminder loop. [`ReminderScheduler::stop`] cancels
/// it and waits; merely dropping the handle also cancels it, since the
/// closed shutdown channel wakes the loop.
pub struct ReminderScheduler {
    shutdown: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl ReminderScheduler {
    /// Spawn the poll loop at the standard cadence.
    pub fn start(store: Arc<Mutex<Store>>, notifier: Arc<dyn Notifier>) -> Self {
        Self::start_with_interval(store, notifier, POLL_INTERVAL)
    }

    /// Spawn the poll loop with an explicit cadence (tests use a short one).
    pub fn start_with_interval(
        store: Arc<Mutex<Store>>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = poll_once(&store, notifier.as_ref(), Local::now()).await {
                    dlog!("reminder poll failed: {e}");
                }
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });
        Self {
            shutdown: shutdown_tx,
            handle,
        }
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 8, 26, hour, minute, 0)
            .unwrap()
    }

    fn enabled_at(time: &str) -> NotificationSettings {
        NotificationSettings {
            enabled: true,
            time: time.to_string(),
            last_notified: None,
        }
    }

    #[test]
    fn disabled_never_fires() {
        let settings = NotificationSettings::default();
        assert!(!should_fire(&settings, at(23, 59)));
        assert_eq!(phase(&settings, "2026-08-26"), ReminderPhase::Disabled);
    }

    #[test]
    fn fires_only_at_or_after_configured_time() {
        let settings = enabled_at("08:00");
        assert!(!should_fire(&settings, at(7, 59)));
        assert!(should_fire(&settings, at(8, 0)));
        assert!(should_fire(&settings, at(21, 30)));
    }

    #[test]
    fn already_fired_today_suppresses() {
        let mut settings = enabled_at("08:00");
        settings.last_notified = Some("2026-08-26".to_string());
        assert!(!should_fire(&settings, at(9, 0)));
        assert_eq!(phase(&settings, "2026-08-26"), ReminderPhase::Fired);

        // A new day re-arms lazily
        assert_eq!(phase(&settings, "2026-08-27"), ReminderPhase::Armed);
        settings.last_notified = Some("2026-08-25".to_string());
        assert!(should_fire(&settings, at(9, 0)));
    }

    #[test]
    fn malformed_time_never_fires() {
        let settings = enabled_at("late morning");
        assert!(!should_fire(&settings, at(23, 0)));
    }

    #[test]
    fn settings_round_trip_and_corrupt_blob_falls_back() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(load_settings(&store).unwrap(), NotificationSettings::default());

        let settings = enabled_at("21:15");
        save_settings(&store, &settings).unwrap();
        assert_eq!(load_settings(&store).unwrap(), settings);

        store
            .put_settings_blob(NOTIFICATION_SETTINGS_KEY, "{broken")
            .unwrap();
        assert_eq!(load_settings(&store).unwrap(), NotificationSettings::default());
    }

    struct RecordingNotifier(std::sync::Mutex<Vec<String>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, _body: &str) {
            self.0.lock().unwrap().push(title.to_string());
        }
    }

    #[tokio::test]
    async fn poll_fires_at_most_once_per_day() {
        let store = Mutex::new(Store::open_in_memory().unwrap());
        {
            let s = store.lock().await;
            save_settings(&s, &enabled_at("00:00")).unwrap();
        }
        let notifier = RecordingNotifier(std::sync::Mutex::new(Vec::new()));

        assert!(poll_once(&store, &notifier, at(8, 0)).await.unwrap());
        assert!(!poll_once(&store, &notifier, at(8, 1)).await.unwrap());
        assert!(!poll_once(&store, &notifier, at(23, 59)).await.unwrap());
        assert_eq!(notifier.0.lock().unwrap().len(), 1);

        let s = store.lock().await;
        assert_eq!(
            load_settings(&s).unwrap().last_notified.as_deref(),
            Some("2026-08-26")
        );
    }

    #[tokio::test]
    async fn scheduler_start_stop() {
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
        let notifier = Arc::new(LogNotifier);
        let scheduler = ReminderScheduler::start_with_interval(
            store,
            notifier,
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        scheduler.stop().await;
    }
}
