//! Record types shared by the store and the services built on it.
//!
//! Field names serialize as camelCase so exported snapshots and the persisted
//! settings blob keep the application's historical JSON shape.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family-member profile. Owns its routines and, through them, its logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub sort_order: i64,
    pub created_at: String,
}

impl User {
    pub fn new(name: &str, emoji: &str, sort_order: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            sort_order,
            created_at: now_iso(),
        }
    }
}

/// Discriminates how progress on a routine is recorded. Fixed at creation;
/// nothing moves a routine between kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Check,
    Time,
    Count,
}

impl RoutineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutineKind::Check => "check",
            RoutineKind::Time => "time",
            RoutineKind::Count => "count",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "check" => Some(RoutineKind::Check),
            "time" => Some(RoutineKind::Time),
            "count" => Some(RoutineKind::Count),
            _ => None,
        }
    }
}

/// A task a user tracks daily. `target_minutes` is set iff `kind` is `Time`,
/// `target_count` iff `kind` is `Count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
    #[serde(rename = "type")]
    pub kind: RoutineKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
}

impl Routine {
    /// A check-off routine.
    pub fn check(user_id: &str, title: &str, sort_order: i64) -> Self {
        Self::with_kind(user_id, title, sort_order, RoutineKind::Check, None, None)
    }

    /// A timed routine with a minutes target.
    pub fn timed(user_id: &str, title: &str, sort_order: i64, target_minutes: u32) -> Self {
        Self::with_kind(
            user_id,
            title,
            sort_order,
            RoutineKind::Time,
            Some(target_minutes),
            None,
        )
    }

    /// A counted routine with a repetition target.
    pub fn counted(user_id: &str, title: &str, sort_order: i64, target_count: u32) -> Self {
        Self::with_kind(
            user_id,
            title,
            sort_order,
            RoutineKind::Count,
            None,
            Some(target_count),
        )
    }

    fn with_kind(
        user_id: &str,
        title: &str,
        sort_order: i64,
        kind: RoutineKind,
        target_minutes: Option<u32>,
        target_count: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            is_active: true,
            sort_order,
            created_at: now_iso(),
            kind,
            target_minutes,
            target_count,
        }
    }
}

/// One day's progress on one routine. Keyed by `(date, routine_id)`;
/// `user_id` is denormalized from the owning routine for per-user queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: String,
    pub routine_id: String,
    pub user_id: String,
    pub done: bool,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u32>,
}

impl DailyLog {
    /// The zero-progress log the initializer creates for `routine` on `date`.
    pub fn fresh(date: &str, routine: &Routine) -> Self {
        Self {
            date: date.to_string(),
            routine_id: routine.id.clone(),
            user_id: routine.user_id.clone(),
            done: false,
            updated_at: now_iso(),
            spent_minutes: (routine.kind == RoutineKind::Time).then_some(0),
            current_count: (routine.kind == RoutineKind::Count).then_some(0),
        }
    }
}

/// A full-store export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub daily_logs: Vec<DailyLog>,
    /// Absent in hand-rolled or stripped backups; exports always set it.
    #[serde(default)]
    pub exported_at: String,
}

/// Daily reminder configuration, persisted as one JSON blob under the
/// `dailyNotificationSettings` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    /// 24-hour wall-clock time, `"HH:MM"`.
    pub time: String,
    /// Day key of the last fired reminder.
    pub last_notified: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "08:00".to_string(),
            last_notified: None,
        }
    }
}

/// Current wall-clock time as an ISO-8601 string, as stored in
/// `created_at`/`updated_at` fields.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
