//! daily-loop CLI: a thin shell over the routine-tracking core.
//!
//! State lives in a SQLite database under `$DAILY_LOOP_HOME` (default
//! `~/.daily-loop`). Every command opens the store, which migrates the
//! schema if needed, runs one operation, and exits — except `remind run`,
//! which keeps the reminder poll loop alive until interrupted.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use daily_loop::daily;
use daily_loop::date::{parse_day_key, recent_day_keys, today_key};
use daily_loop::models::{NotificationSettings, Routine, RoutineKind, User};
use daily_loop::notify::{self, LogNotifier, ReminderScheduler};
use daily_loop::ordering;
use daily_loop::snapshot;
use daily_loop::storage::{db_path, RoutinePatch, Store, UserPatch};
use daily_loop::{dlog, logging};

fn main() {
    logging::init();
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn data_dir() -> PathBuf {
    std::env::var("DAILY_LOOP_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".daily-loop"))
                .unwrap_or_else(|_| PathBuf::from(".daily-loop"))
        })
}

fn open_store() -> Result<Store, Box<dyn Error>> {
    let dir = data_dir();
    fs::create_dir_all(&dir)?;
    Ok(Store::open(&db_path(&dir))?)
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().collect::<Vec<String>>();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }
    let command = args[1].clone();
    let rest = args.split_off(2);

    match command.as_str() {
        "users" => users_command(&rest),
        "routines" => routines_command(&rest),
        "today" => today_command(&rest),
        "check" => check_command(&rest),
        "add-minutes" => progress_command(&rest, Progress::Minutes),
        "add-count" => progress_command(&rest, Progress::Count),
        "history" => history_command(&rest),
        "export" => export_command(&rest),
        "import" => import_command(&rest),
        "reset" => reset_command(),
        "remind" => remind_command(&rest),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!(
        "daily-loop <command>

  users    list | add <name> <emoji> | rename <id> <name> [emoji]
           | remove <id> | move-up <id> | move-down <id>
  routines list <user-id>
           | add <user-id> <title> [check|time <minutes>|count <reps>]
           | toggle <id> | remove <id> | move-up <id> | move-down <id>
  today        <user-id> [date]   show a day's logs (initializing them first;
                                  date is YYYY-MM-DD, default today)
  check        <routine-id>       toggle today's check-off
  add-minutes  <routine-id> <n>   record minutes on a timed routine
  add-count    <routine-id> <n>   record reps on a counted routine
  history      <user-id> [days]   recent completion and current streak
  export       [file]             write a backup snapshot
  import       <file>             replace the store from a snapshot
  reset                           clear all users, routines, and logs
  remind   show | on | off | at <HH:MM> | run

Data directory: $DAILY_LOOP_HOME (default ~/.daily-loop)"
    );
}

fn arg<'a>(args: &'a [String], i: usize, what: &str) -> Result<&'a str, Box<dyn Error>> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument: {what}").into())
}

fn users_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    match arg(args, 0, "subcommand")? {
        "list" => {
            for user in store.list_users()? {
                let streak = daily::streak(&store, &user.id, 30)?;
                println!("{} {} {}  (streak {streak})", user.id, user.emoji, user.name);
            }
        }
        "add" => {
            let name = arg(args, 1, "name")?;
            let emoji = arg(args, 2, "emoji")?;
            let user = User::new(name, emoji, store.next_user_sort_order()?);
            store.insert_user(&user)?;
            println!("{}", user.id);
        }
        "rename" => {
            let id = arg(args, 1, "user id")?;
            let patch = UserPatch {
                name: Some(arg(args, 2, "name")?.to_string()),
                emoji: args.get(3).cloned(),
            };
            store.update_user(id, &patch)?;
        }
        "remove" => {
            store.delete_user_cascade(arg(args, 1, "user id")?)?;
        }
        "move-up" => {
            ordering::move_user_up(&store, arg(args, 1, "user id")?)?;
        }
        "move-down" => {
            ordering::move_user_down(&store, arg(args, 1, "user id")?)?;
        }
        other => return Err(format!("unknown users subcommand: {other}").into()),
    }
    Ok(())
}

fn routines_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    match arg(args, 0, "subcommand")? {
        "list" => {
            let user_id = arg(args, 1, "user id")?;
            for r in store.list_routines_by_user(user_id)? {
                let target = match r.kind {
                    RoutineKind::Check => String::new(),
                    RoutineKind::Time => format!("  {} min", r.target_minutes.unwrap_or(0)),
                    RoutineKind::Count => format!("  x{}", r.target_count.unwrap_or(0)),
                };
                let state = if r.is_active { "" } else { "  [inactive]" };
                println!("{} {}{target}{state}", r.id, r.title);
            }
        }
        "add" => {
            let user_id = arg(args, 1, "user id")?;
            let title = arg(args, 2, "title")?;
            let sort = store.next_routine_sort_order(user_id)?;
            let routine = match args.get(3).map(String::as_str) {
                None | Some("check") => Routine::check(user_id, title, sort),
                Some("time") => {
                    let minutes: u32 = arg(args, 4, "target minutes")?.parse()?;
                    Routine::timed(user_id, title, sort, minutes)
                }
                Some("count") => {
                    let reps: u32 = arg(args, 4, "target count")?.parse()?;
                    Routine::counted(user_id, title, sort, reps)
                }
                Some(other) => return Err(format!("unknown routine kind: {other}").into()),
            };
            store.insert_routine(&routine)?;
            println!("{}", routine.id);
        }
        "toggle" => {
            let id = arg(args, 1, "routine id")?;
            let routine = store
                .get_routine(id)?
                .ok_or_else(|| format!("no routine {id}"))?;
            store.update_routine(
                id,
                &RoutinePatch {
                    is_active: Some(!routine.is_active),
                    ..Default::default()
                },
            )?;
        }
        "remove" => {
            store.delete_routine(arg(args, 1, "routine id")?)?;
        }
        "move-up" => {
            ordering::move_routine_up(&store, arg(args, 1, "routine id")?)?;
        }
        "move-down" => {
            ordering::move_routine_down(&store, arg(args, 1, "routine id")?)?;
        }
        other => return Err(format!("unknown routines subcommand: {other}").into()),
    }
    Ok(())
}

fn today_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let user_id = arg(args, 0, "user id")?;
    let day = match args.get(1) {
        Some(raw) => parse_day_key(raw)
            .map(daily_loop::date::day_key)
            .ok_or_else(|| format!("not a valid date: {raw}"))?,
        None => today_key(),
    };
    daily::ensure_today_logs(&store, &day)?;

    println!("{day}");
    let routines = store.list_active_routines_by_user(user_id)?;
    for routine in routines {
        let Some(log) = store.get_log(&day, &routine.id)? else {
            continue;
        };
        let mark = if log.done { "[x]" } else { "[ ]" };
        let progress = match routine.kind {
            RoutineKind::Check => String::new(),
            RoutineKind::Time => format!(
                "  {}/{} min",
                log.spent_minutes.unwrap_or(0),
                routine.target_minutes.unwrap_or(0)
            ),
            RoutineKind::Count => format!(
                "  {}/{}",
                log.current_count.unwrap_or(0),
                routine.target_count.unwrap_or(0)
            ),
        };
        println!("{mark} {}{progress}  ({})", routine.title, routine.id);
    }
    Ok(())
}

fn check_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let routine_id = arg(args, 0, "routine id")?;
    let today = today_key();
    daily::ensure_today_logs(&store, &today)?;
    let done = daily::toggle_done(&store, &today, routine_id)?;
    println!("{}", if done { "done" } else { "not done" });
    Ok(())
}

enum Progress {
    Minutes,
    Count,
}

fn progress_command(args: &[String], kind: Progress) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let routine_id = arg(args, 0, "routine id")?;
    let amount: u32 = arg(args, 1, "amount")?.parse()?;
    let today = today_key();
    daily::ensure_today_logs(&store, &today)?;
    let log = match kind {
        Progress::Minutes => daily::add_minutes(&store, &today, routine_id, amount)?,
        Progress::Count => daily::add_count(&store, &today, routine_id, amount)?,
    };
    println!(
        "{} ({})",
        if log.done { "done" } else { "in progress" },
        log.spent_minutes.or(log.current_count).unwrap_or(0)
    );
    Ok(())
}

fn history_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let user_id = arg(args, 0, "user id")?;
    let days: usize = args.get(1).map(|d| d.parse()).transpose()?.unwrap_or(14);

    let stats = daily::day_stats(&store, user_id, &recent_day_keys(days))?;
    for stat in &stats {
        println!("{}  {}/{}", stat.date, stat.completed, stat.total);
    }
    println!("streak: {}", daily::streak_from_stats(&stats, &today_key()));
    Ok(())
}

fn export_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let snapshot = snapshot::export_snapshot(&store)?;
    let json = snapshot::snapshot_to_json(&snapshot)?;
    let path = args
        .first()
        .cloned()
        .unwrap_or_else(|| snapshot::backup_file_name(&today_key()));
    fs::write(&path, json)?;
    println!("{path}");
    Ok(())
}

fn import_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    let json = fs::read_to_string(arg(args, 0, "snapshot file")?)?;
    snapshot::import_snapshot(&store, &json)?;
    Ok(())
}

fn reset_command() -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    snapshot::reset_all(&store)?;
    dlog!("store reset");
    Ok(())
}

fn remind_command(args: &[String]) -> Result<(), Box<dyn Error>> {
    let store = open_store()?;
    match arg(args, 0, "subcommand")? {
        "show" => {
            let settings = notify::load_settings(&store)?;
            let state = notify::phase(&settings, &today_key());
            println!(
                "enabled: {}  time: {}  last: {}  ({state:?})",
                settings.enabled,
                settings.time,
                settings.last_notified.as_deref().unwrap_or("-")
            );
        }
        "on" | "off" => {
            let mut settings = notify::load_settings(&store)?;
            settings.enabled = args[0] == "on";
            notify::save_settings(&store, &settings)?;
        }
        "at" => {
            let time = arg(args, 1, "HH:MM")?;
            if daily_loop::date::parse_clock(time).is_none() {
                return Err(format!("not a valid time: {time}").into());
            }
            let mut settings = notify::load_settings(&store)?;
            settings.time = time.to_string();
            notify::save_settings(&store, &settings)?;
        }
        "run" => {
            let settings = notify::load_settings(&store)?;
            if !settings.enabled {
                notify::save_settings(
                    &store,
                    &NotificationSettings {
                        enabled: true,
                        ..settings
                    },
                )?;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let shared = Arc::new(tokio::sync::Mutex::new(store));
                let scheduler = ReminderScheduler::start(shared, Arc::new(LogNotifier));
                dlog!("reminder loop running; press Ctrl-C to stop");
                let _ = tokio::signal::ctrl_c().await;
                scheduler.stop().await;
            });
        }
        other => return Err(format!("unknown remind subcommand: {other}").into()),
    }
    Ok(())
}
