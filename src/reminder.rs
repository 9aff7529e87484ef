use crate::models::{Task, TaskList};
use crate::notify::{Notification, Notifier, Permission};
use chrono::{DateTime, Duration, Local, TimeZone};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_TICK_SECONDS: u64 = 60;
pub const DEFAULT_LEAD_MINUTES: i64 = 5;

/// The local instant a task is due, if it has both due fields. A time
/// skipped by a DST jump yields nothing rather than a guess.
pub fn due_instant(task: &Task) -> Option<DateTime<Local>> {
    let date = task.due_date?;
    let time = task.due_time?;
    Local.from_local_datetime(&date.and_time(time)).single()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reminder {
    pub task_id: u64,
    pub title: String,
    pub due: DateTime<Local>,
}

/// One pass over a state snapshot: collect a reminder for every
/// incomplete task whose due instant lies inside `(now, now + lead]`.
///
/// `sent` holds `(task id, due timestamp)` keys for reminders already
/// collected, so a task sitting in the window across several ticks
/// fires once per due instant, not once per tick. Keys whose task is
/// gone from the snapshot are pruned on every pass, which keeps the set
/// bounded by the live task count.
pub fn scan(
    lists: &[TaskList],
    now: DateTime<Local>,
    lead: Duration,
    sent: &mut HashSet<(u64, i64)>,
) -> Vec<Reminder> {
    let live: HashSet<u64> = lists
        .iter()
        .flat_map(|l| l.tasks.iter().map(|t| t.id))
        .collect();
    sent.retain(|(task_id, _)| live.contains(task_id));

    let mut reminders = Vec::new();
    for list in lists {
        for task in &list.tasks {
            if task.completed {
                continue;
            }
            let Some(due) = due_instant(task) else {
                continue;
            };

            let delta = due - now;
            if delta <= Duration::zero() || delta > lead {
                continue;
            }

            let key = (task.id, due.timestamp());
            if sent.insert(key) {
                reminders.push(Reminder {
                    task_id: task.id,
                    title: task.title.clone(),
                    due,
                });
            }
        }
    }
    reminders
}

/// Periodic due-time scanner. Idle until `start`, scanning until `stop`
/// or drop; the spawned timer task never outlives the scanner that owns
/// it.
pub struct ReminderScanner {
    handle: Option<JoinHandle<()>>,
}

impl ReminderScanner {
    /// Spawn the timer task. If the notifier has never been asked for
    /// permission, ask once up front; a denied or unsupported answer
    /// just turns emission into a no-op, the scan itself keeps running.
    pub fn start(
        snapshots: watch::Receiver<Vec<TaskList>>,
        notifier: Arc<dyn Notifier>,
        tick: std::time::Duration,
        lead: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            if notifier.permission() == Permission::Default {
                notifier.request_permission();
            }

            let mut sent = HashSet::new();
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let lists = snapshots.borrow().clone();
                let reminders = scan(&lists, Local::now(), lead, &mut sent);
                if notifier.permission() != Permission::Granted {
                    continue;
                }
                for reminder in reminders {
                    notifier.notify(Notification {
                        title: format!("Task reminder: {}", reminder.title),
                        body: format!("Due in {} minutes", lead.num_minutes()),
                    });
                }
            }
        });

        ReminderScanner {
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ReminderScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListColor, Priority};
    use crate::notify::testing::RecordingNotifier;
    use crate::store::{IdGen, TaskDraft, TaskStore};

    fn lead() -> Duration {
        Duration::minutes(DEFAULT_LEAD_MINUTES)
    }

    fn task_due(id: u64, title: &str, due: DateTime<Local>, completed: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            completed,
            due_date: Some(due.date_naive()),
            due_time: Some(due.time()),
            priority: Priority::Medium,
            list_id: 1,
            created_at: Local::now(),
        }
    }

    fn single_list(tasks: Vec<Task>) -> Vec<TaskList> {
        vec![TaskList {
            id: 1,
            name: "Inbox".to_string(),
            color: ListColor::default(),
            tasks,
        }]
    }

    #[test]
    fn test_task_inside_window_fires_once_with_title() {
        let now = Local::now();
        let lists = single_list(vec![task_due(7, "Report", now + Duration::minutes(3), false)]);
        let mut sent = HashSet::new();

        let reminders = scan(&lists, now, lead(), &mut sent);

        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].task_id, 7);
        assert_eq!(reminders[0].title, "Report");
    }

    #[test]
    fn test_completed_task_never_fires() {
        let now = Local::now();
        let lists = single_list(vec![task_due(7, "Report", now + Duration::minutes(3), true)]);
        let mut sent = HashSet::new();

        assert!(scan(&lists, now, lead(), &mut sent).is_empty());
    }

    #[test]
    fn test_task_outside_window_never_fires() {
        let now = Local::now();
        let lists = single_list(vec![
            task_due(1, "Far", now + Duration::minutes(10), false),
            task_due(2, "Past", now - Duration::minutes(1), false),
            task_due(3, "Now", now, false),
        ]);
        let mut sent = HashSet::new();

        assert!(scan(&lists, now, lead(), &mut sent).is_empty());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Local::now();
        let lists = single_list(vec![task_due(1, "Edge", now + lead(), false)]);
        let mut sent = HashSet::new();

        assert_eq!(scan(&lists, now, lead(), &mut sent).len(), 1);
    }

    #[test]
    fn test_task_without_both_due_fields_is_skipped() {
        let now = Local::now();
        let mut dateless = task_due(1, "NoDate", now + Duration::minutes(2), false);
        dateless.due_date = None;
        let mut timeless = task_due(2, "NoTime", now + Duration::minutes(2), false);
        timeless.due_time = None;
        let lists = single_list(vec![dateless, timeless]);
        let mut sent = HashSet::new();

        assert!(scan(&lists, now, lead(), &mut sent).is_empty());
    }

    #[test]
    fn test_repeat_scans_are_suppressed() {
        let now = Local::now();
        let lists = single_list(vec![task_due(7, "Report", now + Duration::minutes(4), false)]);
        let mut sent = HashSet::new();

        assert_eq!(scan(&lists, now, lead(), &mut sent).len(), 1);
        // Same task, one tick later, still inside the window.
        let later = now + Duration::minutes(1);
        assert!(scan(&lists, later, lead(), &mut sent).is_empty());
    }

    #[test]
    fn test_rescheduled_due_instant_fires_again() {
        let now = Local::now();
        let first_due = now + Duration::minutes(2);
        let lists = single_list(vec![task_due(7, "Report", first_due, false)]);
        let mut sent = HashSet::new();
        assert_eq!(scan(&lists, now, lead(), &mut sent).len(), 1);

        // Same task id with a new due instant is a fresh reminder.
        let lists = single_list(vec![task_due(7, "Report", first_due + Duration::minutes(2), false)]);
        assert_eq!(scan(&lists, now, lead(), &mut sent).len(), 1);
    }

    #[test]
    fn test_sent_keys_pruned_for_deleted_tasks() {
        let now = Local::now();
        let lists = single_list(vec![task_due(7, "Report", now + Duration::minutes(3), false)]);
        let mut sent = HashSet::new();
        scan(&lists, now, lead(), &mut sent);
        assert_eq!(sent.len(), 1);

        scan(&single_list(Vec::new()), now, lead(), &mut sent);
        assert!(sent.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanner_emits_through_notifier_once() {
        let mut store = TaskStore::empty(IdGen::new());
        store.add_list("Inbox");
        let due = Local::now() + Duration::minutes(3);
        store.add_task(TaskDraft {
            title: "Report".to_string(),
            due_date: Some(due.date_naive()),
            due_time: Some(due.time()),
            ..TaskDraft::default()
        });

        let notifier = Arc::new(RecordingNotifier::granted());
        let mut scanner = ReminderScanner::start(
            store.subscribe(),
            notifier.clone(),
            std::time::Duration::from_secs(DEFAULT_TICK_SECONDS),
            lead(),
        );

        // Several virtual tick periods; suppression holds it to one.
        tokio::time::sleep(std::time::Duration::from_secs(3 * DEFAULT_TICK_SECONDS)).await;
        scanner.stop();

        assert_eq!(notifier.titles(), vec!["Task reminder: Report".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanner_denied_permission_emits_nothing() {
        let mut store = TaskStore::empty(IdGen::new());
        store.add_list("Inbox");
        let due = Local::now() + Duration::minutes(3);
        store.add_task(TaskDraft {
            title: "Report".to_string(),
            due_date: Some(due.date_naive()),
            due_time: Some(due.time()),
            ..TaskDraft::default()
        });

        let notifier = Arc::new(RecordingNotifier::denied());
        let mut scanner = ReminderScanner::start(
            store.subscribe(),
            notifier.clone(),
            std::time::Duration::from_secs(DEFAULT_TICK_SECONDS),
            lead(),
        );

        tokio::time::sleep(std::time::Duration::from_secs(2 * DEFAULT_TICK_SECONDS)).await;
        scanner.stop();

        assert!(notifier.titles().is_empty());
    }
}
