use crate::models::{ListColor, Priority, Task, TaskList, COLOR_PALETTE};
use chrono::{Local, NaiveDate, NaiveTime};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Monotonic id source shared by tasks and lists. Injected into the
/// store so rapid successive creations can never collide the way
/// wall-clock ids can.
#[derive(Debug)]
pub struct IdGen {
    next: AtomicU64,
}

impl IdGen {
    pub fn new() -> Self {
        IdGen {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields collected by the add-task form. Everything but the title is
/// optional; the store fills in id, completion state, and timestamps.
#[derive(Clone, Debug, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub priority: Priority,
}

/// In-memory collection of task lists. All mutations run synchronously
/// on the owning thread; after each one the full list state is published
/// over a watch channel so the reminder scanner always sees the latest
/// snapshot without ever touching the store itself.
pub struct TaskStore {
    lists: Vec<TaskList>,
    selected_list_id: u64,
    merge_selection: Vec<u64>,
    ids: IdGen,
    snapshot_tx: watch::Sender<Vec<TaskList>>,
}

impl TaskStore {
    /// Store seeded with the two starter lists, first one selected.
    pub fn new(ids: IdGen) -> Self {
        let mut store = Self::empty(ids);
        store.add_list("Personal");
        store.add_list("Work");
        store.selected_list_id = store.lists[0].id;
        store
    }

    pub fn empty(ids: IdGen) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        TaskStore {
            lists: Vec::new(),
            selected_list_id: 0,
            merge_selection: Vec::new(),
            ids,
            snapshot_tx,
        }
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn selected_list_id(&self) -> u64 {
        self.selected_list_id
    }

    pub fn selected_list(&self) -> Option<&TaskList> {
        self.lists.iter().find(|l| l.id == self.selected_list_id)
    }

    pub fn select_list(&mut self, list_id: u64) {
        if self.lists.iter().any(|l| l.id == list_id) {
            self.selected_list_id = list_id;
        }
    }

    /// Receiver for read-only state snapshots, one per mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TaskList>> {
        self.snapshot_tx.subscribe()
    }

    /// Append a new task to the selected list. A blank title makes the
    /// whole call a no-op; the caller is expected to disable its submit
    /// control, so nothing is reported back.
    pub fn add_task(&mut self, draft: TaskDraft) {
        let title = draft.title.trim();
        if title.is_empty() {
            return;
        }

        let task = Task {
            id: self.ids.next_id(),
            title: title.to_string(),
            description: draft
                .description
                .filter(|d| !d.trim().is_empty()),
            completed: false,
            due_date: draft.due_date,
            due_time: draft.due_time,
            priority: draft.priority,
            list_id: self.selected_list_id,
            created_at: Local::now(),
        };

        let Some(list) = self.lists.iter_mut().find(|l| l.id == task.list_id) else {
            return;
        };
        list.tasks.push(task);
        self.publish();
    }

    /// Flip completion wherever the task lives. Unknown ids are ignored,
    /// which keeps retries harmless.
    pub fn toggle_task(&mut self, task_id: u64) {
        let task = self
            .lists
            .iter_mut()
            .flat_map(|l| l.tasks.iter_mut())
            .find(|t| t.id == task_id);
        if let Some(task) = task {
            task.completed = !task.completed;
        } else {
            return;
        }
        self.publish();
    }

    pub fn delete_task(&mut self, task_id: u64) {
        let hit = self
            .lists
            .iter_mut()
            .find_map(|l| {
                l.tasks
                    .iter()
                    .position(|t| t.id == task_id)
                    .map(|pos| (l, pos))
            });
        let Some((list, pos)) = hit else {
            return;
        };
        list.tasks.remove(pos);
        self.publish();
    }

    /// Create an empty list, rotating through the color palette by the
    /// current list count. Blank names are a no-op.
    pub fn add_list(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let color = COLOR_PALETTE[self.lists.len() % COLOR_PALETTE.len()];
        let list = TaskList {
            id: self.ids.next_id(),
            name: name.to_string(),
            color,
            tasks: Vec::new(),
        };

        if self.lists.is_empty() {
            self.selected_list_id = list.id;
        }
        self.lists.push(list);
        self.publish();
    }

    pub fn merge_selection(&self) -> &[u64] {
        &self.merge_selection
    }

    pub fn is_marked_for_merge(&self, list_id: u64) -> bool {
        self.merge_selection.contains(&list_id)
    }

    pub fn toggle_merge_mark(&mut self, list_id: u64) {
        if let Some(pos) = self.merge_selection.iter().position(|id| *id == list_id) {
            self.merge_selection.remove(pos);
        } else if self.lists.iter().any(|l| l.id == list_id) {
            self.merge_selection.push(list_id);
        }
    }

    /// Merge every marked list into one. Needs at least two marks,
    /// otherwise nothing happens. Source tasks are concatenated in store
    /// order of the sources, then insertion order within each source,
    /// and each moved task's `list_id` is rewritten to the merged list
    /// so the back-reference invariant survives the move. The mark set
    /// is cleared either way once a merge runs.
    pub fn merge_lists(&mut self) {
        if self.merge_selection.len() < 2 {
            return;
        }

        let merged_id = self.ids.next_id();
        let mut names = Vec::new();
        let mut tasks = Vec::new();
        let mut kept = Vec::with_capacity(self.lists.len());

        for list in self.lists.drain(..) {
            if self.merge_selection.contains(&list.id) {
                names.push(list.name);
                for mut task in list.tasks {
                    task.list_id = merged_id;
                    tasks.push(task);
                }
            } else {
                kept.push(list);
            }
        }

        let merged = TaskList {
            id: merged_id,
            name: format!("Merged: {}", names.join(", ")),
            color: ListColor::default(),
            tasks,
        };

        kept.push(merged);
        self.lists = kept;
        self.merge_selection.clear();

        // The selected list may have been one of the sources.
        if !self.lists.iter().any(|l| l.id == self.selected_list_id) {
            self.selected_list_id = merged_id;
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.lists.clone());
    }
}
