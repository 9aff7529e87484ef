use chrono::{DateTime, Local, NaiveDate, NaiveTime};

// Task struct
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub priority: Priority,
    pub list_id: u64,
    pub created_at: DateTime<Local>,
}

// TaskList struct owning its tasks in insertion order
#[derive(Clone, Debug, PartialEq)]
pub struct TaskList {
    pub id: u64,
    pub name: String,
    pub color: ListColor,
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| !task.completed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.completed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "med",
            Priority::High => "high",
        }
    }
}

/// Visual tag for a list. New lists rotate through [`COLOR_PALETTE`];
/// merged lists always get the default tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListColor {
    #[default]
    Blue,
    Green,
    Yellow,
    Magenta,
    Cyan,
}

pub const COLOR_PALETTE: [ListColor; 5] = [
    ListColor::Blue,
    ListColor::Green,
    ListColor::Yellow,
    ListColor::Magenta,
    ListColor::Cyan,
];
