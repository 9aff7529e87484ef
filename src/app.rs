use crate::models::Task;
use crate::notify::Notification;
use crate::parser::{parse_due_date, parse_due_time, parse_title_input};
use crate::store::{TaskDraft, TaskStore};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;

pub struct App {
    pub store: TaskStore,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub tab: Tab,
    pub new_task_title: String,
    pub new_task_description: String,
    pub new_task_due_date: String,
    pub new_task_due_time: String,
    pub new_list_name: String,
    pub form_error: Option<String>,
    pub toast: Option<Notification>,
}

pub enum InputMode {
    Normal,
    EditingTask,
    EditingList,
    Insert,
}

#[derive(PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
    DueDate,
    DueTime,
    ListName,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tab {
    Pending,
    Completed,
}

impl App {
    pub fn new(store: TaskStore) -> App {
        let mut state = ListState::default();
        if store
            .selected_list()
            .is_some_and(|l| l.pending().next().is_some())
        {
            state.select(Some(0));
        } else {
            state.select(None);
        }
        App {
            store,
            state,
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            tab: Tab::Pending,
            new_task_title: String::new(),
            new_task_description: String::new(),
            new_task_due_date: String::new(),
            new_task_due_time: String::new(),
            new_list_name: String::new(),
            form_error: None,
            toast: None,
        }
    }

    /// Tasks of the selected list shown on the current tab.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let Some(list) = self.store.selected_list() else {
            return Vec::new();
        };
        match self.tab {
            Tab::Pending => list.pending().collect(),
            Tab::Completed => list.completed().collect(),
        }
    }

    pub fn push_toast(&mut self, notification: Notification) {
        self.toast = Some(notification);
    }

    fn selected_task_id(&self) -> Option<u64> {
        let tasks = self.visible_tasks();
        self.state.selected().and_then(|i| tasks.get(i)).map(|t| t.id)
    }

    /// Keep the highlight inside the visible range after a mutation or
    /// tab/list switch shrinks it.
    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.state.select(None);
        } else {
            match self.state.selected() {
                Some(i) if i < len => {}
                _ => self.state.select(Some(len.saturating_sub(1))),
            }
        }
    }

    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn next_list(&mut self) {
        let lists = self.store.lists();
        if lists.is_empty() {
            return;
        }
        let pos = lists
            .iter()
            .position(|l| l.id == self.store.selected_list_id())
            .unwrap_or(0);
        let next = lists[(pos + 1) % lists.len()].id;
        self.store.select_list(next);
        self.state.select(Some(0));
        self.clamp_selection();
    }

    pub fn previous_list(&mut self) {
        let lists = self.store.lists();
        if lists.is_empty() {
            return;
        }
        let pos = lists
            .iter()
            .position(|l| l.id == self.store.selected_list_id())
            .unwrap_or(0);
        let prev = lists[(pos + lists.len() - 1) % lists.len()].id;
        self.store.select_list(prev);
        self.state.select(Some(0));
        self.clamp_selection();
    }

    fn clear_task_form(&mut self) {
        self.new_task_title.clear();
        self.new_task_description.clear();
        self.new_task_due_date.clear();
        self.new_task_due_time.clear();
        self.form_error = None;
        self.active_input = ActiveInput::Title;
    }

    fn submit_task_form(&mut self) {
        if self.new_task_title.trim().is_empty() {
            // Guarded in the UI; an empty submit simply stays put.
            return;
        }

        let due_date = match parse_due_date(&self.new_task_due_date) {
            Ok(date) => date,
            Err(msg) => {
                self.form_error = Some(msg);
                return;
            }
        };
        let due_time = match parse_due_time(&self.new_task_due_time) {
            Ok(time) => time,
            Err(msg) => {
                self.form_error = Some(msg);
                return;
            }
        };

        let parsed = parse_title_input(&self.new_task_title);
        let description = if self.new_task_description.trim().is_empty() {
            None
        } else {
            Some(self.new_task_description.clone())
        };

        self.store.add_task(TaskDraft {
            title: parsed.title,
            description,
            due_date,
            due_time,
            priority: parsed.priority.unwrap_or_default(),
        });

        self.clear_task_form();
        self.input_mode = InputMode::Normal;
        self.clamp_selection();
    }

    fn submit_list_form(&mut self) {
        if self.new_list_name.trim().is_empty() {
            return;
        }
        self.store.add_list(&self.new_list_name);
        self.new_list_name.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Returns true when the app should quit.
    pub fn handle_input(&mut self, key: crossterm::event::KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('n') => self.next_list(),
                KeyCode::Char('p') => self.previous_list(),
                KeyCode::Tab | KeyCode::Char('t') => {
                    self.tab = match self.tab {
                        Tab::Pending => Tab::Completed,
                        Tab::Completed => Tab::Pending,
                    };
                    self.state.select(Some(0));
                    self.clamp_selection();
                }
                KeyCode::Char('a') => {
                    self.clear_task_form();
                    self.input_mode = InputMode::EditingTask;
                }
                KeyCode::Char('c') => {
                    self.new_list_name.clear();
                    self.active_input = ActiveInput::ListName;
                    self.input_mode = InputMode::EditingList;
                }
                KeyCode::Char('x') | KeyCode::Enter => {
                    if let Some(id) = self.selected_task_id() {
                        self.store.toggle_task(id);
                        self.clamp_selection();
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_task_id() {
                        self.store.delete_task(id);
                        self.clamp_selection();
                    }
                }
                KeyCode::Char('m') => {
                    let id = self.store.selected_list_id();
                    self.store.toggle_merge_mark(id);
                }
                KeyCode::Char('M') => {
                    self.store.merge_lists();
                    self.clamp_selection();
                }
                KeyCode::Esc => self.toast = None,
                _ => {}
            },

            InputMode::EditingTask => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::DueDate,
                        ActiveInput::DueDate => ActiveInput::DueTime,
                        ActiveInput::DueTime | ActiveInput::ListName => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => self.submit_task_form(),
                KeyCode::Esc => {
                    self.clear_task_form();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::EditingList => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Enter => self.submit_list_form(),
                KeyCode::Esc => {
                    self.new_list_name.clear();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::Insert => match key.code {
                KeyCode::Char(c) => {
                    self.form_error = None;
                    match self.active_input {
                        ActiveInput::Title => self.new_task_title.push(c),
                        ActiveInput::Description => self.new_task_description.push(c),
                        ActiveInput::DueDate => self.new_task_due_date.push(c),
                        ActiveInput::DueTime => self.new_task_due_time.push(c),
                        ActiveInput::ListName => self.new_list_name.push(c),
                    }
                }
                KeyCode::Backspace => {
                    self.form_error = None;
                    match self.active_input {
                        ActiveInput::Title => {
                            self.new_task_title.pop();
                        }
                        ActiveInput::Description => {
                            self.new_task_description.pop();
                        }
                        ActiveInput::DueDate => {
                            self.new_task_due_date.pop();
                        }
                        ActiveInput::DueTime => {
                            self.new_task_due_time.pop();
                        }
                        ActiveInput::ListName => {
                            self.new_list_name.pop();
                        }
                    }
                }
                KeyCode::Esc => {
                    self.input_mode = if self.active_input == ActiveInput::ListName {
                        InputMode::EditingList
                    } else {
                        InputMode::EditingTask
                    };
                }
                _ => {}
            },
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IdGen;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_input(key(KeyCode::Char(c)));
        }
    }

    fn app() -> App {
        App::new(TaskStore::new(IdGen::new()))
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('a')));
        app.handle_input(key(KeyCode::Char('i')));
        type_str(&mut app, "Write report !high");
        app.handle_input(key(KeyCode::Esc));
        app.handle_input(key(KeyCode::Enter));

        let list = app.store.selected_list().unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].title, "Write report");
        assert_eq!(list.tasks[0].priority, crate::models::Priority::High);
        assert!(matches!(app.input_mode, InputMode::Normal));
        assert!(app.new_task_title.is_empty());
    }

    #[test]
    fn test_bad_due_time_keeps_form_open_with_error() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('a')));
        app.handle_input(key(KeyCode::Char('i')));
        type_str(&mut app, "Report");
        app.handle_input(key(KeyCode::Esc));
        app.handle_input(key(KeyCode::Tab));
        app.handle_input(key(KeyCode::Tab));
        app.handle_input(key(KeyCode::Tab));
        app.handle_input(key(KeyCode::Char('i')));
        type_str(&mut app, "25:99");
        app.handle_input(key(KeyCode::Esc));
        app.handle_input(key(KeyCode::Enter));

        assert!(app.form_error.is_some());
        assert!(matches!(app.input_mode, InputMode::EditingTask));
        assert!(app.store.selected_list().unwrap().tasks.is_empty());
    }

    #[test]
    fn test_toggle_moves_task_between_tabs() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('a')));
        app.handle_input(key(KeyCode::Char('i')));
        type_str(&mut app, "Report");
        app.handle_input(key(KeyCode::Esc));
        app.handle_input(key(KeyCode::Enter));

        assert_eq!(app.visible_tasks().len(), 1);
        app.state.select(Some(0));
        app.handle_input(key(KeyCode::Char('x')));
        assert!(app.visible_tasks().is_empty());

        app.handle_input(key(KeyCode::Char('t')));
        assert_eq!(app.tab, Tab::Completed);
        assert_eq!(app.visible_tasks().len(), 1);
    }

    #[test]
    fn test_merge_keys_mark_and_merge() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('m')));
        app.handle_input(key(KeyCode::Char('n')));
        app.handle_input(key(KeyCode::Char('m')));
        app.handle_input(key(KeyCode::Char('M')));

        assert_eq!(app.store.lists().len(), 1);
        assert_eq!(app.store.lists()[0].name, "Merged: Personal, Work");
    }

    #[test]
    fn test_add_list_through_form() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('c')));
        app.handle_input(key(KeyCode::Char('i')));
        type_str(&mut app, "Groceries");
        app.handle_input(key(KeyCode::Esc));
        app.handle_input(key(KeyCode::Enter));

        assert_eq!(app.store.lists().len(), 3);
        assert_eq!(app.store.lists()[2].name, "Groceries");
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        assert!(app.handle_input(key(KeyCode::Char('q'))));
    }
}
