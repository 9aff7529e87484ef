// main.rs

mod app;
mod config;
mod models;
mod notify;
mod parser;
mod reminder;
mod store;
mod ui;

use crate::app::App;
use crate::config::Config;
use crate::notify::{Notifier, ToastNotifier};
use crate::reminder::ReminderScanner;
use crate::store::{IdGen, TaskStore};
use crate::ui::run_app;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let store = TaskStore::new(IdGen::new());
    let snapshots = store.subscribe();

    let (notifier, toasts) = ToastNotifier::new(config.reminders.notifications.permission());
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);

    let mut scanner = ReminderScanner::start(
        snapshots,
        notifier,
        std::time::Duration::from_secs(config.reminders.tick_seconds),
        chrono::Duration::minutes(config.reminders.lead_minutes),
    );

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let app = App::new(store);

    let res = run_app(&mut terminal, app, toasts).await;

    // The timer must not outlive the UI that owns it.
    scanner.stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
