// main.rs

mod tui;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use recall::app::{App, HttpEngine};
use recall::config;
use recall::{RemoteClient, SyncEngine, logging};
use std::io::{self};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config();

    // Write out the defaults on first run so there is a file to edit.
    if let Ok(path) = config::config_path() {
        if !path.exists() {
            if let Err(e) = config::save_config(&config::RecallConfig::default()) {
                eprintln!("Failed to write {}: {}", path.display(), e);
            }
        }
    }

    match config::log_path() {
        Ok(path) => {
            if let Err(e) = logging::init(&path, cfg.debug_logging) {
                eprintln!("Logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("Logging disabled: {}", e),
    }

    let remote = RemoteClient::from_config(&cfg)?;
    info!(
        "starting against {} ({} / {})",
        remote.base_url, cfg.active_collection, cfg.archived_collection
    );
    let engine: HttpEngine = SyncEngine::new(remote.active(), remote.archived());
    let mut app = App::new(engine);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Fetch both lists before the first frame
    app.load();

    // Run the TUI event loop (blocks until exit)
    let res = tui::run_app(&mut terminal, &mut app);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Application error: {}", err);
    }
    log::logger().flush();

    Ok(())
}
