// Re-export library modules so binary-internal modules can use crate::sync:: and crate::error::
pub(crate) use blockdoc::{block, editor, error, slash, sync};

mod app;
mod config;
mod edit_buffer;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};

use config::AppConfig;
use env_logger::{Env, Target};
use sync::SyncStatus;

const DEFAULT_DOCUMENT: &str = "scratch";

fn config_path() -> PathBuf {
    AppConfig::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

/// Logs go to a file next to the config; the terminal belongs to the UI.
fn init_logging(dir: &Path) {
    let Ok(file) = File::create(dir.join("blockdoc.log")) else {
        return;
    };
    let _ = env_logger::Builder::from_env(Env::default().filter_or("BLOCKDOC_LOG", "warn"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();

    if !path.exists() {
        AppConfig::write_default(&path)?;
        eprintln!(
            "Created default config at: {}\nEdit it to pick a store backend, then run again.",
            path.display()
        );
        return Ok(());
    }

    let config = match AppConfig::load_from_path(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            eprintln!("Fix the config file or delete it to regenerate defaults.");
            return Ok(());
        }
    };

    if let Some(dir) = path.parent() {
        init_logging(dir);
    }

    let document_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string());
    log::info!("opening document {}", document_id);

    let mut terminal = ratatui::init();

    // Enable enhanced keyboard protocol (reports Shift+Enter on supported terminals)
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
        )
    );

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        ratatui::restore();
        hook(info);
    }));

    let result = app::run(&config, &document_id, &mut terminal).await;

    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PopKeyboardEnhancementFlags
    );
    ratatui::restore();

    match result {
        Ok(SyncStatus::Failed(notice)) => {
            eprintln!("{}: {}", notice.title, notice.message);
            eprintln!("{}", notice.hint);
        }
        Ok(SyncStatus::Pending) => eprintln!("Some changes were not saved."),
        Ok(SyncStatus::Saved) => {}
        Err(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}
