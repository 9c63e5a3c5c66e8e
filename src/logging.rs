//! File logger for the terminal UI. Stderr belongs to the alternate screen,
//! so log lines go to a file instead.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether debug output from this crate is let through.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}

/// Crate targets at info (debug when enabled), everything else at warn.
pub struct FileLogger {
    file: Mutex<File>,
}

impl FileLogger {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

fn own_target(target: &str) -> bool {
    target.starts_with("recall")
}

fn format_line(record: &Record) -> String {
    format!(
        "{} {:<5} {}: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target(),
        record.args()
    )
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if own_target(metadata.target()) {
            let max = if debug_logging() {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= LevelFilter::Warn
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "{}", format_line(record));
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

/// Installs the file logger as the global logger.
pub fn init(path: &Path, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    set_debug_logging(debug);
    log::set_boxed_logger(Box::new(FileLogger::open(path)?))?;
    // Global max must be Debug so the toggle can take effect at runtime
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}
