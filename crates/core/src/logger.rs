//! Process-wide logger writing `logs/app.log` and, once wired, feeding the
//! terminal UI over a channel.
//!
//! Until [`init`] runs every call is a silent no-op; unit tests never
//! initialise it.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{mpsc, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;

/// Colour indices carried in UI lines; the tui crate maps them to colours.
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;
pub const COLOR_GREEN: u8 = 3;

/// UI line field separator.
pub const FIELD_SEP: char = '\x1f';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

struct Sink {
    file: File,
    ui_tx: Option<mpsc::Sender<String>>,
    colors: HashMap<String, u8>,
}

static SINK: OnceLock<Mutex<Sink>> = OnceLock::new();

/// Open `log_dir/app.log`. The previous session's file is kept as
/// `app.prev.log` so a run that ended in a disconnect can still be read.
pub fn init(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;
    let path = log_dir.join("app.log");
    if path.exists() {
        fs::rename(&path, log_dir.join("app.prev.log")).ok();
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    SINK.set(Mutex::new(Sink { file, ui_tx: None, colors: HashMap::new() })).ok();
    Ok(())
}

pub fn set_ui_sender(tx: mpsc::Sender<String>) {
    if let Some(sink) = SINK.get() {
        sink.lock().ui_tx = Some(tx);
    }
}

/// Give `prefix` a colour in the UI. Unregistered prefixes render white.
pub fn register_prefix(prefix: &str, color: u8) {
    if let Some(sink) = SINK.get() {
        sink.lock().colors.insert(prefix.to_string(), color);
    }
}

fn file_line(ts: &str, level: Level, prefix: &str, msg: &str) -> String {
    if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level.as_str(), msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level.as_str(), prefix, msg)
    }
}

/// `level SEP prefix SEP color SEP timestamp SEP message`
fn ui_line(ts: &str, level: Level, prefix: &str, color: u8, msg: &str) -> String {
    [level.as_str(), prefix, &color.to_string(), ts, msg].join(&FIELD_SEP.to_string())
}

pub fn log(level: Level, prefix: &str, msg: &str) {
    let Some(sink) = SINK.get() else { return };
    let ts = Local::now().format("%H:%M:%S").to_string();

    let mut sink = sink.lock();
    let color = sink.colors.get(prefix).copied().unwrap_or(0);
    writeln!(sink.file, "{}", file_line(&ts, level, prefix, msg)).ok();
    if let Some(tx) = &sink.ui_tx {
        tx.send(ui_line(&ts, level, prefix, color, msg)).ok();
    }
}

pub fn info(msg: &str) {
    log(Level::Info, "", msg);
}

pub fn warn(msg: &str) {
    log(Level::Warn, "", msg);
}

pub fn error(msg: &str) {
    log(Level::Error, "", msg);
}

pub fn info_p(prefix: &str, msg: &str) {
    log(Level::Info, prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    log(Level::Warn, prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    log(Level::Error, prefix, msg);
}
