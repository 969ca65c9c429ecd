use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use crossterm::{
    execute,
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use automine_core::platform::create_platform;
use automine_core::platform::hotkey::{self, HotkeyFlags};
use automine_core::settings::Settings;
use automine_core::{logger, Engine};

fn main() -> Result<()> {
    let force_stub = std::env::args().any(|a| a == "--stub");
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    logger::init(&cwd.join("logs"))?;

    let platform = create_platform(force_stub);
    let engine = Engine::with_platform(platform);

    let settings_path = cwd.join("settings.json");
    let mut settings = Settings::load(&settings_path);
    if settings.quick_commands.is_empty() {
        settings.quick_commands.push(Default::default());
    }
    if let Some(profile) = settings.material {
        engine.set_material_profile(profile);
        logger::info("restored calibrated material from settings");
    }

    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::set_ui_sender(log_tx);
    logger::info(&format!("automine started{}", if force_stub { " (stub backend)" } else { "" }));

    // Global F6 / F8, also while the game has focus
    let hotkeys = HotkeyFlags::new();
    hotkey::start_hotkey_listener(hotkeys.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = automine_tui::App::new(engine, settings, settings_path, hotkeys, log_rx);
    let result = automine_tui::event::run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if result.is_err() {
        app.save_settings();
    }
    // Dropping the engine cancels any run and releases held input.
    drop(app);
    result
}
