use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::App;
use crate::ui;

/// Draw and dispatch input until the user quits. Engine events, log lines
/// and global hotkeys are picked up once per frame.
pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        app.poll_hotkeys();
        app.drain();

        terminal.draw(|f| ui::draw(f, app))?;

        // 100ms keeps hotkeys and progress responsive
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.confirm.is_some() {
                    handle_confirm_key(app, key);
                } else {
                    handle_key(app, key);
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
        KeyCode::Char('d') | KeyCode::Char('D') => app.detect_window(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.calibrate(),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::F(6) => app.toggle_mining(),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => app.pause_resume(),
        KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::F(8) => app.emergency_stop(),
        KeyCode::Tab => app.cycle_pattern(),
        KeyCode::Char('h') | KeyCode::Char('H') => app.toggle_humanize(),
        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => app.move_down(),
        KeyCode::Left | KeyCode::Char('-') => app.adjust(-1),
        KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => app.adjust(1),
        KeyCode::PageUp => app.scroll_log_up(10),
        KeyCode::PageDown => app.scroll_log_down(10),
        KeyCode::Char(c @ '1'..='9') => app.quick_command(c as usize - '1' as usize),
        _ => {}
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
            if let Some(dialog) = app.confirm.as_mut() {
                dialog.toggle();
            }
        }
        KeyCode::Enter => {
            let yes = app.confirm.as_ref().map_or(false, |d| d.yes);
            app.answer_confirm(yes);
        }
        KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_confirm(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_confirm(false),
        _ => {}
    }
}
