use std::path::PathBuf;
use std::sync::mpsc;

use automine_core::logger;
use automine_core::platform::hotkey::HotkeyFlags;
use automine_core::settings::Settings;
use automine_core::{Engine, EngineEvent, EngineState};

use crate::confirm::ConfirmDialog;
use crate::fields::{self, Field};

pub struct App {
    pub engine: Engine,
    pub settings: Settings,
    settings_path: PathBuf,
    hotkeys: HotkeyFlags,
    events: mpsc::Receiver<EngineEvent>,
    log_rx: mpsc::Receiver<String>,
    /// Last state published by the engine.
    pub state: EngineState,
    pub progress: u32,
    /// Latest engine message, shown under the banner.
    pub status: String,
    pub selected: usize,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub confirm: Option<ConfirmDialog>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        engine: Engine,
        settings: Settings,
        settings_path: PathBuf,
        hotkeys: HotkeyFlags,
        log_rx: mpsc::Receiver<String>,
    ) -> Self {
        let events = engine.subscribe();
        let state = engine.state();
        Self {
            engine,
            settings,
            settings_path,
            hotkeys,
            events,
            log_rx,
            state,
            progress: 0,
            status: "Press d to find the game window".to_string(),
            selected: 0,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            confirm: None,
            should_quit: false,
        }
    }

    /// Fold pending engine events and log lines into the view state.
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                EngineEvent::StateChanged(state) => {
                    if state == EngineState::Mining && !self.state.is_active() {
                        self.progress = 0;
                    }
                    self.state = state;
                }
                EngineEvent::Log(msg) => self.status = msg,
                EngineEvent::Progress(n) => self.progress = n,
            }
        }
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
    }

    /// Act on global hotkey presses latched since the last frame.
    pub fn poll_hotkeys(&mut self) {
        if self.hotkeys.take_emergency() {
            self.emergency_stop();
        }
        if self.hotkeys.take_toggle() {
            self.toggle_mining();
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        Field::for_pattern(self.settings.config.pattern)
    }

    pub fn expected_blocks(&self) -> Option<u32> {
        fields::expected_blocks(&self.settings.config)
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.fields().len() {
            self.selected += 1;
        }
    }

    /// Change the selected setting. Frozen while a run is active.
    pub fn adjust(&mut self, delta: i64) {
        if self.state.is_active() {
            self.status = "Settings are locked while mining".to_string();
            return;
        }
        let Some(field) = self.fields().get(self.selected).copied() else {
            return;
        };
        field.adjust(&mut self.settings.config, delta);
        self.selected = self.selected.min(self.fields().len() - 1);
    }

    pub fn cycle_pattern(&mut self) {
        if self.state.is_active() {
            return;
        }
        Field::Pattern.adjust(&mut self.settings.config, 1);
        self.selected = 0;
    }

    pub fn toggle_humanize(&mut self) {
        if !self.state.is_active() {
            Field::Humanize.adjust(&mut self.settings.config, 1);
        }
    }

    pub fn detect_window(&mut self) {
        self.engine.detect_window();
    }

    /// Learn the material under the crosshair and remember it.
    pub fn calibrate(&mut self) {
        if self.engine.calibrate_material() {
            self.settings.material = Some(self.engine.material_profile());
            self.save_settings();
        }
    }

    pub fn toggle_mining(&mut self) {
        if let Err(e) = self.engine.toggle_mining(self.settings.config.clone()) {
            logger::warn(&format!("cannot start: {:#}", e));
            self.status = format!("Cannot start: {}", e);
        }
    }

    pub fn pause_resume(&mut self) {
        match self.state {
            EngineState::Mining => {
                self.engine.pause();
            }
            EngineState::Paused => {
                self.engine.resume();
            }
            _ => {}
        }
    }

    pub fn emergency_stop(&mut self) {
        self.engine.emergency_stop();
    }

    /// Send the `n`-th enabled quick command (0-based).
    pub fn quick_command(&mut self, n: usize) {
        let Some(cmd) = self.settings.quick_commands.iter().filter(|c| c.enabled).nth(n).cloned() else {
            return;
        };
        if let Err(e) = self.engine.send_quick_command(&cmd) {
            logger::warn(&format!("quick command {:?} failed: {:#}", cmd.name, e));
            self.status = format!("{}: {}", cmd.name, e);
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    pub fn request_quit(&mut self) {
        let msg = if self.state.is_active() { "Stop mining and quit?" } else { "Quit automine?" };
        self.confirm = Some(ConfirmDialog::new(msg));
    }

    /// Close the dialog; quit when it was answered Yes.
    pub fn answer_confirm(&mut self, yes: bool) {
        if self.confirm.take().is_some() && yes {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        if self.state.is_active() {
            self.engine.stop_mining();
            self.engine.join_worker();
        }
        self.save_settings();
        self.should_quit = true;
    }

    pub fn save_settings(&self) {
        self.settings.save(&self.settings_path);
    }
}
