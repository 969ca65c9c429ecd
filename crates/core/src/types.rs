use serde::{Deserialize, Serialize};

/// Window identifier (HWND on Windows, synthetic id for the stub)
pub type WindowId = u64;

/// Engine lifecycle. Exactly one authoritative copy lives in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Detecting,
    Ready,
    Mining,
    Paused,
    Error,
}

impl EngineState {
    /// True while a mining worker owns the run (mining or suspended).
    pub fn is_active(self) -> bool {
        matches!(self, EngineState::Mining | EngineState::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            EngineState::Idle => "IDLE",
            EngineState::Detecting => "DETECTING",
            EngineState::Ready => "READY",
            EngineState::Mining => "MINING",
            EngineState::Paused => "PAUSED",
            EngineState::Error => "ERROR",
        }
    }
}

/// Plain RGB triple sampled from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of the three channels (0..=765)
    pub fn brightness(self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }

    pub fn all_at_least(self, threshold: u8) -> bool {
        self.r >= threshold && self.g >= threshold && self.b >= threshold
    }

    pub fn all_below(self, threshold: u8) -> bool {
        self.r < threshold && self.g < threshold && self.b < threshold
    }
}
