//! The five mining routines.
//!
//! A pattern is picked once per run from [`PatternKind`] and then driven to
//! completion on the worker thread. Every pattern checks the run token at
//! each block boundary and the safety predicate before each destructive
//! step. A failed safety check is a clean early return, not an error.

mod auto_click;
mod column;
mod floor;
mod smart;
mod wall;

use std::sync::Arc;

pub use smart::SmartMining;

use crate::config::{MiningConfig, PatternKind};
use crate::control::RunToken;
use crate::error::RunResult;
use crate::input::Actuator;
use crate::platform::FrameSource;
use crate::types::WindowId;
use crate::vision::MaterialDetector;

/// How a pattern ended when it was not cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOutcome {
    Completed { blocks: u32 },
    /// Target window lost or unfocused.
    SafetyAbort { blocks: u32 },
    /// Hotbar slot emptied (tool broke).
    ToolLost { blocks: u32 },
    /// A name label was seen and the disconnect sequence ran.
    PlayerDetected { blocks: u32 },
}

impl PatternOutcome {
    pub fn blocks(self) -> u32 {
        match self {
            PatternOutcome::Completed { blocks }
            | PatternOutcome::SafetyAbort { blocks }
            | PatternOutcome::ToolLost { blocks }
            | PatternOutcome::PlayerDetected { blocks } => blocks,
        }
    }
}

/// Everything a pattern gets for one run.
pub struct PatternContext<'a> {
    pub input: &'a Actuator,
    pub config: &'a MiningConfig,
    pub token: &'a RunToken,
    pub log: &'a (dyn Fn(&str) + Sync),
    pub progress: &'a (dyn Fn(u32) + Sync),
    pub is_safe: &'a (dyn Fn() -> bool + Sync),
}

impl PatternContext<'_> {
    fn log(&self, msg: &str) {
        (self.log)(msg);
    }

    fn progress(&self, blocks: u32) {
        (self.progress)(blocks);
    }

    /// Pause/cancel boundary.
    fn checkpoint(&self) -> RunResult<()> {
        self.token.checkpoint()
    }

    /// Logs the abort reason when unsafe.
    fn safe(&self) -> bool {
        if (self.is_safe)() {
            return true;
        }
        self.log("Target window is no longer focused, stopping for safety");
        false
    }

    fn select_tool(&self) -> RunResult<()> {
        self.input.select_slot(self.token, self.config.tool_slot)?;
        self.log(&format!("Tool selected (slot {})", self.config.tool_slot));
        self.input.pause(self.token, 300)
    }

    /// Mine one block, wait the action delay and report `blocks`.
    fn mine_one(&self, blocks: u32) -> RunResult<()> {
        self.input.mine_block(self.token, self.config.mining_duration_ms)?;
        self.input.pause(self.token, self.config.action_delay_ms)?;
        self.progress(blocks);
        Ok(())
    }
}

/// A resolved pattern, ready to run.
pub enum Pattern {
    AutoClick,
    WallBreaker,
    FloorMining,
    ColumnMining,
    SmartMining(SmartMining),
}

impl Pattern {
    /// Resolve `kind` into a runnable pattern. Only SmartMining needs the
    /// capture seam and a detector snapshot.
    pub fn resolve(
        kind: PatternKind,
        frames: Arc<dyn FrameSource>,
        window: WindowId,
        material: MaterialDetector,
    ) -> Self {
        match kind {
            PatternKind::AutoClick => Pattern::AutoClick,
            PatternKind::WallBreaker => Pattern::WallBreaker,
            PatternKind::FloorMining => Pattern::FloorMining,
            PatternKind::ColumnMining => Pattern::ColumnMining,
            PatternKind::SmartMining => Pattern::SmartMining(SmartMining::new(frames, window, material)),
        }
    }

    pub fn run(&self, ctx: &PatternContext) -> RunResult<PatternOutcome> {
        match self {
            Pattern::AutoClick => auto_click::run(ctx),
            Pattern::WallBreaker => wall::run(ctx),
            Pattern::FloorMining => floor::run(ctx),
            Pattern::ColumnMining => column::run(ctx),
            Pattern::SmartMining(smart) => smart.run(ctx),
        }
    }
}

#[cfg(test)]
pub(crate) mod harness {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::sleep::FixedJitter;
    use crate::testing::RecordingInput;

    /// Runs a pattern against a recording backend with instant waits.
    pub struct Harness {
        pub input: Arc<RecordingInput>,
        pub actuator: Actuator,
        pub token: RunToken,
        pub logs: Mutex<Vec<String>>,
        pub progress: Mutex<Vec<u32>>,
    }

    impl Harness {
        pub fn new() -> Self {
            let input = Arc::new(RecordingInput::new());
            let actuator = Actuator::new(input.clone())
                .with_time_scale(0.0)
                .with_jitter(Box::new(FixedJitter(0)));
            Self {
                input,
                actuator,
                token: RunToken::new(),
                logs: Mutex::new(Vec::new()),
                progress: Mutex::new(Vec::new()),
            }
        }

        pub fn run(&self, pattern: &Pattern, config: &MiningConfig, safe: &(dyn Fn() -> bool + Sync)) -> RunResult<PatternOutcome> {
            let log = |m: &str| self.logs.lock().push(m.to_string());
            let progress = |n: u32| self.progress.lock().push(n);
            let ctx = PatternContext {
                input: &self.actuator,
                config,
                token: &self.token,
                log: &log,
                progress: &progress,
                is_safe: safe,
            };
            pattern.run(&ctx)
        }

        pub fn progress(&self) -> Vec<u32> {
            self.progress.lock().clone()
        }

        pub fn logs(&self) -> Vec<String> {
            self.logs.lock().clone()
        }
    }
}
