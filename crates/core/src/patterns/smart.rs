//! Closed-loop mining driven by the material detector.

use std::sync::Arc;

use super::{PatternContext, PatternOutcome};
use crate::error::RunResult;
use crate::platform::{FrameSource, Key};
use crate::types::WindowId;
use crate::vision::{MaterialDetector, PlayerDetector, ToolDetector};

/// Consecutive empty scans before the run is considered finished.
pub const MAX_MISSES: u32 = 5;
const MISS_RETRY_MS: u64 = 800;
const CAPTURE_RETRY_MS: u64 = 1000;
const AIM_SETTLE_MS: u64 = 200;
/// Re-check the hotbar every this many mined blocks.
const TOOL_CHECK_EVERY: u32 = 3;
const PAN_PX_PER_STEP: f64 = 20.0;
const PAN_MIN_STEPS: i32 = 3;

/// Pause-menu layout: the pointer appears at mid-height and "Disconnect"
/// sits about 12% of the window height below it.
const DISCONNECT_DROP_RATIO: f64 = 0.12;
const DISCONNECT_DROP_FALLBACK_PX: i32 = 130;
const DISCONNECT_DROP_STEPS: i32 = 5;
/// Extra offset for each fallback click.
const DISCONNECT_RETRY_PX: i32 = 25;

pub struct SmartMining {
    frames: Arc<dyn FrameSource>,
    window: WindowId,
    material: MaterialDetector,
    player: PlayerDetector,
    tool: ToolDetector,
}

impl SmartMining {
    pub fn new(frames: Arc<dyn FrameSource>, window: WindowId, material: MaterialDetector) -> Self {
        Self { frames, window, material, player: PlayerDetector::new(), tool: ToolDetector::new() }
    }

    pub(super) fn run(&self, ctx: &PatternContext) -> RunResult<PatternOutcome> {
        let cfg = ctx.config;
        ctx.log("Smart mining started, looking for the target material");
        ctx.select_tool()?;

        let mut blocks = 0u32;
        let mut misses = 0u32;
        let mut tool_checked_at = 0u32;

        loop {
            ctx.checkpoint()?;
            if !ctx.safe() {
                return Ok(PatternOutcome::SafetyAbort { blocks });
            }

            let Some(frame) = self.frames.capture(self.window) else {
                ctx.log("Screen capture failed, is the game in windowed mode?");
                ctx.input.delay(ctx.token, CAPTURE_RETRY_MS)?;
                continue;
            };

            if cfg.player_safety && self.player.detect(&frame) {
                ctx.log("PLAYER DETECTED! Disconnecting now");
                self.disconnect(ctx)?;
                return Ok(PatternOutcome::PlayerDetected { blocks });
            }

            if blocks > 0 && blocks % TOOL_CHECK_EVERY == 0 && blocks != tool_checked_at {
                tool_checked_at = blocks;
                if !self.tool.is_tool_present(&frame, cfg.tool_slot) {
                    ctx.log("Tool is gone from the hotbar, stopping");
                    return Ok(PatternOutcome::ToolLost { blocks });
                }
            }

            if self.material.check_crosshair(&frame) {
                misses = 0;
                blocks += 1;
                ctx.log(&format!("Target under crosshair, mining block #{}", blocks));
                ctx.mine_one(blocks)?;
                continue;
            }

            if let Some((dx, dy)) = self.material.scan_for_nearest_match(&frame, cfg.scan_radius) {
                misses = 0;
                ctx.log(&format!("Target found, aiming at ({}, {})", dx, dy));
                pan_to(ctx, dx, dy)?;
                ctx.input.pause(ctx.token, AIM_SETTLE_MS)?;
                continue;
            }

            misses += 1;
            if misses >= MAX_MISSES {
                ctx.log(&format!("Nothing visible after {} tries, done! {} blocks mined", MAX_MISSES, blocks));
                return Ok(PatternOutcome::Completed { blocks });
            }
            ctx.log(&format!("Nothing found, retrying ({}/{})", misses, MAX_MISSES));
            ctx.input.pause(ctx.token, MISS_RETRY_MS)?;
        }
    }

    /// Open the pause menu and click "Disconnect", then twice more slightly
    /// lower in case the GUI scale moved the button.
    fn disconnect(&self, ctx: &PatternContext) -> RunResult<()> {
        let (input, token) = (ctx.input, ctx.token);
        input.release_all_keys();
        input.delay(token, 100)?;
        input.key_press(token, Key::Escape, 100)?;
        input.delay(token, 600)?;

        let drop = self
            .frames
            .capture(self.window)
            .filter(|f| f.is_valid())
            .map(|f| (f.height() as f64 * DISCONNECT_DROP_RATIO) as i32)
            .unwrap_or(DISCONNECT_DROP_FALLBACK_PX);
        for _ in 0..DISCONNECT_DROP_STEPS {
            input.mouse_move(token, 0, drop / DISCONNECT_DROP_STEPS)?;
            input.delay(token, 20)?;
        }
        input.delay(token, 150)?;
        click(ctx)?;
        input.delay(token, 400)?;

        for settle in [200, 0] {
            input.mouse_move(token, 0, DISCONNECT_RETRY_PX)?;
            input.delay(token, 100)?;
            click(ctx)?;
            input.delay(token, settle)?;
        }
        Ok(())
    }
}

fn click(ctx: &PatternContext) -> RunResult<()> {
    ctx.input.left_down(ctx.token)?;
    let held = ctx.input.delay(ctx.token, 50);
    ctx.input.left_up(ctx.token)?;
    held
}

/// Move the aim by (`dx`, `dy`) in equal sub-steps, more steps for longer
/// distances, then correct the rounding remainder.
fn pan_to(ctx: &PatternContext, dx: i32, dy: i32) -> RunResult<()> {
    let distance = ((dx as f64).powi(2) + (dy as f64).powi(2)).sqrt();
    let steps = ((distance / PAN_PX_PER_STEP) as i32).max(PAN_MIN_STEPS);
    let (step_x, step_y) = (dx / steps, dy / steps);
    for _ in 0..steps {
        ctx.input.mouse_move(ctx.token, step_x, step_y)?;
        ctx.input.pause(ctx.token, 15)?;
    }
    let (rest_x, rest_y) = (dx - step_x * steps, dy - step_y * steps);
    if rest_x != 0 || rest_y != 0 {
        ctx.input.mouse_move(ctx.token, rest_x, rest_y)?;
    }
    Ok(())
}
