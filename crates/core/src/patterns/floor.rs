use super::{PatternContext, PatternOutcome};
use crate::error::RunResult;
use crate::input::Direction;
use crate::platform::Key;

/// Pointer travel that points the camera at the floor.
const LOOK_DOWN_PX: i32 = 300;
/// Hold time that walks one block forward or sideways.
const STEP_MS: u64 = 380;

/// Rows of `depth` blocks under the player. Every row is mined walking
/// forward; at a row end the player side-steps and turns around, so the
/// side-step direction alternates to keep advancing across the area.
pub(super) fn run(ctx: &PatternContext) -> RunResult<PatternOutcome> {
    let (width, depth) = (ctx.config.floor.width, ctx.config.floor.height);
    let total = width.saturating_mul(depth);
    ctx.log(&format!("Floor mining: {} wide x {} long = {} blocks", width, depth, total));
    ctx.select_tool()?;

    ctx.log("Looking down");
    ctx.input.look_down(ctx.token, LOOK_DOWN_PX)?;
    ctx.input.pause(ctx.token, 200)?;

    let mut done = 0;
    let mut side = Direction::Right;
    for row in 0..width {
        ctx.log(&format!("Row {}/{}", row + 1, width));
        for col in 0..depth {
            ctx.checkpoint()?;
            if !ctx.safe() {
                return Ok(PatternOutcome::SafetyAbort { blocks: done });
            }
            done += 1;
            ctx.log(&format!("Block {}/{}", done, total));
            ctx.mine_one(done)?;

            if col + 1 < depth {
                step(ctx, Direction::Forward)?;
                ctx.input.pause(ctx.token, 150)?;
            }
        }
        if row + 1 < width {
            step(ctx, side)?;
            ctx.input.pause(ctx.token, 200)?;
            ctx.input.turn_around(ctx.token)?;
            ctx.input.pause(ctx.token, 300)?;
            // Facing the other way, the next row's side is mirrored.
            side = match side {
                Direction::Right => Direction::Left,
                _ => Direction::Right,
            };
        }
    }

    ctx.log("Looking straight again");
    ctx.input.look_up(ctx.token, LOOK_DOWN_PX)?;
    ctx.log(&format!("Floor done! {} blocks mined", total));
    Ok(PatternOutcome::Completed { blocks: total })
}

/// One block in `dir`, sneaking when anti-fall is on.
fn step(ctx: &PatternContext, dir: Direction) -> RunResult<()> {
    let modifier = ctx.config.anti_fall.then_some(Key::LShift);
    ctx.input.hold_direction(ctx.token, dir, STEP_MS, modifier)
}
