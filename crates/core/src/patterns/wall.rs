use super::{PatternContext, PatternOutcome};
use crate::error::RunResult;

/// Pointer travel that moves the aim by one block at wall distance.
pub const PIXELS_PER_BLOCK: i32 = 80;
const NUDGE_STEPS: i32 = 4;

/// Serpentine over a `width` x `height` wall: left to right on even rows,
/// right to left on odd rows, one row down at each row end.
pub(super) fn run(ctx: &PatternContext) -> RunResult<PatternOutcome> {
    let (width, height) = (ctx.config.wall.width, ctx.config.wall.height);
    let total = width.saturating_mul(height);
    ctx.log(&format!("Wall breaker: {} wide x {} high = {} blocks", width, height, total));
    ctx.select_tool()?;

    let mut done = 0;
    let mut rightward = true;
    for row in 0..height {
        ctx.log(&format!("Row {}/{}", row + 1, height));
        for col in 0..width {
            ctx.checkpoint()?;
            if !ctx.safe() {
                return Ok(PatternOutcome::SafetyAbort { blocks: done });
            }
            done += 1;
            ctx.log(&format!("Block {}/{}", done, total));
            ctx.mine_one(done)?;

            if col + 1 < width {
                let dx = if rightward { PIXELS_PER_BLOCK } else { -PIXELS_PER_BLOCK };
                nudge(ctx, dx, 0)?;
                ctx.input.pause(ctx.token, 150)?;
            }
        }
        if row + 1 < height {
            nudge(ctx, 0, PIXELS_PER_BLOCK)?;
            ctx.input.pause(ctx.token, 200)?;
        }
        rightward = !rightward;
    }

    ctx.log(&format!("Wall done! {} blocks mined", total));
    Ok(PatternOutcome::Completed { blocks: total })
}

fn nudge(ctx: &PatternContext, dx: i32, dy: i32) -> RunResult<()> {
    ctx.input.smooth_move(ctx.token, dx / NUDGE_STEPS, dy / NUDGE_STEPS, NUDGE_STEPS)
}
