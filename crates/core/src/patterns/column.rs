//! Digging a cuboid straight down from a `/home` bookmark.
//!
//! The player stands on the column's corner looking straight down and has
//! already run `/sethome <name>` there. Each band (one step along the width)
//! mines the far positions first by recalling home and backing off `l`
//! blocks, then handles position 0: on every band but the last the bookmark
//! is first relocated one block left so the next band starts from there.

use super::{PatternContext, PatternOutcome};
use crate::error::RunResult;
use crate::input::Direction;

/// Teleport warmup plus margin after `/home`.
const HOME_WAIT_MS: u64 = 5300;
/// Server acknowledgement after `/sethome`.
const SETHOME_WAIT_MS: u64 = 1500;
const SETTLE_MS: u64 = 300;
const RESELECT_MS: u64 = 200;

pub(super) fn run(ctx: &PatternContext) -> RunResult<PatternOutcome> {
    let cfg = ctx.config;
    let (width, length, depth) = (cfg.column.width, cfg.column.length, cfg.column.depth);
    let total = width.saturating_mul(length).saturating_mul(depth);
    let home = format!("/home {}", cfg.home_name).trim().to_string();
    let sethome = format!("/sethome {}", cfg.home_name).trim().to_string();

    ctx.log(&format!(
        "Column mining: {} wide x {} long x {} deep ({} blocks)",
        width, length, depth, total
    ));
    ctx.log(&format!("Movement: {:?} ({} ms/block)", cfg.column_move, cfg.column_move.ms_per_block()));

    let mut done = 0;
    for band in 0..width {
        ctx.checkpoint()?;
        ctx.log(&format!("=== Band {}/{} ===", band + 1, width));

        for l in (1..length).rev() {
            ctx.checkpoint()?;
            if !ctx.safe() {
                return Ok(PatternOutcome::SafetyAbort { blocks: done });
            }
            recall(ctx, &home)?;
            ctx.log(&format!("  Backing off {} block(s)", l));
            ctx.input.move_blocks(ctx.token, Direction::Backward, l, cfg.column_move)?;
            ctx.input.pause(ctx.token, SETTLE_MS)?;
            done = match mine_down(ctx, depth, done, total)? {
                Ok(done) => done,
                Err(blocks) => return Ok(PatternOutcome::SafetyAbort { blocks }),
            };
            ctx.log(&format!("  Position ({},{}) done [{}/{}]", band, l, done, total));
        }

        ctx.checkpoint()?;
        if !ctx.safe() {
            return Ok(PatternOutcome::SafetyAbort { blocks: done });
        }
        recall(ctx, &home)?;
        if band + 1 < width {
            ctx.log("  Shifting home one block left");
            ctx.input.move_blocks(ctx.token, Direction::Left, 1, cfg.column_move)?;
            ctx.input.pause(ctx.token, SETTLE_MS)?;
            ctx.log(&format!("  {} -> new home", sethome));
            ctx.input.type_chat_command(ctx.token, &sethome)?;
            ctx.input.delay(ctx.token, SETHOME_WAIT_MS)?;
            ctx.input.move_blocks(ctx.token, Direction::Right, 1, cfg.column_move)?;
            ctx.input.pause(ctx.token, SETTLE_MS)?;
            ctx.input.select_slot(ctx.token, cfg.tool_slot)?;
            ctx.input.pause(ctx.token, RESELECT_MS)?;
        }
        done = match mine_down(ctx, depth, done, total)? {
            Ok(done) => done,
            Err(blocks) => return Ok(PatternOutcome::SafetyAbort { blocks }),
        };
        ctx.log(&format!("  Position ({},0) done [{}/{}]", band, done, total));
    }

    ctx.log(&format!("Done! {} blocks mined in total", done));
    Ok(PatternOutcome::Completed { blocks: done })
}

/// Teleport home and take the tool back in hand.
fn recall(ctx: &PatternContext, home: &str) -> RunResult<()> {
    ctx.log(&format!("  {} -> back to start", home));
    ctx.input.type_chat_command(ctx.token, home)?;
    ctx.input.delay(ctx.token, HOME_WAIT_MS)?;
    ctx.input.select_slot(ctx.token, ctx.config.tool_slot)?;
    ctx.input.pause(ctx.token, RESELECT_MS)
}

/// Mine `depth` blocks below the player; the player drops one block each time.
/// `Err(done)` means the window stopped being safe before the next block.
fn mine_down(ctx: &PatternContext, depth: u32, mut done: u32, total: u32) -> RunResult<Result<u32, u32>> {
    ctx.log(&format!("  Mining {} blocks down", depth));
    for _ in 0..depth {
        ctx.checkpoint()?;
        if !ctx.safe() {
            return Ok(Err(done));
        }
        done += 1;
        ctx.mine_one(done)?;
    }
    debug_assert!(done <= total);
    Ok(Ok(done))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::config::{Cuboid, MiningConfig, MoveMode};
    use crate::patterns::harness::Harness;
    use crate::patterns::{Pattern, PatternOutcome};
    use crate::platform::Key;
    use crate::testing::Action;

    #[test]
    fn test_two_by_two_sequence() {
        let h = Harness::new();
        let config = MiningConfig {
            column: Cuboid { width: 2, length: 2, depth: 2 },
            home_name: "base".into(),
            column_move: MoveMode::Sneak,
            ..MiningConfig::default()
        };
        let outcome = h.run(&Pattern::ColumnMining, &config, &|| true).unwrap();
        assert_eq!(outcome, PatternOutcome::Completed { blocks: 8 });
        assert_eq!(h.input.mine_count(), 8);
        assert_eq!(h.progress(), (1..=8).collect::<Vec<_>>());

        // band 0: home, home (+ sethome); band 1: home, home
        let typed = h.input.typed_text();
        assert_eq!(typed.matches("/home base").count(), 4);
        assert_eq!(typed.matches("/sethome base").count(), 1);
        // sneak modifier held for every movement: 2 back-offs and 2 shifts
        let sneaks = h.input.actions().iter().filter(|a| **a == Action::KeyDown(Key::LShift)).count();
        assert_eq!(sneaks, 4);
    }

    #[test]
    fn test_unsafe_before_first_recall() {
        let h = Harness::new();
        let outcome = h.run(&Pattern::ColumnMining, &MiningConfig::default(), &|| false).unwrap();
        assert_eq!(outcome, PatternOutcome::SafetyAbort { blocks: 0 });
        assert!(h.input.typed_text().is_empty());
    }

    #[test]
    fn test_window_lost_mid_column() {
        let h = Harness::new();
        let config = MiningConfig {
            column: Cuboid { width: 1, length: 1, depth: 10 },
            ..MiningConfig::default()
        };
        // safe for the recall check and the first three blocks
        let checks = AtomicU32::new(0);
        let safe = || checks.fetch_add(1, Ordering::SeqCst) < 4;
        let outcome = h.run(&Pattern::ColumnMining, &config, &safe).unwrap();
        assert_eq!(outcome, PatternOutcome::SafetyAbort { blocks: 3 });
        assert_eq!(h.input.mine_count(), 3);
        assert_eq!(h.progress(), vec![1, 2, 3]);
    }
}
