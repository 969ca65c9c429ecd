use super::{PatternContext, PatternOutcome};
use crate::error::RunResult;

/// Mine the block under the crosshair `block_count` times.
pub(super) fn run(ctx: &PatternContext) -> RunResult<PatternOutcome> {
    let total = ctx.config.block_count;
    ctx.log(&format!("Auto click: {} blocks to mine", total));
    ctx.select_tool()?;

    for i in 1..=total {
        ctx.checkpoint()?;
        if !ctx.safe() {
            return Ok(PatternOutcome::SafetyAbort { blocks: i - 1 });
        }
        ctx.log(&format!("Block {}/{}", i, total));
        ctx.mine_one(i)?;
    }

    ctx.log(&format!("Done! {} blocks mined", total));
    Ok(PatternOutcome::Completed { blocks: total })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::config::MiningConfig;
    use crate::patterns::harness::Harness;
    use crate::patterns::{Pattern, PatternOutcome};

    #[test]
    fn test_stops_when_unsafe() {
        let h = Harness::new();
        let config = MiningConfig { block_count: 5, ..MiningConfig::default() };
        let checks = AtomicU32::new(0);
        // Safe for the first two blocks only.
        let safe = || checks.fetch_add(1, Ordering::SeqCst) < 2;
        let outcome = h.run(&Pattern::AutoClick, &config, &safe).unwrap();
        assert_eq!(outcome, PatternOutcome::SafetyAbort { blocks: 2 });
        assert_eq!(h.input.mine_count(), 2);
        assert_eq!(h.progress(), vec![1, 2]);
    }

    #[test]
    fn test_cancel_before_start() {
        let h = Harness::new();
        h.token.cancel();
        let err = h.run(&Pattern::AutoClick, &MiningConfig::default(), &|| true).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(h.input.mine_count(), 0);
    }
}
