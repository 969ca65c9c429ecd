use automine_core::config::{MiningConfig, MoveMode, PatternKind, MAX_DIMENSION};

/// One editable row of the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pattern,
    ToolSlot,
    MiningDuration,
    ActionDelay,
    Humanize,
    BlockCount,
    WallWidth,
    WallHeight,
    FloorWidth,
    FloorDepth,
    AntiFall,
    ColumnWidth,
    ColumnLength,
    ColumnDepth,
    ColumnMove,
    PlayerSafety,
    ScanRadius,
}

const MS_STEP: i64 = 50;
const RADIUS_STEP: i64 = 20;

impl Field {
    /// Rows shown for `kind`: the shared ones first, then the pattern's own.
    pub fn for_pattern(kind: PatternKind) -> Vec<Field> {
        let mut fields = vec![
            Field::Pattern,
            Field::ToolSlot,
            Field::MiningDuration,
            Field::ActionDelay,
            Field::Humanize,
        ];
        fields.extend_from_slice(match kind {
            PatternKind::AutoClick => &[Field::BlockCount][..],
            PatternKind::WallBreaker => &[Field::WallWidth, Field::WallHeight],
            PatternKind::FloorMining => &[Field::FloorWidth, Field::FloorDepth, Field::AntiFall],
            PatternKind::ColumnMining => &[
                Field::ColumnWidth,
                Field::ColumnLength,
                Field::ColumnDepth,
                Field::ColumnMove,
            ],
            PatternKind::SmartMining => &[Field::PlayerSafety, Field::ScanRadius],
        });
        fields
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Pattern => "Pattern",
            Field::ToolSlot => "Tool slot",
            Field::MiningDuration => "Hold time (ms)",
            Field::ActionDelay => "Delay (ms)",
            Field::Humanize => "Humanize",
            Field::BlockCount => "Blocks",
            Field::WallWidth => "Wall width",
            Field::WallHeight => "Wall height",
            Field::FloorWidth => "Rows",
            Field::FloorDepth => "Row length",
            Field::AntiFall => "Anti-fall (sneak)",
            Field::ColumnWidth => "Width",
            Field::ColumnLength => "Length",
            Field::ColumnDepth => "Depth",
            Field::ColumnMove => "Movement",
            Field::PlayerSafety => "Player safety",
            Field::ScanRadius => "Scan radius (px)",
        }
    }

    pub fn value(self, cfg: &MiningConfig) -> String {
        match self {
            Field::Pattern => cfg.pattern.name().to_string(),
            Field::ToolSlot => cfg.tool_slot.to_string(),
            Field::MiningDuration => cfg.mining_duration_ms.to_string(),
            Field::ActionDelay => cfg.action_delay_ms.to_string(),
            Field::Humanize => on_off(cfg.humanize),
            Field::BlockCount => cfg.block_count.to_string(),
            Field::WallWidth => cfg.wall.width.to_string(),
            Field::WallHeight => cfg.wall.height.to_string(),
            Field::FloorWidth => cfg.floor.width.to_string(),
            Field::FloorDepth => cfg.floor.height.to_string(),
            Field::AntiFall => on_off(cfg.anti_fall),
            Field::ColumnWidth => cfg.column.width.to_string(),
            Field::ColumnLength => cfg.column.length.to_string(),
            Field::ColumnDepth => cfg.column.depth.to_string(),
            Field::ColumnMove => format!("{:?}", cfg.column_move),
            Field::PlayerSafety => on_off(cfg.player_safety),
            Field::ScanRadius => cfg.scan_radius.to_string(),
        }
    }

    /// Step the field by `delta` notches. Toggles flip on any delta and
    /// enumerations cycle forward; numbers never go below their minimum.
    pub fn adjust(self, cfg: &mut MiningConfig, delta: i64) {
        match self {
            Field::Pattern => cfg.pattern = cfg.pattern.next(),
            Field::ToolSlot => cfg.tool_slot = (cfg.tool_slot as i64 + delta).clamp(1, 9) as u8,
            Field::MiningDuration => {
                cfg.mining_duration_ms = step_u64(cfg.mining_duration_ms, delta * MS_STEP, MS_STEP)
            }
            Field::ActionDelay => cfg.action_delay_ms = step_u64(cfg.action_delay_ms, delta * MS_STEP, 0),
            Field::Humanize => cfg.humanize = !cfg.humanize,
            Field::BlockCount => cfg.block_count = step_u32(cfg.block_count, delta),
            Field::WallWidth => cfg.wall.width = step_dimension(cfg.wall.width, delta),
            Field::WallHeight => cfg.wall.height = step_dimension(cfg.wall.height, delta),
            Field::FloorWidth => cfg.floor.width = step_dimension(cfg.floor.width, delta),
            Field::FloorDepth => cfg.floor.height = step_dimension(cfg.floor.height, delta),
            Field::AntiFall => cfg.anti_fall = !cfg.anti_fall,
            Field::ColumnWidth => cfg.column.width = step_dimension(cfg.column.width, delta),
            Field::ColumnLength => cfg.column.length = step_dimension(cfg.column.length, delta),
            Field::ColumnDepth => cfg.column.depth = step_dimension(cfg.column.depth, delta),
            Field::ColumnMove => {
                cfg.column_move = match cfg.column_move {
                    MoveMode::Walk => MoveMode::Sprint,
                    MoveMode::Sprint => MoveMode::Sneak,
                    MoveMode::Sneak => MoveMode::Walk,
                }
            }
            Field::PlayerSafety => cfg.player_safety = !cfg.player_safety,
            Field::ScanRadius => {
                cfg.scan_radius = (cfg.scan_radius as i64 + delta * RADIUS_STEP).clamp(RADIUS_STEP, 2000) as i32
            }
        }
    }
}

fn on_off(v: bool) -> String {
    let s = if v { "on" } else { "off" };
    s.to_string()
}

fn step_u32(v: u32, delta: i64) -> u32 {
    (v as i64 + delta).clamp(1, u32::MAX as i64) as u32
}

fn step_dimension(v: u32, delta: i64) -> u32 {
    step_u32(v, delta).min(MAX_DIMENSION)
}

fn step_u64(v: u64, delta: i64, min: i64) -> u64 {
    (v as i64 + delta).max(min) as u64
}

/// Blocks a run of `cfg` mines when it finishes normally. Smart mining has
/// no fixed total.
pub fn expected_blocks(cfg: &MiningConfig) -> Option<u32> {
    match cfg.pattern {
        PatternKind::AutoClick => Some(cfg.block_count),
        PatternKind::WallBreaker => Some(cfg.wall.width.saturating_mul(cfg.wall.height)),
        PatternKind::FloorMining => Some(cfg.floor.width.saturating_mul(cfg.floor.height)),
        PatternKind::ColumnMining => Some(
            cfg.column.width.saturating_mul(cfg.column.length).saturating_mul(cfg.column.depth),
        ),
        PatternKind::SmartMining => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_follow_pattern() {
        let column = Field::for_pattern(PatternKind::ColumnMining);
        assert_eq!(column[0], Field::Pattern);
        assert!(column.contains(&Field::ColumnMove));
        assert!(!column.contains(&Field::BlockCount));
        assert!(Field::for_pattern(PatternKind::SmartMining).contains(&Field::ScanRadius));
    }

    #[test]
    fn test_adjust_clamps() {
        let mut cfg = MiningConfig::default();
        Field::ToolSlot.adjust(&mut cfg, 20);
        assert_eq!(cfg.tool_slot, 9);
        Field::WallWidth.adjust(&mut cfg, -100);
        assert_eq!(cfg.wall.width, 1);
        Field::ActionDelay.adjust(&mut cfg, -100);
        assert_eq!(cfg.action_delay_ms, 0);
        Field::MiningDuration.adjust(&mut cfg, -1000);
        assert_eq!(cfg.mining_duration_ms, 50);
    }

    #[test]
    fn test_adjust_cycles_and_toggles() {
        let mut cfg = MiningConfig::default();
        Field::ColumnMove.adjust(&mut cfg, -1);
        assert_eq!(cfg.column_move, MoveMode::Sprint);
        Field::Humanize.adjust(&mut cfg, 1);
        assert!(!cfg.humanize);
        Field::Pattern.adjust(&mut cfg, 1);
        assert_eq!(cfg.pattern, PatternKind::WallBreaker);
    }

    #[test]
    fn test_expected_blocks() {
        let mut cfg = MiningConfig::default();
        cfg.pattern = PatternKind::ColumnMining;
        assert_eq!(expected_blocks(&cfg), Some(2 * 2 * 10));
        cfg.pattern = PatternKind::SmartMining;
        assert_eq!(expected_blocks(&cfg), None);
    }

    #[test]
    fn test_dimensions_stop_at_cap() {
        let mut cfg = MiningConfig::default();
        Field::ColumnDepth.adjust(&mut cfg, 1_000_000);
        assert_eq!(cfg.column.depth, MAX_DIMENSION);
        Field::BlockCount.adjust(&mut cfg, 1_000_000);
        assert!(cfg.block_count > MAX_DIMENSION);
    }

    #[test]
    fn test_expected_blocks_saturates() {
        let mut cfg = MiningConfig::default();
        cfg.pattern = PatternKind::ColumnMining;
        cfg.column.width = u32::MAX;
        cfg.column.length = 3;
        assert_eq!(expected_blocks(&cfg), Some(u32::MAX));
    }
}
