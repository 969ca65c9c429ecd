//! Per-run mining configuration.

use serde::{Deserialize, Serialize};

use crate::vision::SCAN_STEP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    #[default]
    AutoClick,
    WallBreaker,
    FloorMining,
    ColumnMining,
    SmartMining,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::AutoClick,
        PatternKind::WallBreaker,
        PatternKind::FloorMining,
        PatternKind::ColumnMining,
        PatternKind::SmartMining,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::AutoClick => "Auto Click",
            PatternKind::WallBreaker => "Wall Breaker",
            PatternKind::FloorMining => "Floor Mining",
            PatternKind::ColumnMining => "Column Mining",
            PatternKind::SmartMining => "Smart Mining",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PatternKind::AutoClick => "Mine the block under the crosshair N times",
            PatternKind::WallBreaker => "Break a vertical wall row by row in a serpentine",
            PatternKind::FloorMining => "Mine a flat area under the player, optionally sneaking",
            PatternKind::ColumnMining => "Dig a cuboid straight down using a /home bookmark",
            PatternKind::SmartMining => "Follow the calibrated material on screen until none is left",
        }
    }

    /// Next kind in display order, wrapping.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Movement speed used by column mining.
///
/// Speeds are expressed as milliseconds to cross one block; they are
/// calibration values for the vanilla client, not exact physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMode {
    #[default]
    Walk,
    Sprint,
    Sneak,
}

pub const WALK_MS_PER_BLOCK: u64 = 232;
pub const SPRINT_MS_PER_BLOCK: u64 = 178;
pub const SNEAK_MS_PER_BLOCK: u64 = 772;

impl MoveMode {
    pub fn ms_per_block(self) -> u64 {
        match self {
            MoveMode::Walk => WALK_MS_PER_BLOCK,
            MoveMode::Sprint => SPRINT_MS_PER_BLOCK,
            MoveMode::Sneak => SNEAK_MS_PER_BLOCK,
        }
    }
}

/// Chat typing speed profile for quick commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSpeed {
    Slow,
    Normal,
    #[default]
    Fast,
    Ultra,
}

/// Delays (ms) for one chat command: open, per character, before and after
/// submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTiming {
    pub open_ms: u64,
    pub char_ms: u64,
    pub pre_submit_ms: u64,
    pub post_submit_ms: u64,
}

impl ChatSpeed {
    pub fn timing(self) -> ChatTiming {
        let (open_ms, char_ms, pre_submit_ms, post_submit_ms) = match self {
            ChatSpeed::Slow => (300, 30, 100, 100),
            ChatSpeed::Normal => (150, 15, 50, 50),
            ChatSpeed::Fast => (60, 8, 30, 30),
            ChatSpeed::Ultra => (20, 2, 10, 10),
        };
        ChatTiming { open_ms, char_ms, pre_submit_ms, post_submit_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cuboid {
    pub width: u32,
    pub length: u32,
    pub depth: u32,
}

/// Everything a pattern reads. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub pattern: PatternKind,
    pub mining_duration_ms: u64,
    pub action_delay_ms: u64,
    pub tool_slot: u8,
    pub anti_fall: bool,
    pub humanize: bool,
    pub block_count: u32,
    /// Wall width (columns) by height (rows).
    pub wall: Area,
    /// Floor width (rows) by depth (blocks per row), `height` is the depth.
    pub floor: Area,
    pub column: Cuboid,
    pub home_name: String,
    pub column_move: MoveMode,
    pub player_safety: bool,
    pub scan_radius: i32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            pattern: PatternKind::AutoClick,
            mining_duration_ms: 2550,
            action_delay_ms: 200,
            tool_slot: 1,
            anti_fall: true,
            humanize: true,
            block_count: 20,
            wall: Area { width: 5, height: 3 },
            floor: Area { width: 5, height: 5 },
            column: Cuboid { width: 2, length: 2, depth: 10 },
            home_name: "mine".to_string(),
            column_move: MoveMode::Walk,
            player_safety: true,
            scan_radius: 300,
        }
    }
}

/// Upper bound for each wall, floor and column dimension. Keeps the block
/// totals (up to width x length x depth) inside `u32`.
pub const MAX_DIMENSION: u32 = 1000;

impl MiningConfig {
    /// Clamp every field into its legal range.
    pub fn sanitized(mut self) -> Self {
        self.tool_slot = self.tool_slot.clamp(1, 9);
        self.block_count = self.block_count.max(1);
        self.wall.width = self.wall.width.clamp(1, MAX_DIMENSION);
        self.wall.height = self.wall.height.clamp(1, MAX_DIMENSION);
        self.floor.width = self.floor.width.clamp(1, MAX_DIMENSION);
        self.floor.height = self.floor.height.clamp(1, MAX_DIMENSION);
        self.column.width = self.column.width.clamp(1, MAX_DIMENSION);
        self.column.length = self.column.length.clamp(1, MAX_DIMENSION);
        self.column.depth = self.column.depth.clamp(1, MAX_DIMENSION);
        self.scan_radius = self.scan_radius.max(SCAN_STEP);
        let home = self.home_name.trim();
        self.home_name = if home.is_empty() { "mine".to_string() } else { home.to_string() };
        self
    }
}

/// A chat command bound to the UI quick-command list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickCommand {
    pub name: String,
    pub command: String,
    pub speed: ChatSpeed,
    pub enabled: bool,
}

impl Default for QuickCommand {
    fn default() -> Self {
        Self {
            name: "Feed".to_string(),
            command: "/feed".to_string(),
            speed: ChatSpeed::Fast,
            enabled: true,
        }
    }
}
