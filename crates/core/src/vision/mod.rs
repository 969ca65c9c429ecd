//! Frame model and pixel heuristics.

mod frame;
mod material;
mod player;
mod tool;

pub use frame::Frame;
pub use material::{MaterialDetector, MaterialProfile, DEFAULT_REFERENCE, DEFAULT_TOLERANCE, SCAN_STEP};
pub use player::PlayerDetector;
pub use tool::ToolDetector;
