//! Core of the automine controller.
//!
//! Everything that decides *what* to press lives here: the frame model and
//! the three pixel detectors, the timed input actuator, the pause/cancel run
//! token, the five mining patterns and the engine that sequences them. The
//! OS is reached only through the traits in [`platform`].

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod input;
pub mod logger;
pub mod patterns;
pub mod platform;
pub mod settings;
pub mod sleep;
pub mod testing;
pub mod types;
pub mod vision;

pub use config::{ChatSpeed, MiningConfig, MoveMode, PatternKind};
pub use control::RunToken;
pub use engine::{Engine, EngineEvent};
pub use error::{PlatformError, RunError, RunResult};
pub use input::Actuator;
pub use types::{EngineState, WindowId};
