#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod overview;
pub mod player;
pub mod simulated;

pub use engine::{EngineConfig, ProgressTrackingEngine, SampleOutcome, SkipReason};
pub use error::{EngineError, PlayerError};
pub use overview::{CourseOverview, LectureProgressView};
pub use player::{LifecycleSender, PlayerAdapter, PlayerContainer, PlayerFactory, PlayerOptions};
pub use simulated::{PlayerControls, SimulatedPlayerFactory};
