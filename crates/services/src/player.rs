//! Contract between the tracking engine and a host-provided video player.

use std::fmt;
use std::sync::Arc;

use course_core::model::{LectureId, PlayerLifecycle};
use tokio::sync::mpsc;

use crate::error::PlayerError;

/// Channel end a player pushes lifecycle events into.
pub type LifecycleSender = mpsc::UnboundedSender<PlayerLifecycle>;

/// Name of the element the player is embedded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerContainer(String);

impl PlayerContainer {
    pub const DEFAULT: &'static str = "youtube-player";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PlayerContainer {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for PlayerContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Embed options passed on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOptions {
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    /// Whether the player may suggest unrelated videos at the end.
    pub show_related: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            autoplay: true,
            show_related: false,
        }
    }
}

/// A single live player instance.
///
/// Position and duration are in seconds and may be unavailable at any time,
/// in particular right after creation or a new load.
pub trait PlayerAdapter: Send + Sync {
    /// Switch the existing player to another lecture.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` if the player cannot load the lecture.
    fn load_lecture(&self, lecture: &LectureId) -> Result<(), PlayerError>;

    fn current_position(&self) -> Option<f64>;

    fn duration(&self) -> Option<f64>;

    /// Deliver every future lifecycle change to `events`.
    fn subscribe_lifecycle(&self, events: LifecycleSender);

    /// Tear the embed down. Further calls must not panic.
    fn dispose(&self);
}

/// Host capability that constructs player embeds.
pub trait PlayerFactory: Send + Sync {
    /// Create a player bound to `lecture`. Players autoplay when
    /// `options.autoplay` is set.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Unavailable` if the embed capability is not ready.
    fn create(
        &self,
        container: &PlayerContainer,
        lecture: &LectureId,
        options: &PlayerOptions,
    ) -> Result<Arc<dyn PlayerAdapter>, PlayerError>;
}
