use std::fmt;

/// Lifecycle event reported by a player embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerLifecycle {
    Playing,
    Paused,
    Ended,
}

/// Where the tracked player session currently is.
///
/// `Idle` means no player has been created yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    #[must_use]
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl From<PlayerLifecycle> for PlaybackState {
    fn from(event: PlayerLifecycle) -> Self {
        match event {
            PlayerLifecycle::Playing => Self::Playing,
            PlayerLifecycle::Paused => Self::Paused,
            PlayerLifecycle::Ended => Self::Ended,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        };
        f.write_str(label)
    }
}
