use std::sync::Arc;

use course_core::model::{LectureId, PlaybackState};
use tokio::task::JoinHandle;
use tracing::debug;

use super::sampler::SamplerHandle;
use crate::player::PlayerAdapter;

/// The single live player session owned by the engine.
///
/// Dropping the session cancels the sampler, stops the lifecycle pump and
/// disposes the player.
#[derive(Default)]
pub(super) struct PlayerSession {
    pub(super) active_lecture: Option<LectureId>,
    pub(super) player: Option<Arc<dyn PlayerAdapter>>,
    pub(super) sampler: Option<SamplerHandle>,
    pub(super) lifecycle_pump: Option<JoinHandle<()>>,
    pub(super) state: PlaybackState,
}

impl PlayerSession {
    pub(super) fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(SamplerHandle::is_running)
    }

    /// Idempotent.
    pub(super) fn stop_sampler(&mut self) {
        if self.sampler.take().is_some() {
            debug!(lecture = ?self.active_lecture, "sampler stopped");
        }
    }

    /// Release everything and go back to `Idle`.
    pub(super) fn teardown(&mut self) {
        self.stop_sampler();
        if let Some(pump) = self.lifecycle_pump.take() {
            pump.abort();
        }
        if let Some(player) = self.player.take() {
            player.dispose();
        }
        self.active_lecture = None;
        self.state = PlaybackState::Idle;
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
