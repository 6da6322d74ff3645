//! In-process player used by the CLI host and by tests.
//!
//! Metrics are driven through `PlayerControls`; nothing advances on its own
//! unless `PlayerControls::play_through` is running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use course_core::model::{LectureId, PlayerLifecycle};
use tracing::debug;

use crate::error::PlayerError;
use crate::player::{LifecycleSender, PlayerAdapter, PlayerContainer, PlayerFactory, PlayerOptions};

#[derive(Debug)]
struct SimulatedState {
    available: bool,
    created: usize,
    disposed: bool,
    lecture: Option<LectureId>,
    loaded: Vec<LectureId>,
    position: Option<f64>,
    duration: Option<f64>,
    subscribers: Vec<LifecycleSender>,
    last_options: Option<PlayerOptions>,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            available: true,
            created: 0,
            disposed: false,
            lecture: None,
            loaded: Vec::new(),
            position: None,
            duration: None,
            subscribers: Vec::new(),
            last_options: None,
        }
    }
}

/// Handle for steering and inspecting the simulated player.
#[derive(Debug, Clone, Default)]
pub struct PlayerControls {
    state: Arc<Mutex<SimulatedState>>,
}

impl PlayerControls {
    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `create` fail with `PlayerError::Unavailable` until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    pub fn set_position(&self, position: Option<f64>) {
        self.lock().position = position;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.lock().duration = duration;
    }

    pub fn set_metrics(&self, position: f64, duration: f64) {
        let mut state = self.lock();
        state.position = Some(position);
        state.duration = Some(duration);
    }

    /// Report a lifecycle change to every subscriber. Returns how many
    /// subscribers received it.
    pub fn emit(&self, event: PlayerLifecycle) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| tx.send(event).is_ok());
        state.subscribers.len()
    }

    #[must_use]
    pub fn current_lecture(&self) -> Option<LectureId> {
        self.lock().lecture.clone()
    }

    /// Every lecture the player was created with or told to load, in order.
    #[must_use]
    pub fn loaded_lectures(&self) -> Vec<LectureId> {
        self.lock().loaded.clone()
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.lock().created
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    #[must_use]
    pub fn last_options(&self) -> Option<PlayerOptions> {
        self.lock().last_options.clone()
    }

    /// Play the current lecture from the start at `speed`x.
    ///
    /// Emits `Playing`, advances the position every `step` of wall time, then
    /// emits `Ended` at the end, or `Paused` once `pause_at` percent is reached.
    pub async fn play_through(
        &self,
        duration_secs: f64,
        speed: f64,
        step: Duration,
        pause_at: Option<u8>,
    ) -> PlayerLifecycle {
        self.set_metrics(0.0, duration_secs);
        self.emit(PlayerLifecycle::Playing);

        let advance = step.as_secs_f64() * speed;
        let pause_position = pause_at.map(|pct| duration_secs * f64::from(pct.min(100)) / 100.0);
        let mut position = 0.0_f64;

        loop {
            tokio::time::sleep(step).await;
            if self.is_disposed() {
                return PlayerLifecycle::Paused;
            }
            position = (position + advance).min(duration_secs);
            self.set_position(Some(position));

            if let Some(limit) = pause_position {
                if position >= limit {
                    self.emit(PlayerLifecycle::Paused);
                    return PlayerLifecycle::Paused;
                }
            }
            if position >= duration_secs {
                self.emit(PlayerLifecycle::Ended);
                return PlayerLifecycle::Ended;
            }
        }
    }
}

/// Player instance handed to the engine.
pub struct SimulatedPlayer {
    controls: PlayerControls,
}

impl PlayerAdapter for SimulatedPlayer {
    fn load_lecture(&self, lecture: &LectureId) -> Result<(), PlayerError> {
        let mut state = self.controls.lock();
        if state.disposed {
            return Err(PlayerError::Disposed);
        }
        state.lecture = Some(lecture.clone());
        state.loaded.push(lecture.clone());
        // Metadata for the new video arrives later.
        state.position = None;
        state.duration = None;
        Ok(())
    }

    fn current_position(&self) -> Option<f64> {
        let state = self.controls.lock();
        if state.disposed { None } else { state.position }
    }

    fn duration(&self) -> Option<f64> {
        let state = self.controls.lock();
        if state.disposed { None } else { state.duration }
    }

    fn subscribe_lifecycle(&self, events: LifecycleSender) {
        self.controls.lock().subscribers.push(events);
    }

    fn dispose(&self) {
        let mut state = self.controls.lock();
        state.disposed = true;
        state.subscribers.clear();
        debug!("simulated player disposed");
    }
}

/// Factory for `SimulatedPlayer`s that all share one set of controls.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayerFactory {
    controls: PlayerControls,
}

impl SimulatedPlayerFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn controls(&self) -> PlayerControls {
        self.controls.clone()
    }
}

impl PlayerFactory for SimulatedPlayerFactory {
    fn create(
        &self,
        container: &PlayerContainer,
        lecture: &LectureId,
        options: &PlayerOptions,
    ) -> Result<Arc<dyn PlayerAdapter>, PlayerError> {
        {
            let mut state = self.controls.lock();
            if !state.available {
                return Err(PlayerError::Unavailable);
            }
            state.created += 1;
            state.disposed = false;
            state.lecture = Some(lecture.clone());
            state.loaded.push(lecture.clone());
            state.position = None;
            state.duration = None;
            state.last_options = Some(options.clone());
        }
        debug!(container = %container, lecture = %lecture, "simulated player created");
        Ok(Arc::new(SimulatedPlayer {
            controls: self.controls.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn id(raw: &str) -> LectureId {
        LectureId::new(raw).unwrap()
    }

    #[test]
    fn metrics_are_unavailable_until_set() {
        let factory = SimulatedPlayerFactory::new();
        let player = factory
            .create(&PlayerContainer::default(), &id("a"), &PlayerOptions::default())
            .unwrap();
        assert_eq!(player.duration(), None);

        factory.controls().set_metrics(12.0, 60.0);
        assert_eq!(player.current_position(), Some(12.0));
        assert_eq!(player.duration(), Some(60.0));

        player.load_lecture(&id("b")).unwrap();
        assert_eq!(player.duration(), None);
        assert_eq!(factory.controls().loaded_lectures(), vec![id("a"), id("b")]);
    }

    #[test]
    fn unavailable_factory_refuses_to_create() {
        let factory = SimulatedPlayerFactory::new();
        factory.controls().set_available(false);
        let result = factory.create(&PlayerContainer::default(), &id("a"), &PlayerOptions::default());
        assert!(matches!(result, Err(PlayerError::Unavailable)));
        assert_eq!(factory.controls().created_count(), 0);
    }

    #[test]
    fn disposed_player_stops_reporting() {
        let factory = SimulatedPlayerFactory::new();
        let player = factory
            .create(&PlayerContainer::default(), &id("a"), &PlayerOptions::default())
            .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        player.subscribe_lifecycle(tx);
        factory.controls().set_metrics(1.0, 2.0);

        player.dispose();
        player.dispose();
        assert!(factory.controls().is_disposed());
        assert_eq!(player.current_position(), None);
        assert_eq!(factory.controls().emit(PlayerLifecycle::Playing), 0);
        assert_eq!(player.load_lecture(&id("b")), Err(PlayerError::Disposed));
    }

    #[tokio::test(start_paused = true)]
    async fn play_through_emits_playing_then_ended() {
        let factory = SimulatedPlayerFactory::new();
        let player = factory
            .create(&PlayerContainer::default(), &id("a"), &PlayerOptions::default())
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        player.subscribe_lifecycle(tx);

        let last = factory
            .controls()
            .play_through(30.0, 10.0, Duration::from_secs(1), None)
            .await;

        assert_eq!(last, PlayerLifecycle::Ended);
        assert_eq!(rx.recv().await, Some(PlayerLifecycle::Playing));
        assert_eq!(rx.recv().await, Some(PlayerLifecycle::Ended));
        assert_eq!(player.current_position(), Some(30.0));
    }

    #[tokio::test(start_paused = true)]
    async fn play_through_pauses_at_threshold() {
        let factory = SimulatedPlayerFactory::new();
        let player = factory
            .create(&PlayerContainer::default(), &id("a"), &PlayerOptions::default())
            .unwrap();

        let last = factory
            .controls()
            .play_through(100.0, 10.0, Duration::from_secs(1), Some(40))
            .await;
        assert_eq!(last, PlayerLifecycle::Paused);
        let position = player.current_position().unwrap();
        assert!((40.0..=50.0).contains(&position));
    }
}
