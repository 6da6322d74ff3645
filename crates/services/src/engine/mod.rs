//! Playback progress tracking.
//!
//! `ProgressTrackingEngine` owns the single player session, turns player
//! lifecycle events into state transitions, samples the playback position
//! while playing and writes every progress change through to the store.

mod sampler;
mod session;

use std::sync::{Arc, Weak};
use std::time::Duration;

use course_core::model::{
    Catalog, LectureId, PlaybackState, PlayerLifecycle, ProgressRecord, ProgressSet,
};
use storage::ProgressStore;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::overview::{CourseOverview, LectureProgressView};
use crate::player::{PlayerContainer, PlayerFactory, PlayerOptions};

pub use sampler::{SampleOutcome, SkipReason, progress_percent};

use sampler::SamplerHandle;
use session::PlayerSession;

/// Tunables for the engine. Defaults match the course page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub sample_interval: Duration,
    pub container: PlayerContainer,
    pub player_options: PlayerOptions,
}

impl EngineConfig {
    pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval: Self::DEFAULT_SAMPLE_INTERVAL,
            container: PlayerContainer::default(),
            player_options: PlayerOptions::default(),
        }
    }
}

struct EngineState {
    progress: ProgressSet,
    session: PlayerSession,
}

pub(crate) struct EngineInner {
    catalog: Catalog,
    store: ProgressStore,
    factory: Arc<dyn PlayerFactory>,
    config: EngineConfig,
    state: Mutex<EngineState>,
}

/// Tracks per-lecture progress for one course view.
///
/// All mutations go through one lock, so lifecycle handlers, sampler ticks
/// and selections never interleave. Dropping the engine cancels the sampler
/// and disposes the player.
pub struct ProgressTrackingEngine {
    inner: Arc<EngineInner>,
}

impl ProgressTrackingEngine {
    /// Build the engine and restore persisted progress.
    ///
    /// Absent, corrupt or unreadable progress falls back to one zeroed record
    /// per catalog lecture.
    pub async fn start(
        catalog: Catalog,
        store: ProgressStore,
        factory: Arc<dyn PlayerFactory>,
        config: EngineConfig,
    ) -> Self {
        let progress = match store.load().await {
            Ok(Some(progress)) => progress,
            Ok(None) => ProgressSet::zeroed_for(&catalog),
            Err(err) => {
                warn!(error = %err, "could not read stored progress; starting from zero");
                ProgressSet::zeroed_for(&catalog)
            }
        };
        info!(
            lectures = catalog.len(),
            records = progress.len(),
            "progress tracking engine started"
        );

        Self {
            inner: Arc::new(EngineInner {
                catalog,
                store,
                factory,
                config,
                state: Mutex::new(EngineState {
                    progress,
                    session: PlayerSession::default(),
                }),
            }),
        }
    }

    /// Make `id` the playing lecture.
    ///
    /// The first selection creates the player; later ones reuse it. Each
    /// selection gets its own lifecycle subscription, so events still queued
    /// for the previous lecture are discarded. Stored progress for the lecture
    /// is left as is.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` for ids outside the catalog, before
    /// touching the player. Returns `EngineError::Player` if the player cannot
    /// be created or cannot load the lecture; the session is left unchanged.
    pub async fn select_lecture(&self, id: &LectureId) -> Result<(), EngineError> {
        self.inner.select_lecture(id).await
    }

    /// Apply a player lifecycle event. This is what the lifecycle subscription
    /// feeds; hosts that receive events some other way can call it directly.
    pub async fn handle_lifecycle(&self, event: PlayerLifecycle) {
        self.inner.handle_lifecycle(event).await;
    }

    /// Take one progress sample right now, as the periodic sampler would.
    pub async fn sample_tick(&self) -> SampleOutcome {
        self.inner.sample_tick().await
    }

    /// Cancel sampling, dispose the player and return to `Idle`.
    ///
    /// Progress is kept; a later selection creates a fresh player.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.session.teardown();
        info!("progress tracking session torn down");
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub async fn progress(&self) -> ProgressSet {
        self.inner.state.lock().await.progress.clone()
    }

    /// Progress for `id`, zeroed if never recorded.
    pub async fn record(&self, id: &LectureId) -> ProgressRecord {
        self.inner.state.lock().await.progress.record_or_default(id)
    }

    pub async fn active_lecture(&self) -> Option<LectureId> {
        self.inner.state.lock().await.session.active_lecture.clone()
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.state.lock().await.session.state
    }

    pub async fn is_sampling(&self) -> bool {
        self.inner.state.lock().await.session.is_sampling()
    }

    /// Every catalog lecture with its progress, in display order.
    pub async fn overview(&self) -> CourseOverview {
        let state = self.inner.state.lock().await;
        let active = state.session.active_lecture.clone();
        let lectures = self
            .inner
            .catalog
            .lectures()
            .iter()
            .map(|lecture| LectureProgressView {
                record: state.progress.record_or_default(lecture.id()),
                is_active: active.as_ref() == Some(lecture.id()),
                lecture: lecture.clone(),
            })
            .collect();

        CourseOverview {
            lectures,
            completed: state.progress.completed_count(&self.inner.catalog),
            total: self.inner.catalog.len(),
            active,
            state: state.session.state,
        }
    }
}

impl EngineInner {
    async fn select_lecture(self: &Arc<Self>, id: &LectureId) -> Result<(), EngineError> {
        if !self.catalog.contains(id) {
            warn!(lecture = %id, "selected lecture is not in the catalog");
            return Err(EngineError::NotFound(id.clone()));
        }

        let mut state = self.state.lock().await;
        let session = &mut state.session;

        let player = match session.player.clone() {
            Some(player) => {
                player.load_lecture(id)?;
                debug!(lecture = %id, previous = ?session.active_lecture, "loaded lecture into existing player");
                player
            }
            None => {
                let player = self.factory.create(
                    &self.config.container,
                    id,
                    &self.config.player_options,
                )?;
                info!(lecture = %id, container = %self.config.container, "player created");
                session.player = Some(Arc::clone(&player));
                player
            }
        };

        // One subscription per loaded lecture. Aborting the old pump drops
        // events the previous lecture queued before the switch.
        let (tx, rx) = mpsc::unbounded_channel();
        player.subscribe_lifecycle(tx);
        let pump = spawn_lifecycle_pump(Arc::downgrade(self), rx);
        if let Some(previous) = session.lifecycle_pump.replace(pump) {
            previous.abort();
        }

        session.active_lecture = Some(id.clone());
        session.state = PlaybackState::Playing;
        Ok(())
    }

    async fn handle_lifecycle(self: &Arc<Self>, event: PlayerLifecycle) {
        let mut state = self.state.lock().await;
        let EngineState { progress, session } = &mut *state;

        if session.player.is_none() {
            debug!(?event, "lifecycle event without a player; ignoring");
            return;
        }
        session.state = PlaybackState::from(event);

        match event {
            PlayerLifecycle::Playing => {
                if session.is_sampling() {
                    debug!("sampler already running");
                } else {
                    session.sampler = Some(SamplerHandle::spawn(
                        Arc::downgrade(self),
                        self.config.sample_interval,
                    ));
                    debug!(lecture = ?session.active_lecture, "sampler started");
                }
            }
            PlayerLifecycle::Paused => session.stop_sampler(),
            PlayerLifecycle::Ended => {
                session.stop_sampler();
                match session.active_lecture.clone() {
                    Some(lecture) => {
                        info!(lecture = %lecture, "lecture completed");
                        self.persist(progress, ProgressRecord::completed(lecture))
                            .await;
                    }
                    None => debug!("ended without an active lecture"),
                }
            }
        }
    }

    /// Reads the session as it is now, never a lecture captured earlier.
    async fn sample_tick(&self) -> SampleOutcome {
        let mut state = self.state.lock().await;
        let EngineState { progress, session } = &mut *state;

        if session.state != PlaybackState::Playing {
            return SampleOutcome::Skipped(SkipReason::NotPlaying);
        }
        let (Some(lecture), Some(player)) = (session.active_lecture.clone(), session.player.as_ref())
        else {
            return SampleOutcome::Skipped(SkipReason::NoActiveLecture);
        };

        let percent = match sampler::measure(player.as_ref()) {
            Ok(percent) => percent,
            Err(reason) => {
                debug!(lecture = %lecture, ?reason, "skipping progress sample");
                return SampleOutcome::Skipped(reason);
            }
        };

        self.persist(progress, ProgressRecord::in_progress(lecture.clone(), percent))
            .await;
        SampleOutcome::Recorded { lecture, percent }
    }

    /// Write-through: update memory, then save the whole set.
    ///
    /// A failed save is logged; the in-memory set keeps the update and the
    /// next successful save persists it.
    async fn persist(&self, progress: &mut ProgressSet, record: ProgressRecord) {
        debug!(
            lecture = %record.lecture_id(),
            percent = record.progress_percent(),
            "recording progress"
        );
        progress.upsert(record);
        if let Err(err) = self.store.save(progress).await {
            warn!(error = %err, key = self.store.key(), "failed to save progress");
        }
    }
}

fn spawn_lifecycle_pump(
    engine: Weak<EngineInner>,
    mut events: mpsc::UnboundedReceiver<PlayerLifecycle>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(engine) = engine.upgrade() else {
                break;
            };
            engine.handle_lifecycle(event).await;
        }
    })
}
