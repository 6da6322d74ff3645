use std::sync::Weak;
use std::time::Duration;

use course_core::model::{COMPLETE_PERCENT, LectureId};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::EngineInner;
use crate::player::PlayerAdapter;

/// Why a sampling tick recorded nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPlaying,
    NoActiveLecture,
    DurationUnavailable,
    PositionUnavailable,
    InvalidMeasurement,
}

/// Result of one sampling tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    Recorded { lecture: LectureId, percent: u8 },
    Skipped(SkipReason),
}

impl SampleOutcome {
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Completion percentage for `position` out of `duration` seconds.
///
/// Rounded half up and capped at 100.
///
/// # Errors
///
/// Returns the `SkipReason` when either metric is missing, the duration is
/// not positive, or the ratio comes out NaN or negative.
pub fn progress_percent(position: Option<f64>, duration: Option<f64>) -> Result<u8, SkipReason> {
    let duration = duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or(SkipReason::DurationUnavailable)?;
    let position = position
        .filter(|p| !p.is_nan())
        .ok_or(SkipReason::PositionUnavailable)?;

    let ratio = 100.0 * position / duration;
    if ratio.is_nan() || ratio < 0.0 {
        return Err(SkipReason::InvalidMeasurement);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = ratio.round().min(f64::from(COMPLETE_PERCENT)) as u8;
    Ok(percent)
}

pub(super) fn measure(player: &dyn PlayerAdapter) -> Result<u8, SkipReason> {
    progress_percent(player.current_position(), player.duration())
}

/// Owns the periodic sampling task. Aborts it when stopped or dropped.
#[derive(Debug)]
pub(super) struct SamplerHandle {
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Spawn a task that samples the engine every `period`, first one period
    /// from now.
    ///
    /// The task only holds a weak reference and ends once the engine is gone.
    pub(super) fn spawn(engine: Weak<EngineInner>, period: Duration) -> Self {
        let start = Instant::now() + period;
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.sample_tick().await;
            }
        });
        Self { task }
    }

    pub(super) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_rounded_percent() {
        assert_eq!(progress_percent(Some(30.0), Some(60.0)), Ok(50));
        assert_eq!(progress_percent(Some(1.0), Some(3.0)), Ok(33));
        assert_eq!(progress_percent(Some(2.0), Some(3.0)), Ok(67));
        assert_eq!(progress_percent(Some(0.5), Some(100.0)), Ok(1));
        assert_eq!(progress_percent(Some(0.0), Some(100.0)), Ok(0));
    }

    #[test]
    fn clamps_past_the_end() {
        assert_eq!(progress_percent(Some(61.0), Some(60.0)), Ok(100));
        assert_eq!(progress_percent(Some(f64::INFINITY), Some(60.0)), Ok(100));
    }

    #[test]
    fn skips_unusable_duration() {
        for duration in [None, Some(0.0), Some(-5.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(
                progress_percent(Some(10.0), duration),
                Err(SkipReason::DurationUnavailable),
                "duration {duration:?}"
            );
        }
    }

    #[test]
    fn skips_unusable_position() {
        assert_eq!(
            progress_percent(None, Some(60.0)),
            Err(SkipReason::PositionUnavailable)
        );
        assert_eq!(
            progress_percent(Some(f64::NAN), Some(60.0)),
            Err(SkipReason::PositionUnavailable)
        );
        assert_eq!(
            progress_percent(Some(-1.0), Some(60.0)),
            Err(SkipReason::InvalidMeasurement)
        );
    }
}
