mod ids;
mod lecture;
mod playback;
mod progress;

pub use ids::{LectureId, LectureIdError};
pub use lecture::{Catalog, CatalogError, LectureDescriptor};
pub use playback::{PlaybackState, PlayerLifecycle};
pub use progress::{COMPLETE_PERCENT, ProgressRecord, ProgressSet};
