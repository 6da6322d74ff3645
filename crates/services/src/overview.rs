use course_core::model::{LectureDescriptor, LectureId, PlaybackState, ProgressRecord};

/// Presentation-agnostic row for one catalog lecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureProgressView {
    pub lecture: LectureDescriptor,
    pub record: ProgressRecord,
    pub is_active: bool,
}

impl LectureProgressView {
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.record.progress_percent()
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.record.status_label()
    }
}

/// Snapshot of the whole course, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOverview {
    pub lectures: Vec<LectureProgressView>,
    pub completed: usize,
    pub total: usize,
    pub active: Option<LectureId>,
    pub state: PlaybackState,
}

impl CourseOverview {
    /// True before any lecture has been selected, when the page shows the
    /// "start first video" prompt.
    #[must_use]
    pub fn awaiting_first_selection(&self) -> bool {
        self.active.is_none()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}
