use crate::model::{Catalog, LectureId};

/// Upper bound of a progress percentage.
pub const COMPLETE_PERCENT: u8 = 100;

/// Completion state for one lecture.
///
/// Invariants: a record that is not started has 0%, and a record at 100% is
/// always started. Every constructor upholds both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressRecord {
    lecture_id: LectureId,
    progress_percent: u8,
    started: bool,
}

impl ProgressRecord {
    #[must_use]
    pub fn not_started(lecture_id: LectureId) -> Self {
        Self {
            lecture_id,
            progress_percent: 0,
            started: false,
        }
    }

    /// A started record at `percent`, clamped to 100.
    #[must_use]
    pub fn in_progress(lecture_id: LectureId, percent: u8) -> Self {
        Self {
            lecture_id,
            progress_percent: percent.min(COMPLETE_PERCENT),
            started: true,
        }
    }

    #[must_use]
    pub fn completed(lecture_id: LectureId) -> Self {
        Self::in_progress(lecture_id, COMPLETE_PERCENT)
    }

    /// Rebuild a record from persisted fields, repairing invariant violations.
    ///
    /// Out-of-range percentages are clamped into `0..=100` and any nonzero
    /// percentage marks the record as started.
    #[must_use]
    pub fn from_persisted(lecture_id: LectureId, progress: i64, started: bool) -> Self {
        let percent = u8::try_from(progress.clamp(0, i64::from(COMPLETE_PERCENT))).unwrap_or(0);
        if started || percent > 0 {
            Self::in_progress(lecture_id, percent)
        } else {
            Self::not_started(lecture_id)
        }
    }

    #[must_use]
    pub fn lecture_id(&self) -> &LectureId {
        &self.lecture_id
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress_percent == COMPLETE_PERCENT
    }

    /// Caption shown under a lecture's progress bar.
    #[must_use]
    pub fn status_label(&self) -> String {
        if self.started {
            format!("{}% complete", self.progress_percent)
        } else {
            "Not started".to_owned()
        }
    }
}

/// Progress for every known lecture, looked up by id.
///
/// Records keep insertion order so the persisted array stays stable between
/// saves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSet {
    records: Vec<ProgressRecord>,
}

impl ProgressSet {
    /// One zeroed record per catalog lecture, in catalog order.
    #[must_use]
    pub fn zeroed_for(catalog: &Catalog) -> Self {
        Self {
            records: catalog
                .ids()
                .cloned()
                .map(ProgressRecord::not_started)
                .collect(),
        }
    }

    /// Build a set from raw records; when an id repeats, the first one wins.
    #[must_use]
    pub fn from_records(records: Vec<ProgressRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            if set.get(record.lecture_id()).is_none() {
                set.records.push(record);
            }
        }
        set
    }

    #[must_use]
    pub fn get(&self, id: &LectureId) -> Option<&ProgressRecord> {
        self.records.iter().find(|r| &r.lecture_id == id)
    }

    /// The stored record, or a zeroed one if this lecture was never seen.
    ///
    /// Does not insert the fallback.
    #[must_use]
    pub fn record_or_default(&self, id: &LectureId) -> ProgressRecord {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::not_started(id.clone()))
    }

    /// Replace the record with the same id, or append it.
    pub fn upsert(&mut self, record: ProgressRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.lecture_id == record.lecture_id)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of catalog lectures watched to the end.
    #[must_use]
    pub fn completed_count(&self, catalog: &Catalog) -> usize {
        catalog
            .ids()
            .filter(|id| self.get(id).is_some_and(ProgressRecord::is_complete))
            .count()
    }
}
