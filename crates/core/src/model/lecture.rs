use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::model::LectureId;

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog has no lectures")]
    Empty,

    #[error("duplicate lecture id in catalog: {0}")]
    DuplicateLecture(LectureId),

    #[error("lecture {id} has an empty title")]
    MissingTitle { id: LectureId },
}

/// One catalog-listed lecture. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureDescriptor {
    id: LectureId,
    title: String,
    description: String,
}

impl LectureDescriptor {
    #[must_use]
    pub fn new(id: LectureId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &LectureId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Preview image for the lecture's video.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<Url> {
        Url::parse(THUMBNAIL_BASE)
            .and_then(|base| base.join(&format!("{}/maxresdefault.jpg", self.id)))
            .ok()
    }
}

/// Ordered, read-only list of lectures.
///
/// Order is display order only; progress is always keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    lectures: Vec<LectureDescriptor>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists, blank titles and duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if any of the above checks fail.
    pub fn new(lectures: Vec<LectureDescriptor>) -> Result<Self, CatalogError> {
        if lectures.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(lectures.len());
        for lecture in &lectures {
            if lecture.title.trim().is_empty() {
                return Err(CatalogError::MissingTitle {
                    id: lecture.id.clone(),
                });
            }
            if !seen.insert(&lecture.id) {
                return Err(CatalogError::DuplicateLecture(lecture.id.clone()));
            }
        }

        Ok(Self { lectures })
    }

    #[must_use]
    pub fn lectures(&self) -> &[LectureDescriptor] {
        &self.lectures
    }

    #[must_use]
    pub fn get(&self, id: &LectureId) -> Option<&LectureDescriptor> {
        self.lectures.iter().find(|lecture| &lecture.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &LectureId) -> bool {
        self.get(id).is_some()
    }

    /// The lecture offered by the "start first video" prompt.
    #[must_use]
    pub fn first(&self) -> &LectureDescriptor {
        // Non-empty by construction.
        &self.lectures[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lectures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lectures.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &LectureId> {
        self.lectures.iter().map(LectureDescriptor::id)
    }

    /// The nine-part OpenTelemetry video course.
    ///
    /// # Panics
    ///
    /// Panics if the built-in table is edited into an invalid catalog.
    #[must_use]
    pub fn opentelemetry_course() -> Self {
        const LECTURES: [(&str, &str, &str); 9] = [
            (
                "Vj8RHrI_fAY",
                "Introduction to Observability and OpenTelemetry",
                "Overview of Observability and the importance of monitoring. Introduces OpenTelemetry as a unified standard for distributed tracing, metrics, and logging.",
            ),
            (
                "a4RUL1r3KE4",
                "Architecture and Components of OpenTelemetry",
                "Covers OpenTelemetry's core components and architecture, including the SDK, API, and the role of the OpenTelemetry Collector in the observability pipeline.",
            ),
            (
                "8subH8Sb2b8",
                "OpenTelemetry Tracing",
                "Introduction to distributed tracing with OpenTelemetry. Learn how to instrument applications for tracing across different languages, and how to export trace data to observability platforms.",
            ),
            (
                "ASgosEzG4Pw",
                "OpenTelemetry Metrics",
                "Focuses on metrics collection and exporting, explaining different types of metrics (counters, gauges, histograms) and how to use OpenTelemetry to monitor application performance.",
            ),
            (
                "l65h40vG3vg",
                "OpenTelemetry Logging",
                "Learn about structured logging and how to integrate logging with OpenTelemetry, collecting and exporting logs to various backend systems for analysis.",
            ),
            (
                "7BhzaEVqsS4",
                "OpenTelemetry Collector and Processors",
                "A deep dive into the OpenTelemetry Collector, its setup, and how to configure processors and exporters to tailor data pipelines for different observability needs.",
            ),
            (
                "GMMdBR_61qw",
                "OpenTelemetry in Real-world Scenarios",
                "Explore practical examples of OpenTelemetry in action within microservices, cloud environments (AWS, Google Cloud, Azure), and Kubernetes, showcasing real-world use cases.",
            ),
            (
                "Hb24x1_wDXQ",
                "Best Practices and Performance Considerations",
                "Guidelines for performance optimization when using OpenTelemetry, avoiding overhead, and securing data collection pipelines to maintain privacy and compliance.",
            ),
            (
                "vGPpaTpTOdA",
                "Advanced Topics and Future of OpenTelemetry",
                "Explore advanced custom instrumentation, monitoring for AI/ML applications, and the future trends of OpenTelemetry in observability and beyond.",
            ),
        ];

        let lectures = LECTURES
            .iter()
            .map(|(id, title, description)| {
                let id = LectureId::new(*id).expect("built-in lecture id is valid");
                LectureDescriptor::new(id, *title, *description)
            })
            .collect();
        Self::new(lectures).expect("built-in catalog is valid")
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let lectures = Vec::<LectureDescriptor>::deserialize(deserializer)?;
        Self::new(lectures).map_err(serde::de::Error::custom)
    }
}
