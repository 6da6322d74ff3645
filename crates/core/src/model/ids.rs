use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of a lecture (the embed id of its video).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LectureId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LectureIdError {
    #[error("lecture id is empty")]
    Empty,
    #[error("lecture id contains whitespace: {0:?}")]
    Whitespace(String),
}

impl LectureId {
    /// Creates a new `LectureId`.
    ///
    /// Surrounding whitespace is trimmed; embedded whitespace is rejected.
    ///
    /// # Errors
    ///
    /// Returns `LectureIdError` if the id is empty or contains whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, LectureIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LectureIdError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(LectureIdError::Whitespace(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LectureId({})", self.0)
    }
}

impl fmt::Display for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LectureId {
    type Err = LectureIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LectureId {
    type Error = LectureIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LectureId> for String {
    fn from(id: LectureId) -> Self {
        id.0
    }
}

impl AsRef<str> for LectureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lecture_id_trims_input() {
        let id = LectureId::new("  Vj8RHrI_fAY ").unwrap();
        assert_eq!(id.as_str(), "Vj8RHrI_fAY");
        assert_eq!(id.to_string(), "Vj8RHrI_fAY");
    }

    #[test]
    fn lecture_id_rejects_empty() {
        assert_eq!(LectureId::new("   "), Err(LectureIdError::Empty));
    }

    #[test]
    fn lecture_id_rejects_inner_whitespace() {
        let result = "abc def".parse::<LectureId>();
        assert!(matches!(result, Err(LectureIdError::Whitespace(_))));
    }

    #[test]
    fn lecture_id_serializes_as_plain_string() {
        let id = LectureId::new("a4RUL1r3KE4").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a4RUL1r3KE4\"");

        let back: LectureId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<LectureId>("\"\"").is_err());
    }
}
