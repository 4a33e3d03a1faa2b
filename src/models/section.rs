//! Section paths: where in a document a patch lands.

use crate::error::PatchError;
use std::fmt;

/// Top-level key that hosts the athlete section.
pub const ATHLETE_PARENT: &str = "general";
/// Child key of the athlete section.
pub const ATHLETE_KEY: &str = "athlete";

/// Preferred field order for the athlete section. Keys not listed follow in
/// the data's own order.
pub const ATHLETE_FIELD_ORDER: [&str; 6] = [
    "birthday",
    "maxHeartRateFormula",
    "restingHeartRateFormula",
    "heartRateZones",
    "weightHistory",
    "ftpHistory",
];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Dotted reference to a section.
pub enum SectionPath {
    /// A single top-level key, e.g. `general`.
    Top(String),
    /// `parent.child`, e.g. `appearance.dashboard`.
    Nested { parent: String, child: String },
    /// `general.athlete`, which carries its own field order.
    Athlete,
}

impl SectionPath {
    /// Parse a section name. `is_athlete` (or the bare name `athlete`) selects
    /// the athlete section regardless of the name's shape.
    pub fn parse(name: &str, is_athlete: bool) -> Result<Self, PatchError> {
        if is_athlete || name == ATHLETE_KEY {
            return Ok(SectionPath::Athlete);
        }
        let invalid = || PatchError::InvalidSectionPath(name.to_string());
        let segments: Vec<&str> = name.split('.').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || s.trim() != *s)
        {
            return Err(invalid());
        }
        match segments.as_slice() {
            [key] => Ok(SectionPath::Top(key.to_string())),
            [parent, child] => Ok(SectionPath::Nested {
                parent: parent.to_string(),
                child: child.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Whether `preserveNestedKeys` applies to this path.
    pub fn supports_preserved_keys(&self) -> bool {
        matches!(self, SectionPath::Top(_))
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionPath::Top(key) => write!(f, "{}", key),
            SectionPath::Nested { parent, child } => write!(f, "{}.{}", parent, child),
            SectionPath::Athlete => write!(f, "{}.{}", ATHLETE_PARENT, ATHLETE_KEY),
        }
    }
}
