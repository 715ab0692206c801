// 🔥 Roast Level - closed set of roast classifications
//
// Parsing is case-insensitive and ignores surrounding whitespace:
// "light", " Light ", "LIGHT" all resolve to RoastLevel::Light.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ROAST LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoastLevel {
    Light,
    Medium,
    Dark,
}

/// Returned when text does not name a roast level
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid roast level: {0:?} (expected LIGHT, MEDIUM or DARK)")]
pub struct RoastLevelError(pub String);

impl RoastLevel {
    /// Every level, in display order
    pub const ALL: [RoastLevel; 3] = [RoastLevel::Light, RoastLevel::Medium, RoastLevel::Dark];

    /// Canonical upper-case name (also the stored/imported form)
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "LIGHT",
            RoastLevel::Medium => "MEDIUM",
            RoastLevel::Dark => "DARK",
        }
    }

    /// Next level in display order, wrapping around (used by the form UI)
    pub fn next(&self) -> Self {
        match self {
            RoastLevel::Light => RoastLevel::Medium,
            RoastLevel::Medium => RoastLevel::Dark,
            RoastLevel::Dark => RoastLevel::Light,
        }
    }
}

impl FromStr for RoastLevel {
    type Err = RoastLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        RoastLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RoastLevelError(value.to_string()))
    }
}

impl fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
