//! Positional element fingerprint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root-relative positional path of an element, e.g. `/html/body/div[2]/a`.
///
/// Stable for a fixed DOM shape only; structural mutation may change it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementFingerprint(String);

impl ElementFingerprint {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of levels in the path.
    pub fn depth(&self) -> usize {
        self.0.split('/').filter(|s| !s.is_empty()).count()
    }
}

impl fmt::Display for ElementFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ElementFingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ElementFingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
