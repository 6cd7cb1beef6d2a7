//! The closed set of reading traditions a job can cover.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reading tradition.
///
/// Serialized as its snake_case wire name (`"human_design"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSystem {
    Western,
    Vedic,
    HumanDesign,
    GeneKeys,
    Kabbalah,
}

impl ReadingSystem {
    /// All systems in canonical order. Bundles walk this order and
    /// single-system defaults take its first entry.
    pub const CANONICAL: [ReadingSystem; 5] = [
        ReadingSystem::Western,
        ReadingSystem::Vedic,
        ReadingSystem::HumanDesign,
        ReadingSystem::GeneKeys,
        ReadingSystem::Kabbalah,
    ];

    /// Wire name stored in job params and task input.
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingSystem::Western => "western",
            ReadingSystem::Vedic => "vedic",
            ReadingSystem::HumanDesign => "human_design",
            ReadingSystem::GeneKeys => "gene_keys",
            ReadingSystem::Kabbalah => "kabbalah",
        }
    }

    /// Name used in generated document titles.
    pub fn display_name(self) -> &'static str {
        match self {
            ReadingSystem::Western => "Western Astrology",
            ReadingSystem::Vedic => "Vedic Astrology",
            ReadingSystem::HumanDesign => "Human Design",
            ReadingSystem::GeneKeys => "Gene Keys",
            ReadingSystem::Kabbalah => "Kabbalah",
        }
    }

    /// Lenient lookup used for client-supplied params.
    ///
    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::CANONICAL
            .into_iter()
            .find(|system| system.as_str() == normalized)
    }
}

impl fmt::Display for ReadingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
