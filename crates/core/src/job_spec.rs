//! Job types and params normalization.
//!
//! Raw job params are loosely typed JSON. [`normalize`] resolves them once,
//! before dispatch, into a [`JobSpec`] whose variants carry fully-defaulted
//! inputs. Anything that had to be defaulted or dropped is reported as a
//! [`ParamWarning`] instead of an error.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::systems::ReadingSystem;

// ---------------------------------------------------------------------------
// Job type tags
// ---------------------------------------------------------------------------

/// Both people, all five systems, overlays, and a final verdict.
pub const JOB_TYPE_BUNDLE: &str = "nuclear_v2";
/// One person, caller-chosen systems.
pub const JOB_TYPE_EXTENDED: &str = "extended";
/// Relationship overlays only, caller-chosen systems.
pub const JOB_TYPE_SYNASTRY: &str = "synastry";
/// Pre-verdict two-person bundle with caller-chosen systems.
pub const JOB_TYPE_LEGACY_BUNDLE: &str = "nuclear";

/// Placeholder used when the first person has no usable name.
pub const PERSON_1_PLACEHOLDER: &str = "Person 1";
/// Placeholder used when the second person has no usable name.
pub const PERSON_2_PLACEHOLDER: &str = "Person 2";

/// The closed set of job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Bundle,
    Extended,
    Synastry,
    LegacyBundle,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Bundle,
        JobKind::Extended,
        JobKind::Synastry,
        JobKind::LegacyBundle,
    ];

    /// Tag stored in `jobs.job_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Bundle => JOB_TYPE_BUNDLE,
            JobKind::Extended => JOB_TYPE_EXTENDED,
            JobKind::Synastry => JOB_TYPE_SYNASTRY,
            JobKind::LegacyBundle => JOB_TYPE_LEGACY_BUNDLE,
        }
    }

    /// Parse a job type tag. Tags are matched exactly.
    pub fn parse(tag: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| CoreError::UnknownJobType {
                tag: tag.to_string(),
                expected: Self::ALL.map(JobKind::as_str).join(", "),
            })
    }

    /// Systems used when params carry none.
    fn default_systems(self) -> Vec<ReadingSystem> {
        match self {
            JobKind::Bundle | JobKind::LegacyBundle => ReadingSystem::CANONICAL.to_vec(),
            JobKind::Extended | JobKind::Synastry => vec![ReadingSystem::CANONICAL[0]],
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Normalized spec
// ---------------------------------------------------------------------------

/// A person a reading is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
}

/// The two people of a relationship job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Couple {
    pub person1: Person,
    pub person2: Person,
}

/// A job with fully-defaulted, strongly typed params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSpec {
    /// Always covers [`ReadingSystem::CANONICAL`].
    Bundle { couple: Couple },
    Extended {
        person: Person,
        systems: Vec<ReadingSystem>,
    },
    Synastry {
        couple: Couple,
        systems: Vec<ReadingSystem>,
    },
    LegacyBundle {
        couple: Couple,
        systems: Vec<ReadingSystem>,
    },
}

impl JobSpec {
    pub fn kind(&self) -> JobKind {
        match self {
            JobSpec::Bundle { .. } => JobKind::Bundle,
            JobSpec::Extended { .. } => JobKind::Extended,
            JobSpec::Synastry { .. } => JobKind::Synastry,
            JobSpec::LegacyBundle { .. } => JobKind::LegacyBundle,
        }
    }

    /// Systems the job's documents cover, in emission order.
    pub fn systems(&self) -> &[ReadingSystem] {
        match self {
            JobSpec::Bundle { .. } => &ReadingSystem::CANONICAL,
            JobSpec::Extended { systems, .. }
            | JobSpec::Synastry { systems, .. }
            | JobSpec::LegacyBundle { systems, .. } => systems,
        }
    }
}

/// Which person slot a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonSlot {
    Person1,
    Person2,
}

impl PersonSlot {
    fn key(self) -> &'static str {
        match self {
            PersonSlot::Person1 => "person1",
            PersonSlot::Person2 => "person2",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            PersonSlot::Person1 => PERSON_1_PLACEHOLDER,
            PersonSlot::Person2 => PERSON_2_PLACEHOLDER,
        }
    }
}

/// Something in the params that was defaulted or ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamWarning {
    /// No usable systems list; the job type's default was used.
    SystemsDefaulted,
    /// A `systems` entry was not a known system name.
    UnknownSystem { value: String },
    /// A system was listed more than once; later occurrences were dropped.
    DuplicateSystem { system: ReadingSystem },
    /// A person had no usable name; the placeholder was used.
    NameDefaulted { slot: PersonSlot },
}

impl fmt::Display for ParamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamWarning::SystemsDefaulted => f.write_str("systems missing or empty, using default"),
            ParamWarning::UnknownSystem { value } => write!(f, "ignored unknown system '{value}'"),
            ParamWarning::DuplicateSystem { system } => {
                write!(f, "ignored duplicate system '{system}'")
            }
            ParamWarning::NameDefaulted { slot } => {
                write!(f, "{} has no name, using '{}'", slot.key(), slot.placeholder())
            }
        }
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedJob {
    pub spec: JobSpec,
    pub warnings: Vec<ParamWarning>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Resolve a job type tag and raw params into a [`JobSpec`].
///
/// Fails only for an unknown job type. Missing or malformed params fields
/// fall back to defaults and are reported in [`NormalizedJob::warnings`].
pub fn normalize(job_type: &str, params: &Value) -> Result<NormalizedJob, CoreError> {
    let kind = JobKind::parse(job_type)?;
    let mut warnings = Vec::new();

    let spec = match kind {
        JobKind::Bundle => JobSpec::Bundle {
            couple: read_couple(params, &mut warnings),
        },
        JobKind::Extended => JobSpec::Extended {
            person: read_person(params, PersonSlot::Person1, &mut warnings),
            systems: read_systems(params, kind, &mut warnings),
        },
        JobKind::Synastry => JobSpec::Synastry {
            couple: read_couple(params, &mut warnings),
            systems: read_systems(params, kind, &mut warnings),
        },
        JobKind::LegacyBundle => JobSpec::LegacyBundle {
            couple: read_couple(params, &mut warnings),
            systems: read_systems(params, kind, &mut warnings),
        },
    };

    Ok(NormalizedJob { spec, warnings })
}

fn read_systems(params: &Value, kind: JobKind, warnings: &mut Vec<ParamWarning>) -> Vec<ReadingSystem> {
    let entries = params
        .get("systems")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut systems = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(system) = entry.as_str().and_then(ReadingSystem::parse_lenient) else {
            let value = match entry {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warnings.push(ParamWarning::UnknownSystem { value });
            continue;
        };
        if seen.insert(system) {
            systems.push(system);
        } else {
            warnings.push(ParamWarning::DuplicateSystem { system });
        }
    }

    if systems.is_empty() {
        warnings.push(ParamWarning::SystemsDefaulted);
        return kind.default_systems();
    }
    systems
}

fn read_couple(params: &Value, warnings: &mut Vec<ParamWarning>) -> Couple {
    Couple {
        person1: read_person(params, PersonSlot::Person1, warnings),
        person2: read_person(params, PersonSlot::Person2, warnings),
    }
}

fn read_person(params: &Value, slot: PersonSlot, warnings: &mut Vec<ParamWarning>) -> Person {
    let name = params
        .get(slot.key())
        .and_then(|person| person.get("name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match name {
        Some(name) => Person {
            name: name.to_string(),
        },
        None => {
            warnings.push(ParamWarning::NameDefaulted { slot });
            Person {
                name: slot.placeholder().to_string(),
            }
        }
    }
}
