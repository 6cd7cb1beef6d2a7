//! Task fan-out: expanding a [`JobSpec`] into its ordered task list.
//!
//! The rule is a pure function. A job's documents are first planned as an
//! ordered list of `(system, doc type)` entries, then folded into
//! [`TaskDescriptor`]s while two independent counters advance: the
//! zero-based `sequence` and the one-based `doc_num`.

use serde::{Deserialize, Serialize};

use crate::job_spec::{Couple, JobSpec};
use crate::systems::ReadingSystem;

/// Task type of every task created by fan-out.
pub const TASK_TYPE_TEXT_GENERATION: &str = "text_generation";

/// Number of tasks a [`JobSpec::Bundle`] always produces.
pub const BUNDLE_TASK_COUNT: usize = ReadingSystem::CANONICAL.len() * 3 + 1;

/// The kind of document a task generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Reading for the first person of a couple.
    Person1,
    /// Reading for the second person of a couple.
    Person2,
    /// Relationship overlay for a couple within one system.
    Overlay,
    /// Reading for the only person of a single-person job.
    Individual,
    /// Final synthesis across all systems of a bundle.
    Verdict,
}

/// Structured input handed to the text generation worker.
///
/// Serialized in camelCase (`docNum`, `docType`) since that is the shape
/// downstream consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub doc_num: i32,
    pub doc_type: DocType,
    /// `None` only for the verdict.
    pub system: Option<ReadingSystem>,
    pub title: String,
}

/// One task to create for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub sequence: i32,
    pub task_type: &'static str,
    pub input: TaskInput,
}

/// A per-system document. The verdict is not tied to a system and is
/// planned separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemDoc {
    Person1,
    Person2,
    Overlay,
    Individual,
}

impl SystemDoc {
    const COUPLE: [SystemDoc; 3] = [SystemDoc::Person1, SystemDoc::Person2, SystemDoc::Overlay];

    fn doc_type(self) -> DocType {
        match self {
            SystemDoc::Person1 => DocType::Person1,
            SystemDoc::Person2 => DocType::Person2,
            SystemDoc::Overlay => DocType::Overlay,
            SystemDoc::Individual => DocType::Individual,
        }
    }
}

/// A planned document before numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Planned {
    PerSystem(ReadingSystem, SystemDoc),
    Verdict,
}

impl Planned {
    fn doc_type(self) -> DocType {
        match self {
            Planned::PerSystem(_, doc) => doc.doc_type(),
            Planned::Verdict => DocType::Verdict,
        }
    }

    fn system(self) -> Option<ReadingSystem> {
        match self {
            Planned::PerSystem(system, _) => Some(system),
            Planned::Verdict => None,
        }
    }
}

/// Running counters threaded through the fold.
#[derive(Debug, Clone, Copy)]
struct Counters {
    sequence: i32,
    doc_num: i32,
}

impl Counters {
    const START: Counters = Counters {
        sequence: 0,
        doc_num: 1,
    };

    fn advance(self) -> Self {
        Counters {
            sequence: self.sequence + 1,
            doc_num: self.doc_num + 1,
        }
    }
}

/// Expand a job into its ordered task list.
pub fn fan_out(spec: &JobSpec) -> Vec<TaskDescriptor> {
    let planned = plan(spec);
    let capacity = planned.len();

    let (_, tasks) = planned.into_iter().fold(
        (Counters::START, Vec::with_capacity(capacity)),
        |(counters, mut tasks), doc| {
            tasks.push(TaskDescriptor {
                sequence: counters.sequence,
                task_type: TASK_TYPE_TEXT_GENERATION,
                input: TaskInput {
                    doc_num: counters.doc_num,
                    doc_type: doc.doc_type(),
                    system: doc.system(),
                    title: title(spec, doc),
                },
            });
            (counters.advance(), tasks)
        },
    );
    tasks
}

fn plan(spec: &JobSpec) -> Vec<Planned> {
    match spec {
        JobSpec::Bundle { .. } => {
            let mut docs = couple_docs(&ReadingSystem::CANONICAL);
            docs.push(Planned::Verdict);
            docs
        }
        JobSpec::LegacyBundle { systems, .. } => couple_docs(systems),
        JobSpec::Extended { systems, .. } => one_each(systems, SystemDoc::Individual),
        JobSpec::Synastry { systems, .. } => one_each(systems, SystemDoc::Overlay),
    }
}

/// Person 1, person 2, then overlay for each system.
fn couple_docs(systems: &[ReadingSystem]) -> Vec<Planned> {
    systems
        .iter()
        .flat_map(|&system| SystemDoc::COUPLE.map(|doc| Planned::PerSystem(system, doc)))
        .collect()
}

fn one_each(systems: &[ReadingSystem], doc: SystemDoc) -> Vec<Planned> {
    systems
        .iter()
        .map(|&system| Planned::PerSystem(system, doc))
        .collect()
}

fn title(spec: &JobSpec, doc: Planned) -> String {
    let (first, second) = match spec {
        JobSpec::Extended { person, .. } => (person.name.as_str(), None),
        JobSpec::Bundle { couple }
        | JobSpec::Synastry { couple, .. }
        | JobSpec::LegacyBundle { couple, .. } => names(couple),
    };
    // Single-person jobs never plan couple documents.
    let second = second.unwrap_or_default();

    match doc {
        Planned::PerSystem(system, SystemDoc::Person1 | SystemDoc::Individual) => {
            format!("{} for {first}", system.display_name())
        }
        Planned::PerSystem(system, SystemDoc::Person2) => {
            format!("{} for {second}", system.display_name())
        }
        Planned::PerSystem(system, SystemDoc::Overlay) => {
            format!("{} Overlay: {first} & {second}", system.display_name())
        }
        Planned::Verdict => format!("Final Verdict: {first} & {second}"),
    }
}

fn names(couple: &Couple) -> (&str, Option<&str>) {
    (couple.person1.name.as_str(), Some(couple.person2.name.as_str()))
}
