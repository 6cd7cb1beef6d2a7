//! Status helper enums mapping to the SMALLSERIAL lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Job lifecycle status. Driven by task completion and cancellation.
    JobStatus {
        Pending = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
        Cancelled = 5,
    }
}

define_status_enum! {
    /// Task lifecycle status.
    TaskStatus {
        Pending = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
        Cancelled = 5,
    }
}

impl JobStatus {
    /// Statuses a job never leaves.
    pub const TERMINAL: [JobStatus; 3] = [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled];

    /// Statuses whose pending tasks may still be claimed.
    pub const LIVE: [JobStatus; 2] = [JobStatus::Pending, JobStatus::Running];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }
}

/// Database IDs for a set of statuses, for `= ANY($n)` binds.
pub fn status_ids<S: Into<StatusId> + Copy>(statuses: &[S]) -> Vec<StatusId> {
    statuses.iter().map(|&status| status.into()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_seed_order() {
        assert_eq!(JobStatus::Pending.id(), 1);
        assert_eq!(JobStatus::Cancelled.id(), 5);
        assert_eq!(TaskStatus::Running.id(), 2);
    }

    #[test]
    fn from_id_round_trips() {
        assert_eq!(JobStatus::from_id(4), Some(JobStatus::Failed));
        assert_eq!(TaskStatus::from_id(3), Some(TaskStatus::Completed));
        assert_eq!(JobStatus::from_id(9), None);
    }

    #[test]
    fn terminal_job_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::LIVE.iter().all(|status| !status.is_terminal()));
    }

    #[test]
    fn status_ids_follow_seed_order() {
        assert_eq!(status_ids(&JobStatus::TERMINAL), vec![3, 4, 5]);
        assert_eq!(status_ids(&JobStatus::LIVE), vec![1, 2]);
    }
}
