//! Domain logic for reading jobs: reading systems, job-type parsing and
//! params normalization, the task fan-out rule, and the store catalog.
//!
//! Everything in this crate is synchronous and free of I/O.

pub mod error;
pub mod fan_out;
pub mod job_spec;
pub mod products;
pub mod systems;
pub mod types;
