pub mod jobs;
pub mod products;
pub mod tasks;
