pub mod client;
pub mod worker;

pub use client::HttpTaskSource;
pub use worker::{run, Shutdown, TaskSource, WorkerConfig};
