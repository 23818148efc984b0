pub mod apps;
pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod job;
pub mod rpc;
pub mod scheduler;
pub mod shuffle;
pub mod table;
pub mod task;
pub mod wordcount;

pub use apps::MapReduceApp;
pub use config::SchedulerConfig;
pub use error::{MrError, Result};
pub use job::{JobInfo, JobStatus};
pub use rpc::{
    JobDoneResponse, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    TaskCompleteResponse, WorkerId,
};
pub use scheduler::Scheduler;
pub use shuffle::KeyValue;
pub use task::{Assignment, Phase, TaskId};
