#![doc = include_str!("../README.md")]

pub mod adapter;
pub mod report;
pub mod scheduler;
pub mod store;

pub mod prelude {
    pub use crate::adapter::{Adapter, Payload, RequestError};
    pub use crate::report::ComparisonReport;
    pub use crate::scheduler::ShutdownFlag;
    pub use crate::store::ResultStore;
    pub use inferbench_core::{
        BenchConfig, HarnessError, LatencyStatistics, Mode, Protocol, RunResult, Sample,
    };
}
