pub mod config;
pub mod metrics;
pub mod report;
pub mod scenario;
pub mod worker;
