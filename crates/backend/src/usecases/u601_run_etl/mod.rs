pub mod executor;
pub mod run_log;

pub use executor::{EtlExecutor, RunRejected};
