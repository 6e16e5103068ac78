pub mod progress;
pub mod request;
pub mod response;

pub use progress::{LoadStats, RunStatus};
pub use request::EtlRunRequest;
pub use response::{EtlRunLogEntry, EtlRunReport, LoaderOutcome};
