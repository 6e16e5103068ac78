pub mod response;

pub use response::{ResetTableResult, ResetWarehouseResponse};
