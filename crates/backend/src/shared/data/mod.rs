pub mod memory_store;
pub mod rest_store;
pub mod schema;
pub mod sqlite_store;
pub mod store;

pub use store::{decode_rows, encode_row, Decoded, Filter, Row, StoreError, TableStore};
