pub mod clock;
pub mod config;
pub mod data;
pub mod dates;
pub mod etl_context;
pub mod etl_error;

#[cfg(test)]
pub mod test_support;
