pub mod u601_run_etl;
pub mod u602_reset_warehouse;
