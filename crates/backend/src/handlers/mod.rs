pub mod d600_daily_stats;
pub mod usecases;
