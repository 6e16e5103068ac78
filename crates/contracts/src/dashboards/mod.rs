pub mod d600_daily_stats;
