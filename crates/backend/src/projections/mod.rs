pub mod p600_dim_member;
pub mod p601_dim_date;
pub mod p602_fact_visits;
pub mod p603_fact_revenue;
