//! Операционные сущности (system of record). ETL только читает их.

pub mod a101_member;
pub mod a102_check_in;
pub mod a103_payment;
pub mod a104_membership;
