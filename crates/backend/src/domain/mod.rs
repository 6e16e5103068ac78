//! Чтение операционных таблиц. Снимки, без фильтров: источник небольшой.

pub mod a101_member;
pub mod a102_check_in;
pub mod a103_payment;
pub mod a104_membership;
