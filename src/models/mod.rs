pub mod accrual;
pub mod attendance;
pub mod event;
pub mod member;
