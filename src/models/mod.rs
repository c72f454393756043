pub mod attendance;
pub mod person;
pub mod punch;
pub mod report;
pub mod schedule;
pub mod shift;
pub mod status_flag;
