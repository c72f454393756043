pub mod calculator;
pub mod correct;
pub mod import;
pub mod list;
pub mod log;
pub mod memory;
pub mod policy;
pub mod ports;
pub mod reconcile;
pub mod report;
pub mod sync;
