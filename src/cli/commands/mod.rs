pub mod config;
pub mod db;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod log;
pub mod report;
pub mod sync;
