//! Pure domain logic for the regional service coverage report.
//!
//! This crate owns normalization of the source documents, report rendering,
//! workbook encoding, storage key layout, retention partitioning and the run
//! result contract. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `region_report_lambda`.

pub mod contract;
pub mod model;
pub mod normalize;
pub mod notification;
pub mod probe;
pub mod report;
pub mod retention;
pub mod retry;
pub mod storage_keys;
pub mod workbook;
