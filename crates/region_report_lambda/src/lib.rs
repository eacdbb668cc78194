//! AWS-oriented adapters and handlers for the regional coverage report.
//!
//! This crate owns runtime integration details (Lambda entry point, S3/SNS/SQS
//! adapters, local filesystem adapters and configuration) and drives the pure
//! pipeline stages from `region_report_core` through the storage and
//! message-bus port traits.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
