//! Build-job execution for Gradebox: container engine interface, per-job
//! container lifecycle control, and the end-to-end orchestrator.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod container;
pub mod error;
pub mod job;
