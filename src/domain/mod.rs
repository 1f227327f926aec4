//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the scalar `Cell` model shared by ingest, transform and the store
//! - raw and normalized borrower tables
//! - run configuration (`PipelineConfig`) and its fixed defaults

pub mod types;

pub use types::*;
