//! `borrower-etl` library crate.
//!
//! The binary (`borrower-etl`) is a thin wrapper around this library so that:
//!
//! - the transformation and persistence steps are testable without the network
//! - each step (ingest, transform, store, analysis, report) stays in its own module

pub mod analysis;
pub mod app;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod store;
pub mod transform;
