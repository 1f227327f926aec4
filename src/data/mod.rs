//! Remote data source.

pub mod source;

pub use source::SourceClient;
