//! NEM12 ingestion and hourly aggregation.
//!
//! Parses NEM12 interval files, expands daily records into 5-minute samples,
//! keeps a trailing window of days and rolls the samples up into hourly
//! energy and power rows, with summaries and CSV export over the result.

pub mod aggregator;
pub mod analysis;
pub mod expander;
pub mod export;
pub mod filter;
pub mod reader;
pub mod summary;

pub use nem12_core as core;
