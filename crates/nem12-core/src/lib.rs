//! Shared domain types for the NEM12 hourly pipeline.
//!
//! Holds the record and aggregate models, the error type, calendar helpers,
//! number formatting and command-line settings used by the other crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Nem12Error, Result};
