#![deny(clippy::correctness)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_lossless
)]
#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod count;
mod encoding;
mod error;
pub mod itemset;
pub mod outlier;
mod record;
pub mod utils;

pub use encoding::{AttributeDecoder, AttributeEncoder, ColumnValue};
pub use error::{Error, Result};
pub use record::{AttributeId, MetricRecord, ScoredRecord};

/// The current version of the crate.
pub const VERSION: &str = "0.1.0";
