//! The tabular reshape-and-aggregate pipeline.
//!
//! - Reshape: wide-to-long melt and record filters
//! - Grouper: stable group-and-sum aggregation
//! - Derive: percent change, percent share, summaries
//! - Pipeline: one parameterized entry point per chart

pub mod derive;
pub mod grouper;
pub mod pipeline;
pub mod reshape;

pub use derive::*;
pub use grouper::*;
pub use pipeline::*;
pub use reshape::*;
