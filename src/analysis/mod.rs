//! Analysis stages of the comparison pipeline.
//!
//! Each stage is a pure function of its inputs: filtering, per-date
//! aggregation and the wide-to-long reshape consumed by renderers.

pub mod aggregator;
pub mod filter;
pub mod reshape;

pub use aggregator::*;
pub use filter::*;
pub use reshape::*;
