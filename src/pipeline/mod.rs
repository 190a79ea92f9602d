//! Pipelines.
//!
//! The module provides a light [pipeline::Pipeline] trait, implemented by the
//! trivia [builder::PoolBuilder].
pub mod builder;
pub mod pipeline;

pub use builder::{BuildResult, PoolBuilder, SourceReport};
pub use pipeline::Pipeline;
