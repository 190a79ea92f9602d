pub mod config;
pub mod dedup;
pub mod error;
pub mod filtering;
pub mod io;
pub mod pipeline;
pub mod processing;
pub mod sources;
pub mod text;
