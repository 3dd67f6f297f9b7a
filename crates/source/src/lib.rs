//! Task sources for boardpulse.
//!
//! This crate provides a trait-based interface for fetching tracked tasks
//! with a Conduit API client and a JSON dump reader.

#![warn(missing_docs)]

pub mod trait_;
pub mod conduit;
pub mod json_file;

pub use trait_::{assemble_tasks, Result, SourceError, TaskListing, TaskSource};
pub use conduit::ConduitSource;
pub use json_file::{Dump, DumpedTask, JsonFileSource};
