//! Lorekeeper CLI library.
//!
//! The `lorekeeper` binary drives the extraction pipeline end to end against
//! a local SQLite database: `extract` a text file into a reviewable preview,
//! `commit` the reviewed preview into the campaign graph, `graph` to query
//! the result, `new-entity` for manual additions.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Command};
pub use config::Config;
