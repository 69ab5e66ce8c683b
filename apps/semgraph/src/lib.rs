//! # semgraph
//!
//! CLI and HTTP front end for `semgraph-core`. The binary in `main.rs` only
//! initialises logging and dispatches to [`cli::execute`].

pub mod api;
pub mod cli;
pub mod config;
