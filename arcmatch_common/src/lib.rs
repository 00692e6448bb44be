//! Common configuration and shared index types for the arcmatch workspace.
//!
//! This crate holds the pieces every phase of a matching run agrees on: the
//! run configuration and the typed integer handles used to index graphs,
//! pattern edges and matching-machine states.

mod config;
mod ids;

pub use crate::config::*;
pub use crate::ids::*;
