//! `songpipe-cli` crate (library surface).
//!
//! The primary entrypoint for end users is the `songpipe` binary.
//! This library module exists so embedders can reach the core types and the local
//! pipeline without depending on internal crate layout.

pub use songpipe_core as core;
pub use songpipe_local as local;
