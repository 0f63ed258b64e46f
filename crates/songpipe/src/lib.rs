//! Public facade crate for `songpipe`.
//!
//! This crate intentionally contains no IO or network logic.
//! It re-exports the backend-agnostic types/traits from `songpipe-core`.

pub use songpipe_core::*;
