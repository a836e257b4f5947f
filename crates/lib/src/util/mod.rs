//! Shared utilities.
//!
//! Hashing primitives and the structural tree hasher.

pub mod hash;
