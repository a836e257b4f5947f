//! dockersum-lib: source fingerprints for container image builds
//!
//! Computes one deterministic digest over everything that influences a
//! Dockerfile build's output:
//! - `recipe`: the Dockerfile, parsed into stages of typed instructions
//! - `extract`: the local source paths the recipe references
//! - `resolve`: those paths matched against the build context
//! - `util::hash`: structural hashing of files and directories
//! - `checksum`: the fixed-order composition of all of the above with the
//!   build arguments, platforms and labels

pub mod checksum;
pub mod consts;
pub mod expand;
pub mod extract;
pub mod platform;
pub mod recipe;
pub mod resolve;
pub mod util;
pub mod vars;

pub use checksum::{BuildParams, Checksum, ChecksumConfig, ChecksumError, calculate_checksum, checksum_recipe};
pub use util::hash::HashAlgorithm;
