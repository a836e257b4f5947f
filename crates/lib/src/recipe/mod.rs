//! Dockerfile parsing.
//!
//! Produces the ordered stages and typed instructions the checksum engine
//! walks. Only the instruction kinds that can reference local sources or
//! change build variables are modeled in detail; the rest are kept verbatim.

mod parse;
mod types;

pub use parse::{DEFAULT_ESCAPE, ParseError, decode, parse};
pub use types::*;
