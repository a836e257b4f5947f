//! Implementation of the default `dockersum` command.
//!
//! Computes the build checksum and writes it to stdout: the bare hex digest
//! in text mode, or the full record with per-path digests in JSON mode.
//! Nothing is written to stdout on failure.

use std::io::{self, Write};

use anyhow::{Context, Result};

use dockersum_lib::{ChecksumConfig, calculate_checksum};

use crate::output::{OutputFormat, print_json};

pub fn cmd_checksum(config: &ChecksumConfig, format: OutputFormat) -> Result<()> {
  let checksum = calculate_checksum(config)
    .with_context(|| format!("Failed to compute checksum for {}", config.file.display()))?;

  if format.is_json() {
    print_json(&checksum)?;
  } else {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", checksum.digest).context("Failed to write checksum")?;
    stdout.flush().context("Failed to flush stdout")?;
  }

  Ok(())
}
