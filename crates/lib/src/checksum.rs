//! Build fingerprint composition.
//!
//! One accumulator receives, in this fixed order:
//!
//! 1. the raw recipe bytes
//! 2. for every resolved source path: its name, then its tree digest
//! 3. the effective build arguments, keys sorted, key then value
//! 4. the target platforms, sorted
//! 5. the labels, keys sorted, key then value
//!
//! The hex encoding of the final digest is the fingerprint. Source patterns
//! are sorted before resolution, so the same set of sources reached through
//! different instructions hashes the same way.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, debug, info};

use crate::consts::{DEFAULT_RECIPE, DEFAULT_WORKDIR};
use crate::extract::{ExtractError, paths_from_recipe};
use crate::platform;
use crate::recipe::{ParseError, decode, parse};
use crate::resolve::{ResolveError, check_root, resolve_patterns};
use crate::util::hash::{Accumulator, HashAlgorithm, TreeHashError, hash_path};

#[derive(Debug, Error)]
pub enum ChecksumError {
  #[error("failed to read recipe {path}: {source}")]
  ReadRecipe {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse recipe: {0}")]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Extract(#[from] ExtractError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("failed to hash source: {0}")]
  Hash(#[from] TreeHashError),
}

/// Parameters of the build invocation that take part in the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildParams {
  /// Explicit `--build-arg` values.
  pub build_args: BTreeMap<String, String>,

  /// Target platforms, in any order.
  pub platforms: Vec<String>,

  /// Image labels.
  pub labels: BTreeMap<String, String>,
}

/// Everything needed to fingerprint one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChecksumConfig {
  /// Recipe file, relative to the current directory.
  pub file: PathBuf,

  /// Build context root.
  pub workdir: PathBuf,

  #[serde(flatten)]
  pub params: BuildParams,

  pub hash: HashAlgorithm,
}

impl Default for ChecksumConfig {
  fn default() -> Self {
    Self {
      file: PathBuf::from(DEFAULT_RECIPE),
      workdir: PathBuf::from(DEFAULT_WORKDIR),
      params: BuildParams {
        platforms: platform::default_platform().into_iter().collect(),
        ..BuildParams::default()
      },
      hash: HashAlgorithm::default(),
    }
  }
}

/// Digest of one resolved source path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDigest {
  pub pattern: String,
  pub path: String,
  pub digest: String,
}

/// The computed fingerprint and how it was assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
  /// Lowercase hex digest.
  pub digest: String,

  pub algorithm: HashAlgorithm,

  /// Sources in the order they were fed to the accumulator.
  pub paths: Vec<PathDigest>,

  /// Build arguments after the recipe walk, as hashed.
  pub build_args: BTreeMap<String, String>,
}

/// Read the configured recipe file and fingerprint the build.
///
/// # Errors
///
/// Fails if the recipe cannot be read, is not UTF-8, or for any error of
/// [`checksum_recipe`].
pub fn calculate_checksum(config: &ChecksumConfig) -> Result<Checksum, ChecksumError> {
  let bytes = fs::read(&config.file).map_err(|source| ChecksumError::ReadRecipe {
    path: config.file.display().to_string(),
    source,
  })?;
  let content = decode(&bytes)?;

  debug!(
    workdir = %config.workdir.display(),
    recipe = %config.file.display(),
    "add recipe to checksum"
  );

  checksum_recipe(content, &config.workdir, &config.params, config.hash)
}

/// Fingerprint a build from in-memory recipe text.
///
/// When debug logging is enabled, every accumulator write and every per-path
/// digest is logged.
///
/// # Errors
///
/// A missing or non-directory `workdir`, and any parse, expansion,
/// resolution or hashing failure, aborts the whole computation; no partial
/// digest is produced.
pub fn checksum_recipe(
  recipe_text: &str,
  workdir: &Path,
  params: &BuildParams,
  algorithm: HashAlgorithm,
) -> Result<Checksum, ChecksumError> {
  check_root(workdir)?;
  for (key, value) in &params.build_args {
    debug!(key = %key, value = %value, "explicit build arg");
  }

  let recipe = parse(recipe_text)?;
  let extraction = paths_from_recipe(&recipe, &params.build_args)?;
  let resolved = resolve_patterns(workdir, &extraction.patterns)?;

  let mut hasher = Accumulator::new(algorithm);
  if tracing::enabled!(Level::DEBUG) {
    hasher = hasher.traced();
  }

  hasher.update(recipe_text.as_bytes());

  let mut paths = Vec::with_capacity(resolved.len());
  for entry in resolved {
    let digest = hash_path(&workdir.join(&entry.path), algorithm)?;
    debug!(pattern = %entry.pattern, path = %entry.path, digest = %digest, "add path to checksum");

    hasher.update(entry.path.as_bytes());
    hasher.update(&digest.0);
    paths.push(PathDigest {
      pattern: entry.pattern,
      path: entry.path,
      digest: digest.to_hex(),
    });
  }

  add_map(&mut hasher, &extraction.build_args);

  let mut platforms = params.platforms.clone();
  platforms.sort();
  for platform in &platforms {
    hasher.update(platform.as_bytes());
  }

  add_map(&mut hasher, &params.labels);

  let digest = hasher.finalize().to_hex();
  info!(digest = %digest, algorithm = %algorithm, sources = paths.len(), "computed checksum");

  Ok(Checksum {
    digest,
    algorithm,
    paths,
    build_args: extraction.build_args,
  })
}

fn add_map(hasher: &mut Accumulator, map: &BTreeMap<String, String>) {
  for (key, value) in map {
    hasher.update(key.as_bytes());
    hasher.update(value.as_bytes());
  }
}
