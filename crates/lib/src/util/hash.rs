//! Hashing utilities for build fingerprints.
//!
//! This module provides:
//! - `HashAlgorithm`: the selectable digest functions (`sha1`, `sha256`, `md5`)
//! - `Accumulator`: a single streaming hash state
//! - `ContentHash`: raw digest bytes, displayed as lowercase hex
//! - `hash_path()`: structural hashing of a file or directory tree
//! - `hash_file()`: single file hashing

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

/// Digest function used for every accumulator of one computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
  #[default]
  Sha1,
  Sha256,
  Md5,
}

impl HashAlgorithm {
  pub const ALL: [HashAlgorithm; 3] = [Self::Sha1, Self::Sha256, Self::Md5];

  /// Returns the lowercase identifier for this algorithm
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Sha1 => "sha1",
      Self::Sha256 => "sha256",
      Self::Md5 => "md5",
    }
  }

  /// Digest length in bytes.
  pub fn output_len(&self) -> usize {
    match self {
      Self::Sha1 => 20,
      Self::Sha256 => 32,
      Self::Md5 => 16,
    }
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm {0}, expected one of: sha1, sha256, md5")]
pub struct UnknownHashAlgorithm(pub String);

impl FromStr for HashAlgorithm {
  type Err = UnknownHashAlgorithm;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|algo| algo.as_str() == s)
      .ok_or_else(|| UnknownHashAlgorithm(s.to_string()))
  }
}

/// Raw digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub Vec<u8>);

impl ContentHash {
  pub fn to_hex(&self) -> String {
    hex::encode(&self.0)
  }
}

impl fmt::Display for ContentHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}

enum State {
  Sha1(Sha1),
  Sha256(Sha256),
  Md5(Md5),
}

/// A streaming hash state.
///
/// With tracing enabled, every write is logged at debug level with the md5 of
/// the written bytes so that two computations can be compared write by write.
pub struct Accumulator {
  state: State,
  trace: bool,
}

impl Accumulator {
  pub fn new(algorithm: HashAlgorithm) -> Self {
    let state = match algorithm {
      HashAlgorithm::Sha1 => State::Sha1(Sha1::new()),
      HashAlgorithm::Sha256 => State::Sha256(Sha256::new()),
      HashAlgorithm::Md5 => State::Md5(Md5::new()),
    };
    Self { state, trace: false }
  }

  /// Log every write at debug level.
  pub fn traced(mut self) -> Self {
    self.trace = true;
    self
  }

  pub fn update(&mut self, data: &[u8]) {
    if self.trace {
      debug!(md5 = %hex::encode(Md5::digest(data)), len = data.len(), "add to hash");
    }
    match &mut self.state {
      State::Sha1(h) => h.update(data),
      State::Sha256(h) => h.update(data),
      State::Md5(h) => h.update(data),
    }
  }

  pub fn finalize(self) -> ContentHash {
    let bytes = match self.state {
      State::Sha1(h) => h.finalize().to_vec(),
      State::Sha256(h) => h.finalize().to_vec(),
      State::Md5(h) => h.finalize().to_vec(),
    };
    ContentHash(bytes)
  }
}

/// Leading byte of every file digest, so a file never hashes like a directory.
const FILE_TAG: &[u8] = b"f";

/// Leading byte of every directory digest.
const DIR_TAG: &[u8] = b"d";

/// Error during tree hashing.
#[derive(Debug, thiserror::Error)]
pub enum TreeHashError {
  #[error("failed to stat {path}: {source}")]
  Stat {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to list directory {path}: {message}")]
  ReadDir { path: String, message: String },

  #[error("symbolic links are not supported: {path}")]
  Symlink { path: String },

  #[error("unsupported file type: {path}")]
  SpecialFile { path: String },
}

/// Compute the structural hash of a file or directory.
///
/// A file hashes to the digest of a file tag and its bytes. A directory hashes
/// to the digest of a directory tag and its children's `(name, digest)` pairs
/// in name order, each child digest computed the same way, so the result is
/// independent of the order entries are listed in and changes with any name,
/// type or content below it.
///
/// # Errors
///
/// Symlinks, special files and unreadable entries are errors naming the
/// offending path.
pub fn hash_path(path: &Path, algorithm: HashAlgorithm) -> Result<ContentHash, TreeHashError> {
  let meta = fs::symlink_metadata(path).map_err(|source| TreeHashError::Stat {
    path: path.display().to_string(),
    source,
  })?;

  let file_type = meta.file_type();
  if file_type.is_symlink() {
    Err(TreeHashError::Symlink {
      path: path.display().to_string(),
    })
  } else if file_type.is_file() {
    hash_file(path, algorithm)
  } else if file_type.is_dir() {
    hash_directory(path, algorithm)
  } else {
    Err(TreeHashError::SpecialFile {
      path: path.display().to_string(),
    })
  }
}

/// Hash a directory from its sorted children.
pub fn hash_directory(path: &Path, algorithm: HashAlgorithm) -> Result<ContentHash, TreeHashError> {
  let walker = WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name();

  let mut hasher = Accumulator::new(algorithm);
  hasher.update(DIR_TAG);
  for entry in walker {
    let entry = entry.map_err(|e| TreeHashError::ReadDir {
      path: e
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| path.display().to_string()),
      message: e.to_string(),
    })?;

    let child = hash_path(entry.path(), algorithm)?;
    hasher.update(entry.file_name().as_encoded_bytes());
    hasher.update(&child.0);
  }

  let digest = hasher.finalize();
  debug!(path = %path.display(), digest = %digest, "hashed directory");
  Ok(digest)
}

/// Hash a file's contents, prefixed with the file tag.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<ContentHash, TreeHashError> {
  let read_err = |source| TreeHashError::ReadFile {
    path: path.display().to_string(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Accumulator::new(algorithm);
  hasher.update(FILE_TAG);
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hasher.finalize())
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> ContentHash {
  let mut hasher = Accumulator::new(algorithm);
  hasher.update(data);
  hasher.finalize()
}
