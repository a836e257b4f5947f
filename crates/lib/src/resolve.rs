//! Resolution of source patterns to concrete paths under the build context.
//!
//! Patterns are cleaned lexically, then glob-matched below the working
//! directory root. A pattern that matches nothing is skipped; a pattern that
//! escapes the root is rejected, and so is a match reached through a symbolic
//! link.

use std::fs;
use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Name used for the context root itself.
pub const ROOT_NAME: &str = ".";

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("path '{pattern}' is outside of the build context")]
  OutsideRoot { pattern: String },

  #[error("build context root is not valid UTF-8: {root}")]
  NonUtf8Root { root: String },

  #[error("build context {root} is not accessible: {source}")]
  RootNotFound {
    root: String,
    #[source]
    source: std::io::Error,
  },

  #[error("build context {root} is not a directory")]
  RootNotDirectory { root: String },

  #[error("path '{path}' matched by '{pattern}' goes through a symbolic link")]
  Symlink { pattern: String, path: String },

  #[error("path matched by '{pattern}' is not valid UTF-8: {path}")]
  NonUtf8Path { pattern: String, path: String },

  #[error("failed to stat {path}: {source}")]
  Stat {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid pattern '{pattern}': {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to match '{pattern}' at {path}: {source}")]
  Glob {
    pattern: String,
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// A concrete path matched by a source pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPath {
  /// The pattern as extracted from the recipe.
  pub pattern: String,

  /// Path relative to the context root, `/`-separated.
  pub path: String,
}

/// Check that the build context root exists and is a directory.
///
/// # Errors
///
/// Returns [`ResolveError::RootNotFound`] or [`ResolveError::RootNotDirectory`].
pub fn check_root(root: &Path) -> Result<(), ResolveError> {
  let meta = fs::metadata(root).map_err(|source| ResolveError::RootNotFound {
    root: root.display().to_string(),
    source,
  })?;
  if !meta.is_dir() {
    return Err(ResolveError::RootNotDirectory {
      root: root.display().to_string(),
    });
  }
  Ok(())
}

/// Clean a pattern relative to the context root.
///
/// `.` components and leading `/` are dropped and `..` is resolved
/// lexically. An empty result names the root itself.
///
/// # Errors
///
/// Returns [`ResolveError::OutsideRoot`] when `..` climbs above the root.
pub fn normalize_pattern(pattern: &str) -> Result<String, ResolveError> {
  let mut parts: Vec<&str> = Vec::new();

  for part in pattern.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        if parts.pop().is_none() {
          return Err(ResolveError::OutsideRoot {
            pattern: pattern.to_string(),
          });
        }
      }
      other => parts.push(other),
    }
  }

  if parts.is_empty() {
    return Ok(ROOT_NAME.to_string());
  }
  Ok(parts.join("/"))
}

/// Match one pattern below `root`, in glob iteration order.
///
/// # Errors
///
/// Returns an error for patterns outside the root, malformed glob syntax,
/// directories that cannot be read while matching, and matches with a
/// symbolic link anywhere below the root.
pub fn resolve_pattern(root: &Path, pattern: &str) -> Result<Vec<String>, ResolveError> {
  let normalized = normalize_pattern(pattern)?;
  if normalized == ROOT_NAME {
    return Ok(if root.exists() { vec![ROOT_NAME.to_string()] } else { Vec::new() });
  }

  let root_str = root.to_str().ok_or_else(|| ResolveError::NonUtf8Root {
    root: root.display().to_string(),
  })?;
  let full = format!("{}/{}", Pattern::escape(root_str.trim_end_matches('/')), normalized);

  let options = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
  };
  let entries = glob::glob_with(&full, options).map_err(|source| ResolveError::InvalidPattern {
    pattern: pattern.to_string(),
    source,
  })?;

  let mut matches = Vec::new();
  for entry in entries {
    let path = entry.map_err(|err| ResolveError::Glob {
      pattern: pattern.to_string(),
      path: err.path().display().to_string(),
      source: err.into_error(),
    })?;
    // `.*` also matches the `.` and `..` entries of a directory.
    if is_special_entry(&path) {
      continue;
    }
    let name = relative_name(root, &path, pattern)?;
    check_no_symlinks(root, &name, pattern)?;
    matches.push(name);
  }

  Ok(matches)
}

/// Resolve sorted patterns into the ordered list of paths to hash.
///
/// Matches of one pattern keep glob order; duplicates across patterns are
/// kept.
///
/// # Errors
///
/// Propagates the first [`ResolveError`].
pub fn resolve_patterns(root: &Path, patterns: &[String]) -> Result<Vec<ResolvedPath>, ResolveError> {
  let mut resolved = Vec::new();

  for pattern in patterns {
    let matches = resolve_pattern(root, pattern)?;
    if matches.is_empty() {
      debug!(pattern = %pattern, "pattern matched no files");
      continue;
    }
    debug!(pattern = %pattern, count = matches.len(), "resolved pattern");
    resolved.extend(matches.into_iter().map(|path| ResolvedPath {
      pattern: pattern.clone(),
      path,
    }));
  }

  Ok(resolved)
}

// Glob drops a leading `./` from its results, so both sides are compared
// without `.` components.
fn relative_name(root: &Path, path: &Path, pattern: &str) -> Result<String, ResolveError> {
  let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
  for expected in root.components().filter(|c| !matches!(c, Component::CurDir)) {
    if components.next() != Some(expected) {
      return Err(ResolveError::OutsideRoot {
        pattern: pattern.to_string(),
      });
    }
  }

  let parts: Vec<String> = components
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_str().map(str::to_string).ok_or_else(|| ResolveError::NonUtf8Path {
        pattern: pattern.to_string(),
        path: path.display().to_string(),
      })),
      _ => None,
    })
    .collect::<Result<_, _>>()?;

  if parts.is_empty() {
    return Ok(ROOT_NAME.to_string());
  }
  Ok(parts.join("/"))
}

fn is_special_entry(path: &Path) -> bool {
  path
    .to_str()
    .is_some_and(|p| p == "." || p == ".." || p.ends_with("/.") || p.ends_with("/.."))
}

/// Reject a match if any component from the root down to it is a symlink.
/// Glob follows links while matching.
fn check_no_symlinks(root: &Path, name: &str, pattern: &str) -> Result<(), ResolveError> {
  if name == ROOT_NAME {
    return Ok(());
  }

  let mut current = root.to_path_buf();
  for part in name.split('/') {
    current.push(part);
    let meta = fs::symlink_metadata(&current).map_err(|source| ResolveError::Stat {
      path: current.display().to_string(),
      source,
    })?;
    if meta.file_type().is_symlink() {
      return Err(ResolveError::Symlink {
        pattern: pattern.to_string(),
        path: current.display().to_string(),
      });
    }
  }

  Ok(())
}
