//! Source path extraction.
//!
//! Walks a parsed recipe once, in document order, keeping the build variable
//! table current and collecting every word that names a file from the local
//! build context: `COPY` sources (unless copying from another stage), `ADD`
//! sources, and the sources of local bind mounts on `RUN`.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::expand::{ExpandError, expand_word};
use crate::recipe::{Instruction, InstructionKind, Mount, Recipe};
use crate::vars::VariableTable;

/// Pattern used for a bind mount that names no source: the whole context.
const CONTEXT_ROOT: &str = ".";

#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("line {line}: cannot expand {keyword} word '{word}': {source}")]
  Expand {
    line: usize,
    keyword: String,
    word: String,
    #[source]
    source: ExpandError,
  },
}

/// Result of walking a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
  /// Local source patterns, sorted lexicographically. Duplicates are kept.
  pub patterns: Vec<String>,

  /// Effective build arguments after the walk: explicit arguments, recipe
  /// defaults and `ENV` values.
  pub build_args: BTreeMap<String, String>,
}

/// Collect the local source patterns a recipe references.
///
/// # Errors
///
/// Returns an error when a word cannot be expanded. There is no partial
/// result.
pub fn paths_from_recipe(recipe: &Recipe, build_args: &BTreeMap<String, String>) -> Result<Extraction, ExtractError> {
  let mut vars = VariableTable::with_build_args(build_args);
  let mut patterns = Vec::new();

  let instructions = recipe
    .meta_args
    .iter()
    .chain(recipe.stages.iter().flat_map(|stage| stage.instructions.iter()));

  for instruction in instructions {
    walk(instruction, &mut vars, recipe.escape, &mut patterns)?;
  }

  patterns.sort();
  debug!(count = patterns.len(), "extracted source patterns");

  Ok(Extraction {
    patterns,
    build_args: vars.into_map(),
  })
}

fn walk(
  instruction: &Instruction,
  vars: &mut VariableTable,
  escape: char,
  patterns: &mut Vec<String>,
) -> Result<(), ExtractError> {
  let line = instruction.line;
  let keyword = instruction.kind.keyword();
  let expand = |vars: &VariableTable, word: &str| {
    expand_word(word, vars, escape).map_err(|source| ExtractError::Expand {
      line,
      keyword: keyword.to_string(),
      word: word.to_string(),
      source,
    })
  };

  match &instruction.kind {
    InstructionKind::Arg(decls) => {
      for decl in decls {
        let Some(default) = &decl.default else {
          continue;
        };
        let value = expand(vars, default)?;
        if vars.declare_default(&decl.name, value) {
          debug!(line, name = %decl.name, "applied ARG default");
        }
      }
    }
    InstructionKind::Env(pairs) => {
      // All values see the table as it was before this instruction.
      let expanded = pairs
        .iter()
        .map(|(name, value)| Ok((name, expand(vars, value)?)))
        .collect::<Result<Vec<_>, ExtractError>>()?;
      for (name, value) in expanded {
        vars.set_env(name, value);
      }
    }
    InstructionKind::Copy(transfer) => {
      let from = match &transfer.from {
        Some(from) => expand(vars, from)?,
        None => String::new(),
      };
      if !from.is_empty() {
        debug!(line, from = %from, "skipping COPY from another stage");
        return Ok(());
      }
      for source in &transfer.sources {
        push(patterns, line, expand(vars, source)?);
      }
    }
    InstructionKind::Add(transfer) => {
      for source in &transfer.sources {
        push(patterns, line, expand(vars, source)?);
      }
    }
    InstructionKind::Run(run) => {
      for mount in &run.mounts {
        let mount = Mount {
          kind: expand(vars, &mount.kind)?,
          source: mount.source.as_deref().map(|s| expand(vars, s)).transpose()?,
          target: mount.target.clone(),
          from: mount.from.as_deref().map(|s| expand(vars, s)).transpose()?,
        };
        if mount.is_local_bind() {
          let source = mount.source.filter(|s| !s.is_empty());
          push(patterns, line, source.unwrap_or_else(|| CONTEXT_ROOT.to_string()));
        }
      }
    }
    InstructionKind::Other { .. } => {}
  }

  Ok(())
}

fn push(patterns: &mut Vec<String>, line: usize, pattern: String) {
  debug!(line, pattern = %pattern, "found source pattern");
  patterns.push(pattern);
}
