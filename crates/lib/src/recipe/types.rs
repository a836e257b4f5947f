//! Typed Dockerfile instructions.

use serde::{Deserialize, Serialize};

/// A parsed recipe: parser directives, meta-args and the ordered build stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  /// Escape token from the `# escape=` directive (`\` unless overridden).
  pub escape: char,

  /// `ARG` instructions declared before the first `FROM`.
  pub meta_args: Vec<Instruction>,

  /// Build stages in document order.
  pub stages: Vec<Stage>,
}

/// One `FROM` block and the instructions that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
  /// Base image word as written (not expanded).
  pub base: String,

  /// Stage name from `FROM <image> AS <name>`.
  pub name: Option<String>,

  /// Line of the `FROM` instruction.
  pub line: usize,

  pub instructions: Vec<Instruction>,
}

/// A single recipe command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
  /// 1-based line where the instruction starts.
  pub line: usize,

  pub kind: InstructionKind,
}

/// The instruction variants the checksum engine distinguishes.
///
/// Everything that cannot reference local sources or change the variable
/// table is kept as [`InstructionKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionKind {
  /// `ARG name[=default] ...`
  Arg(Vec<ArgDecl>),

  /// `ENV key=value ...`
  Env(Vec<(String, String)>),

  /// `COPY [--from=...] <src>... <dest>`
  Copy(Transfer),

  /// `ADD <src>... <dest>`
  Add(Transfer),

  /// `RUN [--mount=...] <command>`
  Run(RunCommand),

  /// Any other known instruction, kept verbatim.
  Other { keyword: String, args: String },
}

impl InstructionKind {
  /// Upper-case keyword for diagnostics.
  pub fn keyword(&self) -> &str {
    match self {
      Self::Arg(_) => "ARG",
      Self::Env(_) => "ENV",
      Self::Copy(_) => "COPY",
      Self::Add(_) => "ADD",
      Self::Run(_) => "RUN",
      Self::Other { keyword, .. } => keyword,
    }
  }
}

/// A declared build argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDecl {
  pub name: String,
  pub default: Option<String>,
}

/// Shared shape of `COPY` and `ADD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
  /// `--from` flag value; only meaningful for `COPY`.
  pub from: Option<String>,

  /// Source words, not yet expanded.
  pub sources: Vec<String>,

  /// Inline heredoc sources. These never name local files.
  pub heredocs: Vec<Heredoc>,

  pub dest: String,
}

/// An inline document introduced with `<<NAME`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heredoc {
  pub name: String,
  pub content: String,
}

/// A `RUN` instruction's mounts and command text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCommand {
  pub mounts: Vec<Mount>,
  pub command: String,
}

/// One `--mount=` declaration on a `RUN` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
  /// Mount type as written; `bind` when omitted.
  pub kind: String,
  pub source: Option<String>,
  pub target: Option<String>,
  pub from: Option<String>,
}

impl Mount {
  pub const BIND: &'static str = "bind";

  /// Whether this mount exposes the local build context.
  pub fn is_local_bind(&self) -> bool {
    self.kind.eq_ignore_ascii_case(Self::BIND) && self.from.as_deref().is_none_or(str::is_empty)
  }
}
