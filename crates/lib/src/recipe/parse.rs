//! Line-oriented Dockerfile parsing.
//!
//! The parser turns recipe text into a [`Recipe`]: parser directives are read
//! from the leading comment block, physical lines are joined on the escape
//! token, heredoc bodies are consumed, and each logical line becomes one typed
//! [`Instruction`]. Words are kept exactly as written; variable expansion is
//! left to the caller because it depends on the order instructions are walked.

use super::types::{ArgDecl, Heredoc, Instruction, InstructionKind, Mount, Recipe, RunCommand, Stage, Transfer};

/// Default escape token when no `# escape=` directive is present.
pub const DEFAULT_ESCAPE: char = '\\';

const OTHER_KEYWORDS: &[&str] = &[
  "WORKDIR",
  "LABEL",
  "CMD",
  "ENTRYPOINT",
  "EXPOSE",
  "USER",
  "VOLUME",
  "HEALTHCHECK",
  "SHELL",
  "STOPSIGNAL",
  "ONBUILD",
  "MAINTAINER",
];

/// Errors produced while parsing recipe text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  #[error("file with no instructions")]
  Empty,

  #[error("line {line}: recipe is not valid UTF-8")]
  InvalidUtf8 { line: usize },

  #[error("line {line}: invalid escape token '{value}', expected '\\' or '`'")]
  InvalidEscape { line: usize, value: String },

  #[error("line {line}: unknown instruction: {keyword}")]
  UnknownInstruction { line: usize, keyword: String },

  #[error("line {line}: {keyword} is not allowed before the first FROM")]
  NoStage { line: usize, keyword: String },

  #[error("line {line}: {keyword} requires at least {expected} argument(s)")]
  MissingArguments {
    line: usize,
    keyword: String,
    expected: usize,
  },

  #[error("line {line}: invalid {keyword} arguments: {message}")]
  InvalidArguments {
    line: usize,
    keyword: String,
    message: String,
  },

  #[error("line {line}: invalid mount '{value}': {message}")]
  InvalidMount {
    line: usize,
    value: String,
    message: String,
  },

  #[error("line {line}: unterminated heredoc '{name}'")]
  UnterminatedHeredoc { line: usize, name: String },
}

/// A heredoc marker found on an instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeredocMarker {
  name: String,
  strip_tabs: bool,
}

/// Logical line assembled from one or more physical lines.
struct LogicalLine {
  line: usize,
  text: String,
  heredocs: Vec<Heredoc>,
}

/// Decode raw recipe bytes as UTF-8.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] naming the line of the first invalid
/// byte.
pub fn decode(bytes: &[u8]) -> Result<&str, ParseError> {
  std::str::from_utf8(bytes).map_err(|err| {
    let valid = &bytes[..err.valid_up_to()];
    ParseError::InvalidUtf8 {
      line: valid.iter().filter(|b| **b == b'\n').count() + 1,
    }
  })
}

/// Parse recipe text into stages of typed instructions.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the offending line for unknown
/// instructions, malformed arguments, instructions other than `ARG` before the
/// first `FROM`, and unterminated heredocs.
pub fn parse(text: &str) -> Result<Recipe, ParseError> {
  let lines: Vec<&str> = text.lines().collect();
  let (escape, start) = parse_directives(&lines)?;
  let logical = join_lines(&lines, start, escape)?;

  if logical.is_empty() {
    return Err(ParseError::Empty);
  }

  let mut recipe = Recipe {
    escape,
    meta_args: Vec::new(),
    stages: Vec::new(),
  };

  for entry in logical {
    let (keyword, rest) = split_keyword(&entry.text);
    let keyword = keyword.to_ascii_uppercase();

    if keyword == "FROM" {
      recipe.stages.push(parse_from(entry.line, rest, escape)?);
      continue;
    }

    let kind = parse_instruction(&keyword, entry.line, rest, escape, entry.heredocs)?;
    let instruction = Instruction { line: entry.line, kind };

    match recipe.stages.last_mut() {
      Some(stage) => stage.instructions.push(instruction),
      None if matches!(instruction.kind, InstructionKind::Arg(_)) => recipe.meta_args.push(instruction),
      None => {
        return Err(ParseError::NoStage {
          line: instruction.line,
          keyword,
        });
      }
    }
  }

  Ok(recipe)
}

/// Read parser directives from the top of the file.
///
/// Returns the escape token and the index of the first line that is not a
/// directive.
fn parse_directives(lines: &[&str]) -> Result<(char, usize), ParseError> {
  let mut escape = DEFAULT_ESCAPE;

  for (idx, raw) in lines.iter().enumerate() {
    let Some(body) = raw.trim().strip_prefix('#') else {
      return Ok((escape, idx));
    };
    let Some((key, value)) = body.split_once('=') else {
      return Ok((escape, idx));
    };
    let key = key.trim().to_ascii_lowercase();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Ok((escape, idx));
    }

    if key == "escape" {
      escape = match value.trim() {
        "\\" => '\\',
        "`" => '`',
        other => {
          return Err(ParseError::InvalidEscape {
            line: idx + 1,
            value: other.to_string(),
          });
        }
      };
    }
  }

  Ok((escape, lines.len()))
}

/// Join continuation lines, drop comments and blank lines, and consume
/// heredoc bodies.
fn join_lines(lines: &[&str], start: usize, escape: char) -> Result<Vec<LogicalLine>, ParseError> {
  let mut out = Vec::new();
  let mut idx = start;

  while idx < lines.len() {
    let first = idx;
    let mut text = String::new();
    let mut continued = false;

    while idx < lines.len() {
      let raw = lines[idx];
      idx += 1;

      let trimmed = raw.trim_start();
      if trimmed.is_empty() || trimmed.starts_with('#') {
        if continued {
          continue;
        }
        break;
      }

      let content = raw.trim_end();
      match content.strip_suffix(escape) {
        Some(head) => {
          text.push_str(head);
          continued = true;
        }
        None => {
          text.push_str(content);
          continued = false;
          break;
        }
      }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
      continue;
    }

    let markers = heredoc_markers(&text, escape);
    let mut heredocs = Vec::with_capacity(markers.len());
    for marker in markers {
      let (doc, next) = read_heredoc(lines, idx, first + 1, &marker)?;
      heredocs.push(doc);
      idx = next;
    }

    out.push(LogicalLine {
      line: first + 1,
      text,
      heredocs,
    });
  }

  Ok(out)
}

/// Find `<<NAME`, `<<-NAME` and quoted variants on a shell-form instruction.
///
/// Only whole words starting with `<<` are markers, so `<<` inside quotes or
/// shell arithmetic is left alone.
fn heredoc_markers(text: &str, escape: char) -> Vec<HeredocMarker> {
  let (keyword, rest) = split_keyword(text);
  if !["RUN", "COPY", "ADD"].iter().any(|k| keyword.eq_ignore_ascii_case(k)) || rest.starts_with('[') {
    return Vec::new();
  }

  split_words(rest, escape)
    .iter()
    .filter_map(|word| heredoc_marker(word))
    .collect()
}

/// Parse one word as a heredoc marker.
fn heredoc_marker(word: &str) -> Option<HeredocMarker> {
  let tail = word.strip_prefix("<<")?;
  let (strip_tabs, tail) = match tail.strip_prefix('-') {
    Some(tail) => (true, tail),
    None => (false, tail),
  };

  let name = match tail.chars().next() {
    Some(q @ ('"' | '\'')) => tail[1..].strip_suffix(q)?,
    _ => tail,
  };

  let mut chars = name.chars();
  let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  valid.then(|| HeredocMarker {
    name: name.to_string(),
    strip_tabs,
  })
}

fn read_heredoc(
  lines: &[&str],
  start: usize,
  instruction_line: usize,
  marker: &HeredocMarker,
) -> Result<(Heredoc, usize), ParseError> {
  let mut content = String::new();

  for (offset, raw) in lines[start.min(lines.len())..].iter().enumerate() {
    let body = if marker.strip_tabs { raw.trim_start_matches('\t') } else { raw };
    if body == marker.name {
      let doc = Heredoc {
        name: marker.name.clone(),
        content,
      };
      return Ok((doc, start + offset + 1));
    }
    content.push_str(body);
    content.push('\n');
  }

  Err(ParseError::UnterminatedHeredoc {
    line: instruction_line,
    name: marker.name.clone(),
  })
}

fn split_keyword(text: &str) -> (&str, &str) {
  match text.find(char::is_whitespace) {
    Some(pos) => (&text[..pos], text[pos..].trim_start()),
    None => (text, ""),
  }
}

/// Split off leading `--name[=value]` flags.
fn split_flags(rest: &str) -> (Vec<(String, Option<String>)>, &str) {
  let mut flags = Vec::new();
  let mut rest = rest.trim_start();

  while rest.starts_with("--") {
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let token = &rest[2..end];
    match token.split_once('=') {
      Some((name, value)) => flags.push((name.to_ascii_lowercase(), Some(value.to_string()))),
      None => flags.push((token.to_ascii_lowercase(), None)),
    }
    rest = rest[end..].trim_start();
  }

  (flags, rest)
}

/// Split on unquoted, unescaped whitespace. Quotes and escapes are kept in
/// the words so that expansion can interpret them later.
fn split_words(text: &str, escape: char) -> Vec<String> {
  let mut words = Vec::new();
  let mut word = String::new();
  let mut quote: Option<char> = None;
  let mut chars = text.chars();

  while let Some(ch) = chars.next() {
    match quote {
      Some(q) => {
        word.push(ch);
        if ch == q {
          quote = None;
        } else if ch == escape && q == '"' {
          if let Some(next) = chars.next() {
            word.push(next);
          }
        }
      }
      None if ch.is_whitespace() => {
        if !word.is_empty() {
          words.push(std::mem::take(&mut word));
        }
      }
      None => {
        word.push(ch);
        if ch == '"' || ch == '\'' {
          quote = Some(ch);
        } else if ch == escape {
          if let Some(next) = chars.next() {
            word.push(next);
          }
        }
      }
    }
  }

  if !word.is_empty() {
    words.push(word);
  }

  words
}

fn parse_from(line: usize, rest: &str, escape: char) -> Result<Stage, ParseError> {
  let (_, rest) = split_flags(rest);
  let words = split_words(rest, escape);

  let name = match words.as_slice() {
    [_] => None,
    [_, kw, name] if kw.eq_ignore_ascii_case("as") => Some(name.to_ascii_lowercase()),
    [] => {
      return Err(ParseError::MissingArguments {
        line,
        keyword: "FROM".to_string(),
        expected: 1,
      });
    }
    _ => {
      return Err(ParseError::InvalidArguments {
        line,
        keyword: "FROM".to_string(),
        message: "expected '<image> [AS <name>]'".to_string(),
      });
    }
  };

  Ok(Stage {
    base: words[0].clone(),
    name,
    line,
    instructions: Vec::new(),
  })
}

fn parse_instruction(
  keyword: &str,
  line: usize,
  rest: &str,
  escape: char,
  heredocs: Vec<Heredoc>,
) -> Result<InstructionKind, ParseError> {
  match keyword {
    "ARG" => parse_arg(line, rest, escape),
    "ENV" => parse_env(line, rest, escape),
    "COPY" => parse_transfer(keyword, line, rest, escape, heredocs).map(InstructionKind::Copy),
    "ADD" => parse_transfer(keyword, line, rest, escape, heredocs).map(|mut transfer| {
      transfer.from = None;
      InstructionKind::Add(transfer)
    }),
    "RUN" => parse_run(line, rest).map(InstructionKind::Run),
    other if OTHER_KEYWORDS.contains(&other) => Ok(InstructionKind::Other {
      keyword: other.to_string(),
      args: rest.to_string(),
    }),
    other => Err(ParseError::UnknownInstruction {
      line,
      keyword: other.to_string(),
    }),
  }
}

fn parse_arg(line: usize, rest: &str, escape: char) -> Result<InstructionKind, ParseError> {
  let words = split_words(rest, escape);
  if words.is_empty() {
    return Err(ParseError::MissingArguments {
      line,
      keyword: "ARG".to_string(),
      expected: 1,
    });
  }

  let mut decls = Vec::with_capacity(words.len());
  for word in words {
    let (name, default) = match word.split_once('=') {
      Some((name, value)) => (name.to_string(), Some(value.to_string())),
      None => (word, None),
    };
    if name.is_empty() {
      return Err(ParseError::InvalidArguments {
        line,
        keyword: "ARG".to_string(),
        message: "names can not be blank".to_string(),
      });
    }
    decls.push(ArgDecl { name, default });
  }

  Ok(InstructionKind::Arg(decls))
}

fn parse_env(line: usize, rest: &str, escape: char) -> Result<InstructionKind, ParseError> {
  let words = split_words(rest, escape);
  let Some(first) = words.first() else {
    return Err(ParseError::MissingArguments {
      line,
      keyword: "ENV".to_string(),
      expected: 1,
    });
  };

  let invalid = |message: &str| ParseError::InvalidArguments {
    line,
    keyword: "ENV".to_string(),
    message: message.to_string(),
  };

  if !first.contains('=') {
    // Legacy form: `ENV key value with spaces`.
    let value = rest[rest.find(first.as_str()).unwrap_or(0) + first.len()..].trim();
    if value.is_empty() {
      return Err(invalid("must have two arguments"));
    }
    return Ok(InstructionKind::Env(vec![(first.clone(), value.to_string())]));
  }

  let mut pairs = Vec::with_capacity(words.len());
  for word in &words {
    let (key, value) = word.split_once('=').ok_or_else(|| invalid("syntax error - can't find = in word"))?;
    if key.is_empty() {
      return Err(invalid("names can not be blank"));
    }
    pairs.push((key.to_string(), value.to_string()));
  }

  Ok(InstructionKind::Env(pairs))
}

fn parse_transfer(
  keyword: &str,
  line: usize,
  rest: &str,
  escape: char,
  heredocs: Vec<Heredoc>,
) -> Result<Transfer, ParseError> {
  let (flags, rest) = split_flags(rest);
  let from = flags
    .into_iter()
    .find(|(name, _)| name == "from")
    .and_then(|(_, value)| value);

  let mut words = match json_words(rest) {
    Some(words) => words,
    None => split_words(rest, escape),
  };

  if words.len() < 2 {
    return Err(ParseError::MissingArguments {
      line,
      keyword: keyword.to_string(),
      expected: 2,
    });
  }

  let dest = words.pop().unwrap_or_default();
  let sources = words
    .into_iter()
    .filter(|word| !heredoc_marker(word).is_some_and(|marker| heredocs.iter().any(|doc| doc.name == marker.name)))
    .collect();

  Ok(Transfer {
    from,
    sources,
    heredocs,
    dest,
  })
}

fn parse_run(line: usize, rest: &str) -> Result<RunCommand, ParseError> {
  let (flags, command) = split_flags(rest);

  let mut mounts = Vec::new();
  for (name, value) in flags {
    if name != "mount" {
      continue;
    }
    let value = value.unwrap_or_default();
    mounts.push(parse_mount(line, &value)?);
  }

  Ok(RunCommand {
    mounts,
    command: command.to_string(),
  })
}

/// Parse a `--mount=` value such as `type=bind,source=./src,target=/src`.
fn parse_mount(line: usize, value: &str) -> Result<Mount, ParseError> {
  let mut mount = Mount {
    kind: Mount::BIND.to_string(),
    source: None,
    target: None,
    from: None,
  };

  if value.trim().is_empty() {
    return Err(ParseError::InvalidMount {
      line,
      value: value.to_string(),
      message: "empty mount specification".to_string(),
    });
  }

  for field in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
    let Some((key, val)) = field.split_once('=') else {
      match field.to_ascii_lowercase().as_str() {
        "readonly" | "ro" | "readwrite" | "rw" => continue,
        _ => {
          return Err(ParseError::InvalidMount {
            line,
            value: value.to_string(),
            message: format!("invalid field '{field}', must be a key=value pair"),
          });
        }
      }
    };

    match key.trim().to_ascii_lowercase().as_str() {
      "type" => mount.kind = val.to_string(),
      "source" | "src" => mount.source = Some(val.to_string()),
      "target" | "dst" | "destination" => mount.target = Some(val.to_string()),
      "from" => mount.from = Some(val.to_string()),
      _ => {}
    }
  }

  Ok(mount)
}

/// Exec-form arguments (`["a", "b"]`), if the text is a JSON string array.
fn json_words(rest: &str) -> Option<Vec<String>> {
  if !rest.starts_with('[') {
    return None;
  }
  serde_json::from_str(rest).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn stage_kinds(recipe: &Recipe, stage: usize) -> Vec<&InstructionKind> {
    recipe.stages[stage].instructions.iter().map(|i| &i.kind).collect()
  }

  #[test]
  fn parses_stages_and_names() {
    let recipe = parse("FROM golang:1.22 AS build\nRUN go build\nFROM alpine\nCOPY --from=build /out /bin\n").unwrap();

    assert_eq!(recipe.stages.len(), 2);
    assert_eq!(recipe.stages[0].name.as_deref(), Some("build"));
    assert_eq!(recipe.stages[1].base, "alpine");
    assert_eq!(recipe.stages[1].line, 3);

    match stage_kinds(&recipe, 1)[0] {
      InstructionKind::Copy(t) => {
        assert_eq!(t.from.as_deref(), Some("build"));
        assert_eq!(t.sources, vec!["/out"]);
        assert_eq!(t.dest, "/bin");
      }
      other => panic!("expected COPY, got {other:?}"),
    }
  }

  #[test]
  fn meta_args_before_from() {
    let recipe = parse("ARG BASE=alpine\nFROM ${BASE}\n").unwrap();
    assert_eq!(recipe.meta_args.len(), 1);
    assert_eq!(
      recipe.meta_args[0].kind,
      InstructionKind::Arg(vec![ArgDecl {
        name: "BASE".to_string(),
        default: Some("alpine".to_string()),
      }])
    );
  }

  #[test]
  fn rejects_instruction_before_from() {
    let err = parse("COPY . /app\nFROM alpine\n").unwrap_err();
    assert_eq!(
      err,
      ParseError::NoStage {
        line: 1,
        keyword: "COPY".to_string()
      }
    );
  }

  #[test]
  fn rejects_unknown_instruction() {
    let err = parse("FROM alpine\nFROB x\n").unwrap_err();
    assert!(matches!(err, ParseError::UnknownInstruction { line: 2, .. }));
  }

  #[test]
  fn empty_file_is_an_error() {
    assert_eq!(parse("# just a comment\n\n").unwrap_err(), ParseError::Empty);
  }

  #[test]
  fn keywords_are_case_insensitive() {
    let recipe = parse("from alpine\ncopy a b\n").unwrap();
    assert!(matches!(stage_kinds(&recipe, 0)[0], InstructionKind::Copy(_)));
  }

  #[test]
  fn joins_continuation_lines_and_skips_comments() {
    let text = "FROM alpine\nCOPY a \\\n  # interleaved comment\n  b \\\n  /dst\n";
    let recipe = parse(text).unwrap();
    match stage_kinds(&recipe, 0)[0] {
      InstructionKind::Copy(t) => {
        assert_eq!(t.sources, vec!["a", "b"]);
        assert_eq!(t.dest, "/dst");
      }
      other => panic!("expected COPY, got {other:?}"),
    }
    assert_eq!(recipe.stages[0].instructions[0].line, 2);
  }

  #[test]
  fn escape_directive_changes_continuation() {
    let text = "# escape=`\nFROM windows\nCOPY C:\\src `\n  C:\\dst\n";
    let recipe = parse(text).unwrap();
    assert_eq!(recipe.escape, '`');
    match stage_kinds(&recipe, 0)[0] {
      InstructionKind::Copy(t) => {
        assert_eq!(t.sources, vec!["C:\\src"]);
        assert_eq!(t.dest, "C:\\dst");
      }
      other => panic!("expected COPY, got {other:?}"),
    }
  }

  #[test]
  fn invalid_escape_directive() {
    let err = parse("# escape=x\nFROM alpine\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidEscape { line: 1, .. }));
  }

  #[test]
  fn env_forms() {
    let recipe = parse("FROM alpine\nENV A=1 B=\"two words\"\nENV LEGACY some value\n").unwrap();
    let kinds = stage_kinds(&recipe, 0);
    assert_eq!(
      kinds[0],
      &InstructionKind::Env(vec![
        ("A".to_string(), "1".to_string()),
        ("B".to_string(), "\"two words\"".to_string()),
      ])
    );
    assert_eq!(
      kinds[1],
      &InstructionKind::Env(vec![("LEGACY".to_string(), "some value".to_string())])
    );
  }

  #[test]
  fn env_requires_value() {
    let err = parse("FROM alpine\nENV ONLYNAME\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidArguments { line: 2, .. }));
  }

  #[test]
  fn copy_requires_destination() {
    let err = parse("FROM alpine\nCOPY onlysource\n").unwrap_err();
    assert!(matches!(err, ParseError::MissingArguments { expected: 2, .. }));
  }

  #[test]
  fn copy_json_form() {
    let recipe = parse("FROM alpine\nCOPY [\"with space\", \"/dst\"]\n").unwrap();
    match stage_kinds(&recipe, 0)[0] {
      InstructionKind::Copy(t) => assert_eq!(t.sources, vec!["with space"]),
      other => panic!("expected COPY, got {other:?}"),
    }
  }

  #[test]
  fn run_mounts() {
    let recipe =
      parse("FROM alpine\nRUN --mount=type=bind,source=./c,target=/x --mount=type=cache,target=/root/.cache make\n")
        .unwrap();
    match stage_kinds(&recipe, 0)[0] {
      InstructionKind::Run(run) => {
        assert_eq!(run.mounts.len(), 2);
        assert_eq!(run.mounts[0].source.as_deref(), Some("./c"));
        assert!(run.mounts[0].is_local_bind());
        assert!(!run.mounts[1].is_local_bind());
        assert_eq!(run.command, "make");
      }
      other => panic!("expected RUN, got {other:?}"),
    }
  }

  #[test]
  fn mount_type_defaults_to_bind() {
    let mount = parse_mount(1, "src=./x,dst=/x,ro").unwrap();
    assert_eq!(mount.kind, "bind");
    assert_eq!(mount.source.as_deref(), Some("./x"));
    assert_eq!(mount.target.as_deref(), Some("/x"));
  }

  #[test]
  fn mount_from_stage_is_not_local() {
    let mount = parse_mount(1, "type=bind,from=build,source=/out,target=/x").unwrap();
    assert!(!mount.is_local_bind());
  }

  #[test]
  fn mount_rejects_bare_field() {
    assert!(matches!(parse_mount(3, "type=bind,bogus"), Err(ParseError::InvalidMount { line: 3, .. })));
  }

  #[test]
  fn copy_heredoc_is_not_a_source() {
    let text = "FROM alpine\nCOPY <<EOF ./local /dst\nhello\nEOF\nRUN echo done\n";
    let recipe = parse(text).unwrap();
    let kinds = stage_kinds(&recipe, 0);
    match kinds[0] {
      InstructionKind::Copy(t) => {
        assert_eq!(t.sources, vec!["./local"]);
        assert_eq!(t.heredocs.len(), 1);
        assert_eq!(t.heredocs[0].content, "hello\n");
      }
      other => panic!("expected COPY, got {other:?}"),
    }
    assert!(matches!(kinds[1], InstructionKind::Run(_)));
  }

  #[test]
  fn run_heredoc_with_tab_stripping() {
    let text = "FROM alpine\nRUN <<-'SCRIPT'\n\techo hi\n\tSCRIPT\nCOPY a /a\n";
    let recipe = parse(text).unwrap();
    assert_eq!(recipe.stages[0].instructions.len(), 2);
  }

  #[test]
  fn shift_operators_are_not_heredocs() {
    let recipe = parse("FROM alpine\nRUN echo \"1<<x\"\nRUN echo $((1<<SHIFT))\nCOPY a /a\n").unwrap();
    let kinds = stage_kinds(&recipe, 0);
    assert_eq!(kinds.len(), 3);
    assert!(matches!(kinds[2], InstructionKind::Copy(_)));
  }

  #[test]
  fn heredoc_marker_forms() {
    assert_eq!(
      heredoc_marker("<<-\"EOT\""),
      Some(HeredocMarker {
        name: "EOT".to_string(),
        strip_tabs: true
      })
    );
    assert_eq!(heredoc_marker("<<EOF").map(|m| m.name), Some("EOF".to_string()));
    assert_eq!(heredoc_marker("<<'unclosed"), None);
    assert_eq!(heredoc_marker("<<1"), None);
    assert_eq!(heredoc_marker("x<<EOF"), None);
  }

  #[test]
  fn decode_reports_line_of_invalid_byte() {
    assert_eq!(decode(b"FROM alpine\n").unwrap(), "FROM alpine\n");
    assert_eq!(decode(b"FROM alpine\nCOPY \xff /x\n").unwrap_err(), ParseError::InvalidUtf8 { line: 2 });
  }

  #[test]
  fn unterminated_heredoc() {
    let err = parse("FROM alpine\nRUN <<EOF\necho\n").unwrap_err();
    assert_eq!(
      err,
      ParseError::UnterminatedHeredoc {
        line: 2,
        name: "EOF".to_string()
      }
    );
  }

  #[test]
  fn split_words_keeps_quotes_and_escapes() {
    assert_eq!(
      split_words(r#"a "b c" 'd e' f\ g"#, '\\'),
      vec!["a", "\"b c\"", "'d e'", "f\\ g"]
    );
  }
}
