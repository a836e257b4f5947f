//! Shell-style expansion of single recipe words.
//!
//! Words from path-bearing instructions are expanded against the build
//! variables visible at that point of the recipe. The rules follow POSIX
//! parameter expansion as Dockerfiles use it:
//!
//! - `$NAME` and `${NAME}` expand to the value, or to nothing when unset
//! - `${NAME:-word}` / `${NAME-word}` fall back to `word` when unset or empty / unset
//! - `${NAME:+word}` / `${NAME+word}` use `word` when set and non-empty / set
//! - `${NAME:?msg}` / `${NAME?msg}` fail when unset or empty / unset
//!
//! Single quotes suppress expansion, double quotes allow it, and in both cases
//! the quotes are removed. The escape token (`\` by default) makes the next
//! character literal.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use dockersum_lib::expand::expand_word;
//!
//! let vars = HashMap::from([("SRC".to_string(), "app".to_string())]);
//! assert_eq!(expand_word("./${SRC}/*", &vars, '\\').unwrap(), "./app/*");
//! assert_eq!(expand_word("${MISSING:-dist}", &vars, '\\').unwrap(), "dist");
//! ```

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

/// Errors from malformed substitution syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
  #[error("missing '}}' in '{word}'")]
  Unterminated { word: String },

  #[error("bad substitution in '{word}': {detail}")]
  BadSubstitution { word: String, detail: String },

  #[error("unterminated {quote} quote in '{word}'")]
  UnterminatedQuote { word: String, quote: char },

  #[error("{name}: {message}")]
  Required { name: String, message: String },
}

/// Source of variable values for expansion.
pub trait Variables {
  /// Value of `name`, or `None` when the variable is not set.
  fn lookup(&self, name: &str) -> Option<&str>;
}

impl Variables for HashMap<String, String> {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name).map(String::as_str)
  }
}

impl Variables for BTreeMap<String, String> {
  fn lookup(&self, name: &str) -> Option<&str> {
    self.get(name).map(String::as_str)
  }
}

/// Expand one word using the given variables.
///
/// # Errors
///
/// Returns an error for unterminated `${`, invalid names, unterminated quotes,
/// and `${NAME?msg}` forms whose variable is not set.
pub fn expand_word(word: &str, vars: &impl Variables, escape: char) -> Result<String, ExpandError> {
  let mut lexer = Lexer {
    word,
    chars: word.chars().collect(),
    pos: 0,
    escape,
    vars,
  };
  lexer.process(None)
}

struct Lexer<'a, V: Variables> {
  word: &'a str,
  chars: Vec<char>,
  pos: usize,
  escape: char,
  vars: &'a V,
}

impl<V: Variables> Lexer<'_, V> {
  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn next(&mut self) -> Option<char> {
    let ch = self.peek()?;
    self.pos += 1;
    Some(ch)
  }

  /// Process until end of input, or until an unquoted `stop` character which
  /// is consumed but not emitted.
  fn process(&mut self, stop: Option<char>) -> Result<String, ExpandError> {
    let mut out = String::new();

    loop {
      let Some(ch) = self.next() else {
        if stop.is_some() {
          return Err(ExpandError::Unterminated {
            word: self.word.to_string(),
          });
        }
        return Ok(out);
      };

      if Some(ch) == stop {
        return Ok(out);
      }

      match ch {
        '\'' => out.push_str(&self.single_quoted()?),
        '"' => out.push_str(&self.double_quoted()?),
        '$' => out.push_str(&self.dollar()?),
        c if c == self.escape => match self.next() {
          Some(literal) => out.push(literal),
          None => out.push(c),
        },
        c => out.push(c),
      }
    }
  }

  fn single_quoted(&mut self) -> Result<String, ExpandError> {
    let mut out = String::new();
    loop {
      match self.next() {
        Some('\'') => return Ok(out),
        Some(c) => out.push(c),
        None => {
          return Err(ExpandError::UnterminatedQuote {
            word: self.word.to_string(),
            quote: '\'',
          });
        }
      }
    }
  }

  fn double_quoted(&mut self) -> Result<String, ExpandError> {
    let mut out = String::new();
    loop {
      match self.next() {
        Some('"') => return Ok(out),
        Some('$') => out.push_str(&self.dollar()?),
        Some(c) if c == self.escape => match self.next() {
          Some(next) if next == '"' || next == '$' || next == self.escape => out.push(next),
          Some(next) => {
            out.push(c);
            out.push(next);
          }
          None => out.push(c),
        },
        Some(c) => out.push(c),
        None => {
          return Err(ExpandError::UnterminatedQuote {
            word: self.word.to_string(),
            quote: '"',
          });
        }
      }
    }
  }

  fn name(&mut self) -> String {
    let mut name = String::new();
    while let Some(c) = self.peek() {
      if c.is_ascii_alphanumeric() || c == '_' {
        name.push(c);
        self.pos += 1;
      } else {
        break;
      }
    }
    name
  }

  /// Handle the text after a `$`.
  fn dollar(&mut self) -> Result<String, ExpandError> {
    match self.peek() {
      Some('{') => {
        self.pos += 1;
        self.braced()
      }
      Some(c) if c.is_ascii_alphabetic() || c == '_' => {
        let name = self.name();
        Ok(self.vars.lookup(&name).unwrap_or_default().to_string())
      }
      _ => Ok("$".to_string()),
    }
  }

  fn braced(&mut self) -> Result<String, ExpandError> {
    let name = self.name();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
      return Err(self.bad_substitution(format!("invalid variable name '{name}'")));
    }

    let colon = match self.peek() {
      Some('}') => {
        self.pos += 1;
        return Ok(self.vars.lookup(&name).unwrap_or_default().to_string());
      }
      Some(':') => {
        self.pos += 1;
        true
      }
      Some(_) => false,
      None => {
        return Err(ExpandError::Unterminated {
          word: self.word.to_string(),
        });
      }
    };

    let modifier = self.next();
    let operand = match modifier {
      Some('-' | '+' | '?') => self.process(Some('}'))?,
      Some(c) => return Err(self.bad_substitution(format!("unsupported modifier '{c}'"))),
      None => {
        return Err(ExpandError::Unterminated {
          word: self.word.to_string(),
        });
      }
    };

    let value = self.vars.lookup(&name);
    let present = match value {
      Some(v) => !colon || !v.is_empty(),
      None => false,
    };

    match modifier {
      Some('-') if present => Ok(value.unwrap_or_default().to_string()),
      Some('-') => Ok(operand),
      Some('+') if present => Ok(operand),
      Some('+') => Ok(String::new()),
      _ if present => Ok(value.unwrap_or_default().to_string()),
      _ => Err(ExpandError::Required {
        message: if operand.is_empty() {
          "parameter not set".to_string()
        } else {
          operand
        },
        name,
      }),
    }
  }

  fn bad_substitution(&self, detail: String) -> ExpandError {
    ExpandError::BadSubstitution {
      word: self.word.to_string(),
      detail,
    }
  }
}
