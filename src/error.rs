use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Problems building a grammar. These are fatal: a grammar that fails to build
/// can't be used for any request.
#[derive(Debug, Error)]
pub enum GrammarError {
  #[error("empty ruleset")]
  Empty,
  #[error("start symbol {0} has no rules")]
  MissingStart(String),
  #[error("rule for {0} has an empty right-hand side")]
  EmptyRule(String),
  #[error("line {line}: {message}")]
  Syntax { line: usize, message: String },
  #[error("couldn't read grammar: {0}")]
  Io(#[from] io::Error),
}

/// Which bound a parse ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
  Trees(usize),
  Timeout(Duration),
}

impl fmt::Display for Limit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Trees(n) => write!(f, "more than {} trees", n),
      Self::Timeout(d) => write!(f, "more than {}ms", d.as_millis()),
    }
  }
}

/// Per-request failures. A sentence that is lexically fine but has no
/// derivation is *not* an error, it's an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("grammar does not cover some of the input words: {}", quoted(.0))]
  UnknownWords(Vec<String>),
  #[error("parse limit exceeded: {0}")]
  LimitExceeded(Limit),
}

fn quoted(words: &[String]) -> String {
  words
    .iter()
    .map(|w| format!("\"{}\"", w))
    .collect::<Vec<_>>()
    .join(", ")
}

#[test]
fn test_error_messages() {
  let err = ParseError::UnknownWords(vec!["xyzzy".into(), "plugh".into()]);
  assert_eq!(
    err.to_string(),
    "grammar does not cover some of the input words: \"xyzzy\", \"plugh\""
  );

  let err = ParseError::LimitExceeded(Limit::Trees(10));
  assert_eq!(err.to_string(), "parse limit exceeded: more than 10 trees");

  let err = GrammarError::Syntax {
    line: 3,
    message: "expected ->".into(),
  };
  assert_eq!(err.to_string(), "line 3: expected ->");
}
