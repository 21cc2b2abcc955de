//! Simple recursive-descent parsing of grammar files.
//!
//! The format is one rule per line, alternatives separated by `|`:
//!
//! ```text
//! S  -> NP VP
//! NP -> N | Det N   // comments run to the end of the line
//! N  -> "holmes" | "pipe"
//! ```
//!
//! Terminals are quoted, everything else is a nonterminal name. A line ending
//! in `|` continues onto the next one, and `;` may be used instead of a newline.

use regex::Regex;

use crate::error::GrammarError;
use crate::rules::{Production, Rule};

/// Where parsing stopped, and why. `at` is always a suffix of the source.
struct Failure<'a> {
  at: &'a str,
  message: String,
}

impl<'a> Failure<'a> {
  fn context(self, what: &str) -> Self {
    Self {
      at: self.at,
      message: format!("{}: {}", what, self.message),
    }
  }

  fn into_error(self, src: &str) -> GrammarError {
    let consumed = &src[..src.len() - self.at.len()];
    let line = consumed.matches('\n').count() + 1;
    let snippet: String = self.at.lines().next().unwrap_or("").chars().take(24).collect();
    GrammarError::Syntax {
      line,
      message: if snippet.is_empty() {
        format!("{} at end of input", self.message)
      } else {
        format!("{} at {:?}", self.message, snippet)
      },
    }
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Failure<'a>>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => {
      let (matched, rest) = s.split_at(m.end());
      (Some(matched), rest)
    }
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, what: &str, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(Failure {
      at: s,
      message: format!("expected {}", what),
    })
  }
}

/// Skips whitespace, newlines included, and comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"^(?:\s+|//[^\n]*|#[^\n]*)*");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// Skips spaces and comments, stopping at the end of the line
fn skip_inline(s: &str) -> &str {
  regex_static!(INLINE_SPACE_OR_COMMENT, r"^(?:[ \t\r]+|//[^\n]*|#[^\n]*)*");
  optional_re(&INLINE_SPACE_OR_COMMENT, s).1
}

/// A nonterminal name: letters, numbers, _ and inner -
fn parse_name(s: &str) -> ParseResult<&str> {
  regex_static!(NAME, r"^[A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*");
  needed_re(&NAME, "a name", s)
}

/// A single- or double-quoted word, returned without its quotes
fn parse_terminal(s: &str) -> ParseResult<&str> {
  regex_static!(TERMINAL, r#"^(?:"[^"\n]*"|'[^'\n]*')"#);
  let (quoted, rest) = needed_re(&TERMINAL, "a closed quoted terminal", s)?;
  Ok((&quoted[1..quoted.len() - 1], rest))
}

fn parse_production(s: &str) -> ParseResult<Production> {
  if s.starts_with('"') || s.starts_with('\'') {
    let (word, s) = parse_terminal(s)?;
    Ok((Production::terminal(word), s))
  } else {
    let (name, s) = parse_name(s).map_err(|f| f.context("production"))?;
    Ok((Production::nonterminal(name), s))
  }
}

/// Productions up to the next `|`, `;` or end of line. May be empty, which
/// `Grammar::new` rejects with a better message than we can give here.
fn parse_alternative(s: &str) -> ParseResult<Vec<Production>> {
  let mut productions = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_inline(rem);
    match rem.chars().next() {
      None | Some('|') | Some(';') | Some('\n') => return Ok((productions, rem)),
      Some(_) => {
        let (p, s) = parse_production(rem)?;
        productions.push(p);
        rem = s;
      }
    }
  }
}

/// `Name -> alt | alt | ...`, producing one rule per alternative
fn parse_rule(s: &str) -> ParseResult<Vec<Rule>> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "^->");

  let (lhs, s) = parse_name(s).map_err(|f| f.context("rule symbol"))?;
  let s = skip_inline(s);
  let (_, s) = needed_re(&ARROW, "->", s).map_err(|f| f.context("rule arrow"))?;

  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    let (productions, s) = parse_alternative(rem)?;
    rules.push(Rule::new(lhs, productions));

    if let Some(s) = s.strip_prefix('|') {
      // alternatives may continue on the next line
      rem = skip_whitespace(s);
      continue;
    }

    let s = s
      .strip_prefix(';')
      .or_else(|| s.strip_prefix('\n'))
      .unwrap_or(s);
    return Ok((rules, s));
  }
}

/// Parses grammar source into its rules, in source order
pub fn parse_rules(src: &str) -> Result<Vec<Rule>, GrammarError> {
  let mut rules = Vec::new();
  let mut rem = src;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok(rules);
    }
    match parse_rule(rem) {
      Ok((mut parsed, s)) => {
        rules.append(&mut parsed);
        rem = s;
      }
      Err(failure) => return Err(failure.into_error(src)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_rules() {
    let rules = parse_rules(
      r#"
      // a comment
      S -> NP VP
      NP -> N | Det N   # trailing comment
      Det -> "the" | 'a'
      N -> "dog" |
           "door"
      VP -> V "here"; V -> "sat"
      "#,
    )
    .unwrap();

    let shown = rules.iter().map(|r| r.to_string()).collect::<Vec<_>>();
    assert_eq!(
      shown,
      vec![
        "S -> NP VP",
        "NP -> N",
        "NP -> Det N",
        "Det -> \"the\"",
        "Det -> \"a\"",
        "N -> \"dog\"",
        "N -> \"door\"",
        "VP -> V \"here\"",
        "V -> \"sat\"",
      ]
    );
  }

  #[test]
  fn test_arrow_without_spaces() {
    let rules = parse_rules("AdjP->Adj NP").unwrap();
    assert_eq!(rules[0].to_string(), "AdjP -> Adj NP");
  }

  #[test]
  fn test_hyphenated_names() {
    let rules = parse_rules("Noun-Phrase->Det Proper-Noun").unwrap();
    assert_eq!(rules[0].to_string(), "Noun-Phrase -> Det Proper-Noun");

    assert!(matches!(
      parse_rules("-NP -> \"x\""),
      Err(GrammarError::Syntax { line: 1, .. })
    ));
  }

  #[test]
  fn test_empty_alternative_is_kept() {
    let rules = parse_rules("S -> | \"x\"").unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules[0].is_empty());
  }

  #[test]
  fn test_syntax_errors() {
    match parse_rules("S -> NP\nNP \"dog\"\n") {
      Err(GrammarError::Syntax { line, message }) => {
        assert_eq!(line, 2);
        assert!(message.contains("->"), "{}", message);
      }
      other => panic!("expected syntax error, got {:?}", other),
    }

    match parse_rules("S -> \"unclosed\n") {
      Err(GrammarError::Syntax { line, .. }) => assert_eq!(line, 1),
      other => panic!("expected syntax error, got {:?}", other),
    }
  }
}
