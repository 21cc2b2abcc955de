use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GrammarError;
use crate::parse_grammar::parse_rules;
use crate::rules::{Production, Rule};

/// An immutable context-free grammar. Rules are grouped by their left-hand
/// side, keeping the order alternatives were written in.
#[derive(Debug)]
pub struct Grammar {
  start: String,
  rules: HashMap<String, Vec<Arc<Rule>>>,
  /// left-hand sides in first-seen order, for display
  order: Vec<String>,
  vocabulary: HashSet<String>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // the first rule's symbol is the start symbol when read back in
    let rest = self.order.iter().filter(|lhs| **lhs != self.start);
    for lhs in std::iter::once(&self.start).chain(rest) {
      write!(f, "{} ->", lhs)?;
      for (idx, rule) in self.rules[lhs].iter().enumerate() {
        if idx > 0 {
          write!(f, " |")?;
        }
        for p in rule.productions.iter() {
          write!(f, " {}", p)?;
        }
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

impl Grammar {
  /// Builds a grammar from a list of rules and a start symbol.
  ///
  /// Fails if there are no rules, if any rule has an empty right-hand side, or
  /// if the start symbol has no rules. Identical alternatives are collapsed,
  /// so every derivation the parser finds is structurally distinct.
  pub fn new(rules: Vec<Rule>, start: impl Into<String>) -> Result<Self, GrammarError> {
    let start = start.into();
    if rules.is_empty() {
      return Err(GrammarError::Empty);
    }

    let mut grouped: HashMap<String, Vec<Arc<Rule>>> = HashMap::new();
    let mut order = Vec::new();
    let mut vocabulary = HashSet::new();

    for rule in rules {
      if rule.is_empty() {
        return Err(GrammarError::EmptyRule(rule.symbol_str().to_string()));
      }

      for p in rule.productions.iter() {
        if let Production::Terminal(word) = p {
          vocabulary.insert(word.clone());
        }
      }

      let alternatives = grouped.entry(rule.symbol_str().to_string()).or_insert_with(|| {
        order.push(rule.symbol_str().to_string());
        Vec::new()
      });
      if alternatives.iter().any(|r| **r == rule) {
        debug!(%rule, "skipping duplicate alternative");
        continue;
      }
      alternatives.push(Arc::new(rule));
    }

    if !grouped.contains_key(&start) {
      return Err(GrammarError::MissingStart(start));
    }

    let grammar = Self {
      start,
      rules: grouped,
      order,
      vocabulary,
    };

    for name in grammar.dangling_nonterminals() {
      warn!(symbol = %name, "nonterminal is used but has no rules");
    }

    Ok(grammar)
  }

  /// Parses a grammar from source text, using `start` instead of the first
  /// rule's symbol as the start symbol.
  pub fn from_str_with_start(s: &str, start: &str) -> Result<Self, GrammarError> {
    Self::new(parse_rules(s)?, start)
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    std::fs::read_to_string(path)?.parse()
  }

  pub fn read_from_file_with_start(
    path: impl AsRef<Path>,
    start: &str,
  ) -> Result<Self, GrammarError> {
    Self::from_str_with_start(&std::fs::read_to_string(path)?, start)
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  /// The alternatives for `name`, in source order. Empty for unknown symbols.
  pub fn rules_for(&self, name: &str) -> &[Arc<Rule>] {
    self.rules.get(name).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
    self
      .order
      .iter()
      .flat_map(move |lhs| self.rules[lhs].iter())
  }

  pub fn is_terminal(&self, production: &Production) -> bool {
    production.is_terminal()
  }

  pub fn is_nonterminal(&self, name: &str) -> bool {
    self.rules.contains_key(name)
  }

  pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
    self.order.iter().map(String::as_str)
  }

  /// Whether some terminal in the grammar matches `word` exactly
  pub fn has_word(&self, word: &str) -> bool {
    self.vocabulary.contains(word)
  }

  pub fn vocabulary(&self) -> &HashSet<String> {
    &self.vocabulary
  }

  /// Input words that no terminal covers, in input order, without repeats
  pub fn uncovered_words(&self, input: &[&str]) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for word in input {
      if !self.has_word(word) && !missing.iter().any(|m| m == word) {
        missing.push(word.to_string());
      }
    }
    missing
  }

  /// Nonterminals that appear on some right-hand side without having rules
  /// of their own. Sentences that need them can never parse.
  pub fn dangling_nonterminals(&self) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut dangling = Vec::new();
    for rule in self.rules() {
      for p in rule.productions.iter() {
        if let Production::Nonterminal(s) = p {
          if !self.rules.contains_key(&s.name) && seen.insert(s.name.as_str()) {
            dangling.push(s.name.as_str());
          }
        }
      }
    }
    dangling
  }
}

impl FromStr for Grammar {
  type Err = GrammarError;

  /// Parses a grammar from a string. Assumes the first rule's symbol
  /// is the start symbol.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rules = parse_rules(s)?;
    let start = match rules.first() {
      Some(rule) => rule.symbol_str().to_string(),
      None => return Err(GrammarError::Empty),
    };
    Self::new(rules, start)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rule(lhs: &str, rhs: &[Production]) -> Rule {
    Rule::new(lhs, rhs.to_vec())
  }

  #[test]
  fn test_build() {
    let g = Grammar::new(
      vec![
        rule(
          "S",
          &[Production::nonterminal("NP"), Production::nonterminal("V")],
        ),
        rule("NP", &[Production::terminal("dogs")]),
        rule("NP", &[Production::terminal("cats")]),
        rule("V", &[Production::terminal("bark")]),
      ],
      "S",
    )
    .unwrap();

    assert_eq!(g.start(), "S");
    assert_eq!(g.rules_for("NP").len(), 2);
    assert!(g.rules_for("Adj").is_empty());
    assert!(g.has_word("cats"));
    assert!(!g.has_word("Cats"));
    assert!(g.is_terminal(&Production::terminal("bark")));
    assert!(!g.is_terminal(&Production::nonterminal("V")));
    assert_eq!(g.nonterminals().collect::<Vec<_>>(), vec!["S", "NP", "V"]);
    assert_eq!(
      g.uncovered_words(&["dogs", "meow", "xyzzy", "meow"]),
      vec!["meow", "xyzzy"]
    );
  }

  #[test]
  fn test_build_errors() {
    assert!(matches!(
      Grammar::new(Vec::new(), "S"),
      Err(GrammarError::Empty)
    ));
    assert!(matches!(
      Grammar::new(vec![rule("NP", &[Production::terminal("x")])], "S"),
      Err(GrammarError::MissingStart(s)) if s == "S"
    ));
    assert!(matches!(
      Grammar::new(vec![rule("S", &[])], "S"),
      Err(GrammarError::EmptyRule(s)) if s == "S"
    ));
  }

  #[test]
  fn test_duplicates_collapsed() {
    let g: Grammar = r#"
      S -> "x" | "x"
      S -> "x" | "y"
    "#
    .parse()
    .unwrap();
    assert_eq!(g.rules_for("S").len(), 2);
  }

  #[test]
  fn test_dangling() {
    let g: Grammar = r#"
      S -> NP VP
      NP -> "dogs"
    "#
    .parse()
    .unwrap();
    assert_eq!(g.dangling_nonterminals(), vec!["VP"]);
  }

  #[test]
  fn test_display_reparses() {
    let src = r#"
      S -> NP VP
      NP -> "the" N | N
      N -> "dog"
      VP -> "barked"
    "#;
    let g: Grammar = src.parse().unwrap();
    let again: Grammar = g.to_string().parse().unwrap();
    assert_eq!(g.rules().count(), again.rules().count());
    for (a, b) in g.rules().zip(again.rules()) {
      assert_eq!(a, b);
    }
  }

  #[test]
  fn test_display_keeps_start() {
    let g = Grammar::from_str_with_start("A -> \"x\"\nS -> A A", "S").unwrap();
    let again: Grammar = g.to_string().parse().unwrap();
    assert_eq!(again.start(), "S");
    assert_eq!(again.rules().count(), 2);
    assert_eq!(again.parse(&["x", "x"]).unwrap().len(), 1);
  }

  #[test]
  fn test_read_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/grammars/sentences.cfg");

    let g = Grammar::read_from_file(path).unwrap();
    assert_eq!(g.start(), "S");
    assert!(g.has_word("holmes"));

    let g = Grammar::read_from_file_with_start(path, "NP").unwrap();
    assert_eq!(g.start(), "NP");
    assert_eq!(g.parse(&["the", "pipe"]).unwrap().len(), 2);

    assert!(matches!(
      Grammar::read_from_file("no/such/grammar.cfg"),
      Err(GrammarError::Io(_))
    ));
  }
}
