use std::fmt;

/// A nonterminal name, such as `NP`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// One element of a rule's right-hand side: either a literal word or a
/// nonterminal that must be expanded further.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Production {
  Terminal(String),
  Nonterminal(Symbol),
}

impl Production {
  pub fn terminal(word: impl Into<String>) -> Self {
    Self::Terminal(word.into())
  }

  pub fn nonterminal(name: impl Into<String>) -> Self {
    Self::Nonterminal(Symbol::new(name))
  }

  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => &s.name,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal(_))
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Self::Nonterminal(_))
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "\"{}\"", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

/// A single alternative `symbol -> productions...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
  pub symbol: Symbol,
  pub productions: Vec<Production>,
}

impl Rule {
  pub fn new(symbol: impl Into<String>, productions: Vec<Production>) -> Self {
    Self {
      symbol: Symbol::new(symbol),
      productions,
    }
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol.name
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

#[test]
fn test_rule_display() {
  let rule = Rule::new(
    "NP",
    vec![Production::nonterminal("Det"), Production::terminal("dog")],
  );
  assert_eq!(rule.to_string(), "NP -> Det \"dog\"");
  assert_eq!(rule.len(), 2);
  assert!(rule.productions[1].is_terminal());
  assert!(rule.productions[0].is_nonterminal());
}
