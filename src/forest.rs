use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::earley::Chart;
use crate::error::{Limit, ParseError};
use crate::grammar::Grammar;
use crate::options::ParseOptions;
use crate::rules::{Production, Rule};
use crate::syntree::{Constituent, ParseTree, SynTree, Word};
use crate::utils::combinations;

/// A completed rule over a span of the input
#[derive(Debug, Clone, PartialEq)]
pub struct ForestState {
  rule: Arc<Rule>,
  span: (usize, usize),
}

impl ForestState {
  pub fn new(rule: &Arc<Rule>, start: usize, end: usize) -> Self {
    Self {
      rule: rule.clone(),
      span: (start, end),
    }
  }
}

impl fmt::Display for ForestState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.rule)
  }
}

/// Completed states from a chart, indexed by where they start
#[derive(Debug, Clone, PartialEq)]
pub struct Forest(Vec<Vec<ForestState>>);

/// One child position of a rule, pinned to part of the input
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot<'f> {
  Word(usize),
  Constituent(&'f str, usize, usize),
}

impl Forest {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Whether some rule for `symbol` was completed over exactly `start..end`
  pub fn has(&self, symbol: &str, start: usize, end: usize) -> bool {
    self
      .0
      .get(start)
      .is_some_and(|states| states.iter().any(|s| s.span.1 == end && s.rule.symbol_str() == symbol))
  }

  /// Distinct ends of completed `symbol` constituents starting at `start`,
  /// no further than `limit`, ascending
  fn ends(&self, symbol: &str, start: usize, limit: usize) -> Vec<usize> {
    self.0[start]
      .iter()
      .filter(|s| s.span.1 <= limit && s.rule.symbol_str() == symbol)
      .map(|s| s.span.1)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  /// Takes a rule and search span, and returns every way of splitting the
  /// span between the rule's productions. Each production gets at least one
  /// token, terminals must match the input, and nonterminals only get spans
  /// the chart actually completed them over.
  ///
  /// So for
  ///
  /// ```text
  /// S -> "x" | S S
  /// input: x x x
  /// ```
  ///
  /// splitting `S -> S S` over 0..3 gives `[S 0..1, S 1..3]` and `[S 0..2, S 2..3]`.
  fn extend_out<'f>(
    &'f self,
    input: &[&str],
    rule: &'f Rule,
    prod_idx: usize,
    search_start: usize,
    search_end: usize,
  ) -> Vec<Vec<Slot<'f>>> {
    if prod_idx == rule.len() && search_start == search_end {
      // base case, we consumed the whole rule and the whole span together.
      // provide a single empty sequence as a base for prepending onto as we unwind the stack
      return vec![Vec::new()];
    }
    let remaining = rule.len() - prod_idx;
    if remaining == 0 || search_end - search_start < remaining {
      // not enough tokens left to give every production at least one
      return Vec::new();
    }

    match &rule.productions[prod_idx] {
      Production::Nonterminal(wanted) => {
        // leave a token for each production after this one
        let limit = search_end - (remaining - 1);
        self
          .ends(&wanted.name, search_start, limit)
          .into_iter()
          .flat_map(|end| {
            self
              .extend_out(input, rule, prod_idx + 1, end, search_end)
              .into_iter()
              .map(move |mut seq| {
                seq.insert(0, Slot::Constituent(&wanted.name, search_start, end));
                seq
              })
          })
          .collect()
      }
      Production::Terminal(word) => {
        if input[search_start] != word.as_str() {
          return Vec::new();
        }
        self
          .extend_out(input, rule, prod_idx + 1, search_start + 1, search_end)
          .into_iter()
          .map(|mut seq| {
            seq.insert(0, Slot::Word(search_start));
            seq
          })
          .collect()
      }
    }
  }

  /// Every tree for the grammar's start symbol spanning all of `input`.
  /// `input` must be the same tokens the chart was built from.
  pub fn trees(
    &self,
    g: &Grammar,
    input: &[&str],
    options: &ParseOptions,
  ) -> Result<Vec<ParseTree>, ParseError> {
    if self.is_empty() || !self.has(g.start(), 0, self.len()) {
      return Ok(Vec::new());
    }

    let mut deriver = Deriver {
      forest: self,
      input,
      memo: HashMap::new(),
      in_progress: HashMap::new(),
      low: usize::MAX,
      budget: Budget::new(options),
    };
    let trees = deriver.derive(g.start(), 0, self.len())?;
    trace!(
      built = deriver.budget.built,
      memoized = deriver.memo.len(),
      "forest search done"
    );
    drop(deriver);

    Ok(Rc::try_unwrap(trees).unwrap_or_else(|shared| (*shared).clone()))
  }
}

type Key<'f> = (&'f str, usize, usize);

/// Memoized search for all derivations of a symbol over a span. Lives for a
/// single call to `Forest::trees`.
struct Deriver<'f, 'i> {
  forest: &'f Forest,
  input: &'i [&'i str],
  memo: HashMap<Key<'f>, Rc<Vec<ParseTree>>>,
  /// keys currently being derived, with their depth
  in_progress: HashMap<Key<'f>, usize>,
  /// shallowest in-progress key the current derivation ran into
  low: usize,
  budget: Budget,
}

impl<'f, 'i> Deriver<'f, 'i> {
  /// All trees labeled `symbol` whose leaves are exactly `input[start..end]`.
  ///
  /// Unit-rule cycles (`A -> B`, `B -> A`) would give infinitely many trees,
  /// so a derivation never passes through the same symbol and span twice on
  /// one path. Results that depended on cutting such a cycle higher up are
  /// not memoized, since they're only valid beneath that ancestor.
  fn derive(
    &mut self,
    symbol: &'f str,
    start: usize,
    end: usize,
  ) -> Result<Rc<Vec<ParseTree>>, ParseError> {
    let key = (symbol, start, end);
    if let Some(trees) = self.memo.get(&key) {
      return Ok(trees.clone());
    }
    if let Some(&depth) = self.in_progress.get(&key) {
      trace!(symbol, start, end, "cut unit cycle");
      self.low = self.low.min(depth);
      return Ok(Rc::new(Vec::new()));
    }
    self.budget.check_time()?;

    let depth = self.in_progress.len();
    self.in_progress.insert(key, depth);
    let outer_low = std::mem::replace(&mut self.low, usize::MAX);

    let result = self.derive_rules(symbol, start, end);

    self.in_progress.remove(&key);
    let low = std::mem::replace(&mut self.low, outer_low);
    let trees = Rc::new(result?);
    if low >= depth {
      self.memo.insert(key, trees.clone());
    } else {
      self.low = self.low.min(low);
    }
    Ok(trees)
  }

  fn derive_rules(
    &mut self,
    symbol: &'f str,
    start: usize,
    end: usize,
  ) -> Result<Vec<ParseTree>, ParseError> {
    let forest = self.forest;
    let mut trees = Vec::new();

    for state in forest.0[start]
      .iter()
      .filter(|s| s.span.1 == end && s.rule.symbol_str() == symbol)
    {
      let rule: &'f Rule = &state.rule;
      for slots in forest.extend_out(self.input, rule, 0, start, end) {
        let child_sets = slots
          .iter()
          .map(|slot| self.slot_trees(*slot))
          .collect::<Result<Vec<_>, _>>()?;
        let child_sets = child_sets.iter().map(|s| s.as_slice()).collect::<Vec<_>>();

        let count = child_sets
          .iter()
          .try_fold(1usize, |acc, s| acc.checked_mul(s.len()))
          .unwrap_or(usize::MAX);
        if count == 0 {
          continue;
        }
        self.budget.spend(count)?;

        for children in combinations(&child_sets) {
          trees.push(SynTree::Branch(
            Constituent {
              value: rule.symbol.clone(),
              span: (start, end),
            },
            children,
          ));
        }
      }
    }

    Ok(trees)
  }

  fn slot_trees(&mut self, slot: Slot<'f>) -> Result<Rc<Vec<ParseTree>>, ParseError> {
    match slot {
      Slot::Word(at) => Ok(Rc::new(vec![SynTree::Leaf(Word {
        value: self.input[at].to_string(),
        span: (at, at + 1),
      })])),
      Slot::Constituent(symbol, start, end) => self.derive(symbol, start, end),
    }
  }
}

/// Tracks how much work a search has done against `ParseOptions`
struct Budget {
  max_trees: Option<usize>,
  deadline: Option<(Instant, Duration)>,
  built: usize,
}

impl Budget {
  fn new(options: &ParseOptions) -> Self {
    Self {
      max_trees: options.max_trees,
      deadline: options.timeout.map(|t| (Instant::now() + t, t)),
      built: 0,
    }
  }

  /// Accounts for `n` more trees, intermediate constituents included
  fn spend(&mut self, n: usize) -> Result<(), ParseError> {
    self.built = self.built.saturating_add(n);
    match self.max_trees {
      Some(max) if self.built > max => Err(ParseError::LimitExceeded(Limit::Trees(max))),
      _ => self.check_time(),
    }
  }

  /// Runs between cross products, never inside one, so a product in flight
  /// can carry the search past its deadline
  fn check_time(&self) -> Result<(), ParseError> {
    match self.deadline {
      Some((deadline, timeout)) if Instant::now() > deadline => {
        Err(ParseError::LimitExceeded(Limit::Timeout(timeout)))
      }
      _ => Ok(()),
    }
  }
}

impl From<Chart> for Forest {
  fn from(chart: Chart) -> Self {
    // the new chart will be indexed by origin location, and no rule can have
    // its origin at the end of the string, so len is chart.len - 1
    let mut v = vec![Vec::new(); chart.len().saturating_sub(1)];

    for (k, states) in chart.into_iter() {
      for state in states {
        // exclude unfinished rules that can't contribute to a tree
        if !state.lr0.is_active() {
          v[state.origin].push(ForestState::new(&state.lr0.rule, state.origin, k));
        }
      }
    }

    Self(v)
  }
}

impl fmt::Display for Forest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for k in 0..self.len() {
      writeln!(f, "Origin {}:", k)?;
      for fs in self.0[k].iter() {
        writeln!(f, "  {}", fs)?;
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::earley::parse_chart;

  fn forest(g: &Grammar, input: &[&str]) -> Forest {
    parse_chart(g, input).into()
  }

  #[test]
  fn test_parse_chart() {
    let g: Grammar = r#"
      S -> "x"
      S -> S S
    "#
    .parse()
    .unwrap();

    let rule1 = g.rules_for("S").iter().find(|r| r.len() == 1).unwrap();
    let rule2 = g.rules_for("S").iter().find(|r| r.len() == 2).unwrap();

    let forest = forest(&g, &["x", "x", "x"]);

    assert_eq!(
      forest,
      Forest(vec![
        vec![
          ForestState::new(rule1, 0, 1),
          ForestState::new(rule2, 0, 2),
          ForestState::new(rule2, 0, 3),
        ],
        vec![ForestState::new(rule1, 1, 2), ForestState::new(rule2, 1, 3)],
        vec![ForestState::new(rule1, 2, 3)],
      ])
    );
  }

  #[test]
  fn test_tree_generation() {
    // the correct algorithm finds 2 trees:
    //  (S (S x) (S (S x) (S x)))           -> [x][xx]
    //  (S (S (S x) (S x)) (S x))           -> [xx][x]
    // naive forest processing finds spurious trees like (S (S x) (S x)) that
    // don't cover the whole input
    let g: Grammar = r#"
      S -> "x"
      S -> S S
    "#
    .parse()
    .unwrap();

    let input = ["x", "x", "x"];
    let trees = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default())
      .unwrap();

    assert_eq!(trees.len(), 2);
    for tree in trees.iter() {
      assert_eq!(tree.words(), vec!["x", "x", "x"]);
    }
    assert_ne!(trees[0], trees[1]);
  }

  #[test]
  fn test_catalan_growth() {
    // binary bracketings of n leaves: catalan(n - 1)
    let g: Grammar = "S -> \"x\" | S S".parse().unwrap();
    let expected = [1, 1, 2, 5, 14, 42, 132];
    for (n, count) in expected.iter().enumerate().skip(1) {
      let input = vec!["x"; n];
      let trees = forest(&g, &input)
        .trees(&g, &input, &ParseOptions::default())
        .unwrap();
      assert_eq!(trees.len(), *count, "n = {}", n);
    }
  }

  #[test]
  fn test_terminals_checked_against_input() {
    // A completes over 0..1 and 0..2, and B over 2..4 and 3..4. Splitting at
    // A 0..1 would put "q" over the "b" at 1, so only one split is real.
    let g: Grammar = r#"
      S -> A "q" B
      A -> "a" | "a" "b"
      B -> "z" | "q" "z"
    "#
    .parse()
    .unwrap();

    let input = ["a", "b", "q", "z"];
    let trees = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default())
      .unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].words(), vec!["a", "b", "q", "z"]);
  }

  #[test]
  fn test_unit_cycle_terminates() {
    let g: Grammar = r#"
      S -> A
      A -> B | "x"
      B -> A
    "#
    .parse()
    .unwrap();

    let input = ["x"];
    let trees = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default())
      .unwrap();
    // S -> A -> x, and S -> A -> B -> A -> x is cut where A repeats
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].to_string(), "(S (A x))");
  }

  #[test]
  fn test_cycle_results_not_shared() {
    // B over 0..1 is first reached beneath A, where A -> B -> A is cut.
    // It must still derive through A when reached from C.
    let g: Grammar = r#"
      S -> A | C
      A -> B | "x"
      B -> A
      C -> B
    "#
    .parse()
    .unwrap();

    let input = ["x"];
    let trees = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default())
      .unwrap();
    let shown = trees.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    assert!(shown.contains(&"(S (A x))".to_string()), "{:?}", shown);
    assert!(
      shown.contains(&"(S (C (B (A x))))".to_string()),
      "{:?}",
      shown
    );
  }

  #[test]
  fn test_tree_limit() {
    let g: Grammar = "S -> \"x\" | S S".parse().unwrap();
    let input = vec!["x"; 8];
    let err = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default().with_max_trees(50))
      .unwrap_err();
    assert_eq!(err, ParseError::LimitExceeded(Limit::Trees(50)));
  }

  #[test]
  fn test_timeout() {
    let g: Grammar = "S -> \"x\" | S S".parse().unwrap();

    let input = vec!["x"; 14];
    let options = ParseOptions::unlimited().with_timeout(Duration::from_millis(20));
    let err = forest(&g, &input).trees(&g, &input, &options).unwrap_err();
    assert!(
      matches!(err, ParseError::LimitExceeded(Limit::Timeout(t)) if t == Duration::from_millis(20)),
      "{:?}",
      err
    );

    let input = vec!["x"; 4];
    let options = ParseOptions::unlimited().with_timeout(Duration::from_secs(60));
    let trees = forest(&g, &input).trees(&g, &input, &options).unwrap();
    assert_eq!(trees.len(), 5);
  }

  #[test]
  fn test_rejected_input_has_no_trees() {
    let g: Grammar = "S -> \"x\" \"y\"".parse().unwrap();
    let input = ["x", "x"];
    let trees = forest(&g, &input)
      .trees(&g, &input, &ParseOptions::default())
      .unwrap();
    assert!(trees.is_empty());
  }
}
