use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::grammar::Grammar;
use crate::rules::{Production, Rule};

/// A rule with a dot marking how many of its productions have been matched
#[derive(Debug, Clone)]
pub struct LR0 {
  pub rule: Arc<Rule>,
  pub pos: usize,
}

impl PartialEq for LR0 {
  // the grammar never holds two equal rules, so identity is enough
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.rule, &other.rule) && self.pos == other.pos
  }
}

impl LR0 {
  pub fn new(rule: &Arc<Rule>) -> Self {
    Self {
      rule: rule.clone(),
      pos: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.pos < self.rule.len()
  }

  pub fn advance(&self) -> Self {
    assert!(self.is_active());
    Self {
      rule: self.rule.clone(),
      pos: self.pos + 1,
    }
  }

  pub fn next_production(&self) -> Option<&Production> {
    self.rule.productions.get(self.pos)
  }
}

impl fmt::Display for LR0 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} →", self.rule.symbol)?;
    for idx in 0..self.rule.len() {
      if idx == self.pos {
        write!(f, " ・")?;
      }
      write!(f, " {}", self.rule.productions[idx])?;
    }
    if !self.is_active() {
      write!(f, " ・")?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub lr0: LR0,
  pub origin: usize,
}

impl State {
  pub fn new(lr0: LR0, origin: usize) -> Self {
    Self { lr0, origin }
  }

  pub fn advance(&self) -> Self {
    Self::new(self.lr0.advance(), self.origin)
  }
}

/// Earley chart: one set of states per position between tokens, so
/// `input.len() + 1` sets in total.
#[derive(Debug)]
pub struct Chart(Vec<Vec<State>>);

impl Chart {
  pub fn new(length: usize) -> Self {
    Self(vec![Vec::new(); length])
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn len_at(&self, k: usize) -> usize {
    self.0[k].len()
  }

  pub fn has(&self, k: usize, state: &State) -> bool {
    self.0[k].contains(state)
  }

  pub fn add(&mut self, k: usize, state: State) {
    if !self.has(k, &state) {
      self.0[k].push(state);
    }
  }

  /// Get an owned state so that passing around &mut chart is more ergonomic.
  /// The clone is an Arc bump and two usizes.
  fn get_state(&self, k: usize, idx: usize) -> State {
    self.0[k][idx].clone()
  }

  /// Whether `symbol` was completed over the whole input starting at 0
  pub fn accepts(&self, symbol: &str) -> bool {
    match self.0.last() {
      Some(states) => states
        .iter()
        .any(|s| s.origin == 0 && !s.lr0.is_active() && s.lr0.rule.symbol_str() == symbol),
      None => false,
    }
  }
}

impl IntoIterator for Chart {
  type Item = (usize, Vec<State>);
  type IntoIter = std::iter::Enumerate<std::vec::IntoIter<Vec<State>>>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter().enumerate()
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for k in 0..self.len() {
      writeln!(f, "State {}:", k)?;
      for state in self.0[k].iter() {
        writeln!(f, "  {}..{}: {}", state.origin, k, state.lr0)?;
      }
    }
    Ok(())
  }
}

/// Runs the Earley recognizer over `input`. Rules never have empty
/// right-hand sides, so no nullable handling is needed.
pub fn parse_chart(g: &Grammar, input: &[&str]) -> Chart {
  let mut chart = Chart::new(input.len() + 1);

  for rule in g.rules_for(g.start()) {
    chart.add(0, State::new(LR0::new(rule), 0));
  }

  for k in 0..chart.len() {
    // need to use while loop because the number of states at k can expand during the loop
    let mut idx = 0;
    while idx < chart.len_at(k) {
      let state = chart.get_state(k, idx);
      idx += 1;

      match state.lr0.next_production() {
        None => completer(&mut chart, k, &state),
        Some(Production::Nonterminal(_)) => predictor(g, &mut chart, k, &state),
        Some(Production::Terminal(_)) => scanner(&mut chart, k, &state, input),
      };
    }
    trace!(k, states = chart.len_at(k), "chart position done");
  }

  chart
}

fn completer(chart: &mut Chart, k: usize, state: &State) {
  assert!(!state.lr0.is_active(), "tried to complete active state");

  // lr0 has been completed, now look for states in the chart that are waiting for its symbol
  for idx in 0..chart.len_at(state.origin) {
    let other = chart.get_state(state.origin, idx);

    if let Some(Production::Nonterminal(wanted)) = other.lr0.next_production() {
      if wanted.name == state.lr0.rule.symbol_str() {
        // found one, advance its dot and add the new state to the chart *at k*,
        // because it's now waiting on a token there
        chart.add(k, other.advance())
      }
    }
  }
}

fn predictor(g: &Grammar, chart: &mut Chart, k: usize, state: &State) {
  assert!(state.lr0.is_active(), "tried to predict non-active state");

  // this lr0 is waiting for the next production
  // let's hypothesize that one of the rules that can build this production will
  // succeed at its current position
  let Some(Production::Nonterminal(needed)) = state.lr0.next_production() else {
    panic!("tried to predict a terminal");
  };
  let rules = g.rules_for(&needed.name);
  if rules.is_empty() {
    trace!(symbol = %needed, "no rules to predict");
  }
  for wanted_rule in rules {
    chart.add(k, State::new(LR0::new(wanted_rule), k));
  }
}

fn scanner(chart: &mut Chart, k: usize, state: &State, input: &[&str]) {
  assert!(state.lr0.is_active(), "tried to scan non-active state");

  let Some(Production::Terminal(needed)) = state.lr0.next_production() else {
    panic!("tried to scan a nonterminal");
  };
  if k < input.len() && input[k] == needed.as_str() {
    // advance the state to consume this token, and add to state k + 1, where
    // it will look for the next token
    chart.add(k + 1, state.advance());
  }
}
