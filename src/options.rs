use std::time::Duration;

/// Bounds on a single parse. Heavily ambiguous grammars can produce
/// combinatorially many trees, so by default the search gives up after
/// building `DEFAULT_MAX_TREES` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
  /// Most trees the search may build, intermediate constituents included
  pub max_trees: Option<usize>,
  /// Wall-clock bound on the search. The clock is checked before each
  /// constituent is derived and before each batch of trees is combined, so
  /// this is a soft bound: the batch in progress at the deadline finishes
  /// first.
  pub timeout: Option<Duration>,
}

pub const DEFAULT_MAX_TREES: usize = 100_000;

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      max_trees: Some(DEFAULT_MAX_TREES),
      timeout: None,
    }
  }
}

impl ParseOptions {
  /// No bounds at all
  pub fn unlimited() -> Self {
    Self {
      max_trees: None,
      timeout: None,
    }
  }

  pub fn with_max_trees(mut self, max_trees: usize) -> Self {
    self.max_trees = Some(max_trees);
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}
