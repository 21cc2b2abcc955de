use std::fmt;

use crate::rules::Symbol;

/// A labeled constituent covering the half-open token span `span.0..span.1`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// A syntax tree. Every node owns its children outright, so two trees never
/// share structure even where their derivations agree.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

/// What the parser produces: branches labeled by nonterminal, leaves holding
/// input words.
pub type ParseTree = SynTree<Symbol, String>;

impl<T, U> SynTree<T, U> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// The branch label. Leaves have none.
  pub fn label(&self) -> Option<&T> {
    self.get_branch().map(|(c, _)| &c.value)
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }

  pub fn children(&self) -> &[SynTree<T, U>] {
    match self {
      Self::Branch(_, children) => children,
      Self::Leaf(_) => &[],
    }
  }

  /// All branches of the tree in pre-order, starting with the tree itself
  pub fn subtrees(&self) -> Subtrees<'_, T, U> {
    Subtrees { stack: vec![self] }
  }

  /// Leaves, left to right
  pub fn leaves(&self) -> Vec<&Word<U>> {
    let mut leaves = Vec::new();
    self.collect_leaves(&mut leaves);
    leaves
  }

  fn collect_leaves<'t>(&'t self, into: &mut Vec<&'t Word<U>>) {
    match self {
      Self::Leaf(w) => into.push(w),
      Self::Branch(_, children) => {
        for child in children {
          child.collect_leaves(into);
        }
      }
    }
  }

  /// Leaf values, left to right
  pub fn words(&self) -> Vec<&U> {
    self.leaves().into_iter().map(|w| &w.value).collect()
  }

  /// Whether some branch strictly below this node satisfies `pred`
  pub fn has_descendant(&self, pred: impl Fn(&T) -> bool) -> bool {
    self
      .children()
      .iter()
      .any(|child| child.subtrees().any(|t| t.label().is_some_and(&pred)))
  }
}

/// Pre-order iterator over the branches of a tree
pub struct Subtrees<'t, T, U> {
  stack: Vec<&'t SynTree<T, U>>,
}

impl<'t, T, U> Iterator for Subtrees<'t, T, U> {
  type Item = &'t SynTree<T, U>;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(tree) = self.stack.pop() {
      if let SynTree::Branch(_, children) = tree {
        self.stack.extend(children.iter().rev());
        return Some(tree);
      }
    }
    None
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(w) => write!(f, "{}", w.value),
      Self::Branch(t, ts) => {
        write!(f, "({}", t.value)?;
        if ts.len() == 1 && ts[0].children().len() <= 1 {
          write!(f, " {})", ts[0])
        } else {
          for t in ts.iter() {
            // TODO: is there a nice way to do this that doesn't allocate a String?
            let fmt = format!("{}", t);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}
