//! Noun phrase chunking over parse trees.
//!
//! A chunk is a branch labeled with the noun phrase symbol that has no other
//! noun phrase branch anywhere beneath it.

use std::fmt;

use crate::syntree::{ParseTree, SynTree};

/// The conventional noun phrase label
pub const NP: &str = "NP";

/// Returns the minimal `label` subtrees of `tree`, in pre-order.
///
/// The returned references point into `tree`, and each node appears once.
/// Two chunks may cover the same words ("the door" twice in one sentence)
/// and still be distinct, so duplicates are judged by node identity.
pub fn np_chunks<'t>(tree: &'t ParseTree, label: &str) -> Vec<&'t ParseTree> {
  let mut chunks: Vec<&ParseTree> = Vec::new();
  for sub in tree.subtrees() {
    if is_chunk(sub, label) && !chunks.iter().any(|c| std::ptr::eq(*c, sub)) {
      chunks.push(sub);
    }
  }
  chunks
}

fn is_chunk(tree: &ParseTree, label: &str) -> bool {
  match tree {
    SynTree::Branch(cons, _) if cons.value.name == label => {
      !tree.has_descendant(|sym| sym.name == label)
    }
    _ => false,
  }
}

/// A chunk's words joined by single spaces
pub fn chunk_text(chunk: &ParseTree) -> String {
  chunk
    .words()
    .into_iter()
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(" ")
}

/// Displays a tree's chunks one per line
pub struct ChunkList<'t>(pub Vec<&'t ParseTree>);

impl fmt::Display for ChunkList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for chunk in self.0.iter() {
      writeln!(f, "{}", chunk_text(chunk))?;
    }
    Ok(())
  }
}
