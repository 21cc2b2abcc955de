#[macro_use]
extern crate lazy_static;

pub mod chunk;
pub mod earley;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod options;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod tokenize;
pub mod utils;

use tracing::debug;

use crate::earley::{parse_chart, Chart};
use crate::forest::Forest;
pub use crate::chunk::{chunk_text, np_chunks, NP};
pub use crate::error::{GrammarError, Limit, ParseError};
pub use crate::grammar::Grammar;
pub use crate::options::ParseOptions;
pub use crate::rules::{Production, Rule, Symbol};
pub use crate::syntree::{ParseTree, SynTree};
pub use crate::tokenize::preprocess;
pub use crate::utils::Err;

/// Source of the bundled sentence grammar
pub const DEFAULT_GRAMMAR: &str = include_str!("../grammars/sentences.cfg");

/// The bundled sentence grammar, starting from `S`
pub fn default_grammar() -> Result<Grammar, GrammarError> {
  DEFAULT_GRAMMAR.parse()
}

impl Grammar {
  pub fn parse_chart(&self, input: &[&str]) -> Chart {
    parse_chart(self, input)
  }

  pub fn parse_forest(&self, input: &[&str]) -> Forest {
    Forest::from(self.parse_chart(input))
  }

  /// Every parse of `input` with the default `ParseOptions`
  pub fn parse(&self, input: &[&str]) -> Result<Vec<ParseTree>, ParseError> {
    self.parse_with(input, &ParseOptions::default())
  }

  /// Every tree for the start symbol whose leaves are exactly `input`.
  ///
  /// Fails if some word isn't covered by any terminal. Known words with no
  /// derivation, and empty input, give an empty list. Trees come back in a
  /// fixed order (rule order, then leftmost split first) and never share
  /// nodes with each other.
  pub fn parse_with(
    &self,
    input: &[&str],
    options: &ParseOptions,
  ) -> Result<Vec<ParseTree>, ParseError> {
    let missing = self.uncovered_words(input);
    if !missing.is_empty() {
      debug!(?missing, "input has words outside the grammar");
      return Err(ParseError::UnknownWords(missing));
    }
    if input.is_empty() {
      return Ok(Vec::new());
    }

    let forest = self.parse_forest(input);
    let trees = forest.trees(self, input, options)?;
    debug!(words = input.len(), trees = trees.len(), "parsed");
    Ok(trees)
  }

  /// Preprocesses a raw sentence and parses it
  pub fn parse_sentence(
    &self,
    sentence: &str,
    options: &ParseOptions,
  ) -> Result<Vec<ParseTree>, ParseError> {
    let words = preprocess(sentence);
    let words = words.iter().map(String::as_str).collect::<Vec<_>>();
    self.parse_with(&words, options)
  }
}
