use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use npchunk::chunk::ChunkList;
use npchunk::{np_chunks, preprocess, Err, Grammar, GrammarError, ParseOptions};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
  /// File containing the sentence (default: read one line from stdin)
  file: Option<PathBuf>,

  /// Grammar file to use instead of the bundled one
  #[arg(short, long, value_name = "FILE")]
  grammar: Option<PathBuf>,

  /// Start symbol (default: the first rule's symbol)
  #[arg(short, long, value_name = "SYMBOL")]
  start: Option<String>,

  /// Label that marks noun phrases
  #[arg(long, value_name = "LABEL", default_value = "NP")]
  np_label: String,

  /// Print the parse chart
  #[arg(short, long)]
  chart: bool,

  /// Keep reading sentences until end of input
  #[arg(short, long)]
  repl: bool,

  /// Give up after building this many trees [default: 100000]
  #[arg(long, value_name = "N", conflicts_with = "no_limit")]
  max_trees: Option<usize>,

  /// Build every tree, however many there are
  #[arg(long)]
  no_limit: bool,

  /// Give up after this many milliseconds
  #[arg(long, value_name = "MS")]
  timeout_ms: Option<u64>,
}

impl Cli {
  fn options(&self) -> ParseOptions {
    let options = match (self.no_limit, self.max_trees) {
      (true, _) => ParseOptions::unlimited(),
      (false, Some(max)) => ParseOptions::default().with_max_trees(max),
      (false, None) => ParseOptions::default(),
    };
    match self.timeout_ms {
      Some(ms) => options.with_timeout(Duration::from_millis(ms)),
      None => options,
    }
  }

  fn load_grammar(&self) -> Result<Grammar, GrammarError> {
    match (&self.grammar, &self.start) {
      (Some(path), Some(start)) => Grammar::read_from_file_with_start(path, start),
      (Some(path), None) => Grammar::read_from_file(path),
      (None, Some(start)) => Grammar::from_str_with_start(npchunk::DEFAULT_GRAMMAR, start),
      (None, None) => npchunk::default_grammar(),
    }
  }
}

/// Parses one sentence and prints its trees and chunks. Unknown words and
/// sentences without a parse are reported, not treated as failures.
fn report(g: &Grammar, sentence: &str, cli: &Cli, options: &ParseOptions) {
  let words = preprocess(sentence);
  let words = words.iter().map(String::as_str).collect::<Vec<_>>();
  debug!(?words, "preprocessed");

  if cli.chart {
    println!("chart:\n{}", g.parse_chart(&words));
  }

  let trees = match g.parse_with(&words, options) {
    Ok(trees) => trees,
    Err(err) => {
      println!("{}", err);
      return;
    }
  };

  if trees.is_empty() {
    println!("Could not parse sentence.");
    return;
  }

  info!(trees = trees.len(), "parsed sentence");
  for tree in trees.iter() {
    println!("{}", tree);
    println!();
    println!("Noun Phrase Chunks");
    print!("{}", ChunkList(np_chunks(tree, &cli.np_label)));
    println!();
  }
}

fn read_sentence() -> io::Result<Option<String>> {
  print!("Sentence: ");
  io::stdout().flush()?;

  let mut input = String::new();
  if io::stdin().read_line(&mut input)? == 0 {
    // ctrl+d
    return Ok(None);
  }
  Ok(Some(input))
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let g = match cli.load_grammar() {
    Ok(g) => g,
    Err(err) => {
      eprintln!("grammar error: {}", err);
      process::exit(1);
    }
  };
  let options = cli.options();

  if let Some(path) = &cli.file {
    let sentence = fs::read_to_string(path)?;
    report(&g, &sentence, &cli, &options);
    return Ok(());
  }

  while let Some(sentence) = read_sentence()? {
    report(&g, &sentence, &cli, &options);
    if !cli.repl {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("npchunk").chain(args.iter().copied()))
  }

  #[test]
  fn test_tree_cap_flags() {
    assert_eq!(cli(&[]).options(), ParseOptions::default());
    assert_eq!(
      cli(&["--max-trees", "10"]).options(),
      ParseOptions::default().with_max_trees(10)
    );
    assert_eq!(cli(&["--no-limit"]).options(), ParseOptions::unlimited());
    assert_eq!(
      cli(&["--no-limit", "--timeout-ms", "5"]).options(),
      ParseOptions::unlimited().with_timeout(Duration::from_millis(5))
    );
    assert!(Cli::try_parse_from(["npchunk", "--no-limit", "--max-trees", "10"]).is_err());
  }

  #[test]
  fn test_load_grammar() {
    let bundled = concat!(env!("CARGO_MANIFEST_DIR"), "/../grammars/sentences.cfg");

    let g = cli(&[]).load_grammar().unwrap();
    assert_eq!(g.start(), "S");

    let g = cli(&["--grammar", bundled]).load_grammar().unwrap();
    assert_eq!(g.start(), "S");
    assert!(g.has_word("holmes"));

    let g = cli(&["--grammar", bundled, "--start", "NP"]).load_grammar().unwrap();
    assert_eq!(g.start(), "NP");

    assert!(matches!(
      cli(&["--grammar", "no/such/grammar.cfg"]).load_grammar(),
      Err(GrammarError::Io(_))
    ));
  }
}
