use unicode_segmentation::UnicodeSegmentation;

/// Splits a sentence into the lowercase words the parser expects.
///
/// Words are found at Unicode word boundaries, so punctuation and whitespace
/// fall away. Anything without at least one alphabetic character (numbers,
/// stray symbols) is dropped too.
pub fn preprocess(sentence: &str) -> Vec<String> {
  sentence
    .unicode_words()
    .filter(|w| w.chars().any(char::is_alphabetic))
    .map(str::to_lowercase)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_preprocess() {
    assert_eq!(
      preprocess("Holmes sat in the red armchair."),
      vec!["holmes", "sat", "in", "the", "red", "armchair"]
    );
    assert_eq!(
      preprocess("  She  never came,   on 28 Thursday! "),
      vec!["she", "never", "came", "on", "thursday"]
    );
    assert_eq!(preprocess("route 66b"), vec!["route", "66b"]);
  }

  #[test]
  fn test_preprocess_nothing_left() {
    assert!(preprocess("").is_empty());
    assert!(preprocess("... 1984 !?").is_empty());
  }
}
