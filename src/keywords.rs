//! Keyword frequency summary of an answer.
//!
//! Tokens are whatever sits between runs of whitespace, lowercased. Punctuation
//! stays attached, so `"range."` and `"range"` count separately.

use std::collections::HashMap;

/// How often one lowercase token occurs in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFrequency {
    pub keyword: String,
    pub count: usize,
}

/// Counts the whitespace-delimited, lowercased tokens of `text`.
///
/// The result is sorted by count, highest first. Keywords with equal counts keep
/// the order in which they first appear in `text`.
///
/// # Examples
///
/// ```
/// use evsearch::keywords::summarize;
///
/// let summary = summarize("Cat dog cat");
/// assert_eq!(summary[0].keyword, "cat");
/// assert_eq!(summary[0].count, 2);
/// assert!(summarize("").is_empty());
/// ```
pub fn summarize(text: &str) -> Vec<KeywordFrequency> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut frequencies: Vec<KeywordFrequency> = Vec::new();

    for token in text.split_whitespace() {
        let keyword = token.to_lowercase();
        match positions.get(&keyword) {
            Some(&i) => frequencies[i].count += 1,
            None => {
                positions.insert(keyword.clone(), frequencies.len());
                frequencies.push(KeywordFrequency { keyword, count: 1 });
            }
        }
    }

    // stable: ties stay in first-seen order
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies
}
