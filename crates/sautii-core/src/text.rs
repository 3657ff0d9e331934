use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use unicode_segmentation::UnicodeSegmentation;

/// Case and diacritic folding: NFD, drop combining marks, lowercase.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Parsed free-text query.
///
/// Quoted phrases must all appear. Bare terms match if any one appears,
/// and are only consulted when there is no phrase. `-term` excludes, and a
/// query of exclusions alone matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuery {
    pub terms: Vec<String>,
    pub phrases: Vec<String>,
    pub negated: Vec<String>,
}

impl TextQuery {
    /// Returns `None` when the input carries nothing searchable.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut q = TextQuery::default();
        let mut rest = raw;
        while let Some(open) = rest.find('"') {
            q.push_bare(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('"') {
                Some(close) => {
                    let phrase = fold(after[..close].trim());
                    if !phrase.is_empty() {
                        q.phrases.push(phrase);
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    // unbalanced quote: treat the tail as bare words
                    rest = after;
                    break;
                }
            }
        }
        q.push_bare(rest);
        if q.terms.is_empty() && q.phrases.is_empty() && q.negated.is_empty() {
            None
        } else {
            Some(q)
        }
    }

    fn push_bare(&mut self, chunk: &str) {
        for token in chunk.split_whitespace() {
            let (target, body) = match token.strip_prefix('-') {
                Some(body) if !body.is_empty() => (&mut self.negated, body),
                _ => (&mut self.terms, token),
            };
            for word in body.unicode_words() {
                let word = fold(word);
                if !target.contains(&word) {
                    target.push(word);
                }
            }
        }
    }

    /// Evaluates the query against already folded text.
    pub fn matches_folded(&self, haystack: &str) -> bool {
        if self.negated.iter().any(|n| haystack.contains(n.as_str())) {
            return false;
        }
        if !self.phrases.is_empty() {
            return self.phrases.iter().all(|p| haystack.contains(p.as_str()));
        }
        self.terms.iter().any(|t| haystack.contains(t.as_str()))
    }

    pub fn matches(&self, title: &str, description: &str) -> bool {
        let haystack = fold(&format!("{title}\n{description}"));
        self.matches_folded(&haystack)
    }
}
