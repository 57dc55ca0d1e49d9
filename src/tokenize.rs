use std::collections::BTreeSet;

/// Tokens shorter than this are dropped during normalization.
pub const MIN_TOKEN_LEN: usize = 3;

/// Words that carry no matching signal: articles, pronouns, auxiliaries,
/// question words, and a handful of common prepositions. Two-letter words
/// ("is", "to", "do", ...) are already excluded by `MIN_TOKEN_LEN`.
const STOPWORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "been", "being", "has", "have", "had",
    "having", "does", "did", "doing", "will", "would", "can", "could", "shall",
    "should", "may", "might", "must", "you", "your", "yours", "she", "her",
    "hers", "him", "his", "its", "they", "them", "their", "theirs", "our",
    "ours", "this", "that", "these", "those", "there", "here", "what", "when",
    "where", "which", "who", "whom", "whose", "why", "how", "not", "but",
    "for", "with", "from", "into", "onto", "about", "all", "any", "some",
    "such", "than", "then", "too", "very", "just",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Normalize raw text into a comparable token set.
///
/// Lowercases, splits on any non-alphanumeric character, and drops tokens
/// shorter than [`MIN_TOKEN_LEN`] as well as stopwords. Pure: the same input
/// always yields the same set.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter_map(|raw| {
            let token = raw.to_lowercase();
            if token.len() < MIN_TOKEN_LEN {
                return None;
            }
            if is_stopword(&token) {
                return None;
            }
            Some(token)
        })
        .collect()
}
