use std::collections::BTreeSet;

use crate::{
    content::{ContentSnapshot, FaqFile, QaEntry},
    scoring::relevance,
};

/// The best-matching file for a query, with its file-level score.
#[derive(Debug)]
pub struct FileMatch<'a> {
    pub file: &'a FaqFile,
    pub score: f64,
}

/// The best-matching entry within a file, with its pair-level score.
#[derive(Debug)]
pub struct PairMatch<'a> {
    pub entry: Option<&'a QaEntry>,
    pub score: f64,
}

/// Score the query against every file's token union and pick the maximum.
///
/// Ties go to the first file in snapshot order, and a snapshot where every
/// file scores zero still yields the first file with score 0.0; whether that
/// is good enough is the decision engine's call, not this one's. Returns
/// `None` only for a snapshot with no files at all.
pub fn select_file<'a>(
    query: &BTreeSet<String>,
    snapshot: &'a ContentSnapshot,
) -> Option<FileMatch<'a>> {
    let mut best: Option<FileMatch<'a>> = None;

    for file in &snapshot.files {
        let score = relevance(query, &file.token_union);
        // Strict comparison keeps the earliest file on ties.
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(FileMatch { file, score });
        }
    }

    best
}

/// Score the query against each entry of the selected file and pick the
/// maximum. Ties go to the first entry in file order; a file with no entries
/// yields `(None, 0.0)`.
pub fn select_pair<'a>(query: &BTreeSet<String>, file: &'a FaqFile) -> PairMatch<'a> {
    let mut best = PairMatch {
        entry: None,
        score: 0.0,
    };

    for entry in &file.entries {
        let score = relevance(query, &entry.tokens);
        if best.entry.is_none() || score > best.score {
            best = PairMatch {
                entry: Some(entry),
                score,
            };
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    fn file(name: &str, pairs: &[(&str, &str)]) -> FaqFile {
        let raw = pairs
            .iter()
            .map(|(q, a)| format!("Q: {q}\nA: {a}\n"))
            .collect::<String>();
        let entries = pairs
            .iter()
            .map(|(q, a)| {
                let mut tokens = tokenize(q);
                tokens.extend(tokenize(a));
                QaEntry {
                    question: q.to_string(),
                    answer: a.to_string(),
                    tokens,
                }
            })
            .collect();
        FaqFile::new(name.to_string(), raw, entries)
    }

    fn snapshot(files: Vec<FaqFile>) -> ContentSnapshot {
        ContentSnapshot { files }
    }

    #[test]
    fn picks_highest_scoring_file() {
        let snap = snapshot(vec![
            file("billing.txt", &[("payment methods?", "cards and paypal")]),
            file("shipping.txt", &[("shipping time?", "five business days")]),
        ]);
        let query = tokenize("shipping time estimate");

        let m = select_file(&query, &snap).unwrap();
        assert_eq!(m.file.filename, "shipping.txt");
        assert!(m.score > 0.0);
    }

    #[test]
    fn file_tie_break_is_first_in_order() {
        let snap = snapshot(vec![
            file("a.txt", &[("shared token question?", "shared")]),
            file("b.txt", &[("shared token question?", "shared")]),
        ]);
        let query = tokenize("shared token");

        let m = select_file(&query, &snap).unwrap();
        assert_eq!(m.file.filename, "a.txt");
    }

    #[test]
    fn all_zero_scores_still_returns_first_file() {
        let snap = snapshot(vec![
            file("a.txt", &[("payment?", "cards")]),
            file("b.txt", &[("shipping?", "days")]),
        ]);
        let query = tokenize("quantum physics");

        let m = select_file(&query, &snap).unwrap();
        assert_eq!(m.file.filename, "a.txt");
        assert_eq!(m.score, 0.0);
    }

    #[test]
    fn empty_snapshot_returns_none() {
        let query = tokenize("anything");
        assert!(select_file(&query, &snapshot(vec![])).is_none());
    }

    #[test]
    fn picks_highest_scoring_entry() {
        let f = file(
            "billing.txt",
            &[
                ("payment methods?", "cards and paypal"),
                ("cancel subscription?", "account settings cancel"),
            ],
        );
        let query = tokenize("cancel my subscription");

        let m = select_pair(&query, &f);
        assert_eq!(m.entry.unwrap().question, "cancel subscription?");
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn entry_tie_break_is_first_in_order() {
        let f = file(
            "misc.txt",
            &[("duplicate token?", "token"), ("duplicate token also?", "token")],
        );
        let query = tokenize("token");

        let m = select_pair(&query, &f);
        assert_eq!(m.entry.unwrap().question, "duplicate token?");
    }

    #[test]
    fn empty_file_returns_none_entry() {
        let f = FaqFile::new("empty.txt".to_string(), String::new(), vec![]);
        let query = tokenize("anything");

        let m = select_pair(&query, &f);
        assert!(m.entry.is_none());
        assert_eq!(m.score, 0.0);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let snap = snapshot(vec![
            file("a.txt", &[("alpha beta?", "gamma")]),
            file("b.txt", &[("alpha delta?", "epsilon")]),
        ]);
        let query = tokenize("alpha");

        let first = select_file(&query, &snap).unwrap();
        let second = select_file(&query, &snap).unwrap();
        assert_eq!(first.file.filename, second.file.filename);
        assert_eq!(first.score, second.score);
    }
}
