use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    tokenize::tokenize,
};

/// One question/answer pair from a knowledge base file.
///
/// Immutable after load; `tokens` is derived once from the combined question
/// and answer text.
#[derive(Debug, Clone)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub tokens: BTreeSet<String>,
}

impl QaEntry {
    fn new(question: String, answer: String) -> Self {
        let mut tokens = tokenize(&question);
        tokens.extend(tokenize(&answer));
        Self {
            question,
            answer,
            tokens,
        }
    }
}

/// A parsed knowledge base file. Entries preserve source order; tie-breaks
/// during matching depend on it.
#[derive(Debug, Clone)]
pub struct FaqFile {
    pub filename: String,
    pub category: String,
    pub raw_text: String,
    pub entries: Vec<QaEntry>,
    /// Union of all entry token sets, used for file-level scoring.
    pub token_union: BTreeSet<String>,
}

impl FaqFile {
    pub fn new(filename: String, raw_text: String, entries: Vec<QaEntry>) -> Self {
        let category = category_from_filename(&filename);
        let token_union = entries
            .iter()
            .flat_map(|e| e.tokens.iter().cloned())
            .collect();
        Self {
            filename,
            category,
            raw_text,
            entries,
            token_union,
        }
    }
}

/// An immutable, fully-loaded view of all FAQ files at a point in time.
///
/// Files are held in sorted filename order so that iteration (and therefore
/// tie-breaking) is deterministic for a fixed directory state.
#[derive(Debug, Default)]
pub struct ContentSnapshot {
    pub files: Vec<FaqFile>,
}

impl ContentSnapshot {
    pub fn total_entries(&self) -> usize {
        self.files.iter().map(|f| f.entries.len()).sum()
    }

    pub fn file(&self, filename: &str) -> Option<&FaqFile> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// Result of a load or reload pass over the knowledge base directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub files_loaded: usize,
    /// Files that could not be read or yielded zero usable entries.
    pub files_failed: usize,
    pub qa_count: usize,
}

/// Owns the published [`ContentSnapshot`] and the directory it came from.
///
/// Readers capture the current snapshot once per query via [`snapshot`] and
/// keep using that `Arc` for the whole query; [`reload`] swaps the pointer
/// wholesale, so a reload racing an in-flight query can never expose partial
/// state.
///
/// [`snapshot`]: ContentStore::snapshot
/// [`reload`]: ContentStore::reload
pub struct ContentStore {
    directory: PathBuf,
    current: RwLock<Arc<ContentSnapshot>>,
}

impl ContentStore {
    /// Load the knowledge base and publish the initial snapshot.
    ///
    /// A missing directory or a directory with zero usable entries is fatal.
    pub fn open(directory: &Path) -> Result<Self> {
        if !directory.is_dir() {
            return Err(Error::KnowledgeBaseDir(directory.to_path_buf()));
        }

        let (snapshot, report) = load_snapshot(directory)?;
        info!(
            files = report.files_loaded,
            failed = report.files_failed,
            qa_pairs = report.qa_count,
            "loaded knowledge base from {}",
            directory.display()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The currently published snapshot. Callers hold the returned `Arc` for
    /// the duration of one query.
    pub fn snapshot(&self) -> Arc<ContentSnapshot> {
        // The stored Arc is only ever replaced wholesale, so even a poisoned
        // lock still holds a consistent snapshot.
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-parse the directory into a fresh snapshot and atomically replace
    /// the published one. A failed reload leaves the previous snapshot in
    /// effect.
    pub fn reload(&self) -> Result<LoadReport> {
        if !self.directory.is_dir() {
            return Err(Error::KnowledgeBaseDir(self.directory.clone()));
        }

        let (snapshot, report) = load_snapshot(&self.directory)?;
        let next = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }

        info!(
            files = report.files_loaded,
            failed = report.files_failed,
            qa_pairs = report.qa_count,
            "reloaded knowledge base"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// Scan `directory` for flat `.txt` files and parse them into a snapshot.
///
/// Unreadable files and files with zero usable entries are skipped with a
/// warning and counted in `files_failed`. Zero entries overall is an error.
fn load_snapshot(directory: &Path) -> Result<(ContentSnapshot, LoadReport)> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                return None;
            }
            if !entry.file_type().ok()?.is_file() {
                return None;
            }
            (path.extension().and_then(|e| e.to_str()) == Some("txt")).then_some(path)
        })
        .collect();
    paths.sort();

    // Read and parse in parallel; collect preserves input order.
    let parsed: Vec<Option<FaqFile>> = paths
        .par_iter()
        .map(|path| {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(file = %filename, error = %e, "skipping unreadable FAQ file");
                    return None;
                }
            };

            let entries = parse_qa_pairs(&raw, &filename);
            if entries.is_empty() {
                warn!(file = %filename, "skipping FAQ file with no usable Q&A pairs");
                return None;
            }

            Some(FaqFile::new(filename, raw, entries))
        })
        .collect();

    let total = parsed.len();
    let files: Vec<FaqFile> = parsed.into_iter().flatten().collect();
    let files_failed = total - files.len();
    let qa_count: usize = files.iter().map(|f| f.entries.len()).sum();

    if qa_count == 0 {
        return Err(Error::EmptyKnowledgeBase(directory.to_path_buf()));
    }

    let report = LoadReport {
        files_loaded: files.len(),
        files_failed,
        qa_count,
    };
    Ok((ContentSnapshot { files }, report))
}

/// Derive a category label from a filename: extension stripped, separators
/// turned into spaces, words title-cased ("billing_payments.txt" -> "Billing
/// Payments").
fn category_from_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(".txt").unwrap_or(filename);
    stem.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

enum Block {
    Preamble,
    Question,
    Answer,
}

/// Parse `Q:`/`A:` blocks out of a flat file.
///
/// A question runs from its `Q:` marker to the next `A:` marker; an answer
/// runs from its `A:` marker to the next `Q:` marker or end of file. Markers
/// are matched case-insensitively at line start. Malformed fragments (a
/// question with no answer, an answer with no question, or an empty question)
/// are skipped with a warning, never a fatal error.
fn parse_qa_pairs(raw: &str, filename: &str) -> Vec<QaEntry> {
    let mut entries = Vec::new();
    let mut question = String::new();
    let mut answer = String::new();
    let mut state = Block::Preamble;

    let mut flush =
        |question: &mut String, answer: &mut String, state: &Block, entries: &mut Vec<QaEntry>| {
            let q = clean_text(question);
            let a = clean_text(answer);
            question.clear();
            answer.clear();

            match state {
                Block::Preamble => {}
                Block::Question => {
                    warn!(file = %filename, "skipping question with no answer");
                }
                Block::Answer if q.is_empty() => {
                    warn!(file = %filename, "skipping entry with empty question");
                }
                Block::Answer if a.is_empty() => {
                    warn!(file = %filename, question = %q, "skipping entry with empty answer");
                }
                Block::Answer => entries.push(QaEntry::new(q, a)),
            }
        };

    for line in raw.lines() {
        let trimmed = line.trim();

        if let Some(rest) = strip_marker(trimmed, 'q') {
            flush(&mut question, &mut answer, &state, &mut entries);
            question.push_str(rest);
            state = Block::Question;
        } else if let Some(rest) = strip_marker(trimmed, 'a') {
            match state {
                Block::Preamble => {
                    warn!(file = %filename, "skipping answer with no question");
                }
                Block::Question => {
                    answer.push_str(rest);
                    state = Block::Answer;
                }
                // A second `A:` inside an answer block is continuation text.
                Block::Answer => {
                    answer.push(' ');
                    answer.push_str(rest);
                }
            }
        } else {
            match state {
                Block::Preamble => {}
                Block::Question => {
                    question.push(' ');
                    question.push_str(trimmed);
                }
                Block::Answer => {
                    answer.push(' ');
                    answer.push_str(trimmed);
                }
            }
        }
    }
    flush(&mut question, &mut answer, &state, &mut entries);

    entries
}

/// Match a `Q:`/`A:` marker (case-insensitive) at the start of a trimmed line
/// and return the text after it.
fn strip_marker(line: &str, marker: char) -> Option<&str> {
    let mut chars = line.chars();
    let first = chars.next()?;
    if first.to_ascii_lowercase() != marker || chars.next()? != ':' {
        return None;
    }
    Some(chars.as_str().trim_start())
}

/// Collapse runs of whitespace into single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
