use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    content::ContentStore,
    matching,
    reasoning::{MatchOutcome, ReasoningStrategy, TemplateReasoner},
    tokenize::tokenize,
};

/// Minimum pair-level relevance required to accept a match.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Terminal outcome of one query.
///
/// `NoAnswer` is a valid result ("no sufficiently relevant FAQ found"), not a
/// failure; `Error` is reserved for malformed input and infrastructure
/// problems, never for low relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Success,
    NoAnswer,
    Error,
}

impl AnswerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Success => "success",
            AnswerStatus::NoAnswer => "no_answer",
            AnswerStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured result of one query. Immutable once constructed; `score`
/// is always populated, even for `no_answer` and `error`, so analytics can
/// see how close a rejected query came.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub status: AnswerStatus,
    pub answer: Option<String>,
    pub source_file: Option<String>,
    pub score: f64,
    pub reasoning: String,
    pub processing_time_ms: f64,
}

impl AnswerResult {
    fn error(reasoning: impl Into<String>, started: Instant) -> Self {
        Self {
            status: AnswerStatus::Error,
            answer: None,
            source_file: None,
            score: 0.0,
            reasoning: reasoning.into(),
            processing_time_ms: elapsed_ms(started),
        }
    }

    /// The per-query analytics record for this result.
    pub fn record(&self, query: &str) -> InteractionRecord {
        InteractionRecord {
            query_text: query.to_string(),
            status: self.status,
            source_file: self.source_file.clone(),
            reasoning: self.reasoning.clone(),
            processing_time_ms: self.processing_time_ms,
        }
    }
}

/// One logged interaction, as persisted by the analytics store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub query_text: String,
    pub status: AnswerStatus,
    pub source_file: Option<String>,
    pub reasoning: String,
    pub processing_time_ms: f64,
}

/// Runs the full pipeline: tokenize, select file, select pair, threshold
/// decision, reasoning trace.
///
/// All per-query state is local and the snapshot is captured once at the
/// start, so the engine is safe to call concurrently and a reload racing a
/// query cannot mix two knowledge base versions into one answer.
pub struct AnswerEngine {
    store: Arc<ContentStore>,
    threshold: f64,
    reasoner: Box<dyn ReasoningStrategy>,
}

impl AnswerEngine {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self::with_threshold(store, DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(store: Arc<ContentStore>, threshold: f64) -> Self {
        Self {
            store,
            threshold,
            reasoner: Box::new(TemplateReasoner),
        }
    }

    /// Swap in a different narrator (e.g. a model-backed one) behind the same
    /// contract.
    pub fn with_reasoner(mut self, reasoner: Box<dyn ReasoningStrategy>) -> Self {
        self.reasoner = reasoner;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Answer a single query. Never panics and never returns `Err`: every
    /// failure mode is folded into the result's status.
    pub fn answer(&self, query: &str) -> AnswerResult {
        let started = Instant::now();

        if query.trim().is_empty() {
            return AnswerResult::error("query must not be empty", started);
        }

        let query_tokens = tokenize(query);
        // Capture once; this query is pinned to this snapshot even if a
        // reload lands mid-flight.
        let snapshot = self.store.snapshot();

        let Some(file_match) = matching::select_file(&query_tokens, &snapshot) else {
            // open() and reload() reject empty snapshots, so this is
            // unreachable in practice.
            return AnswerResult::error("knowledge base has no content", started);
        };

        let pair = matching::select_pair(&query_tokens, file_match.file);
        let accepted = pair.score >= self.threshold;

        let reasoning = self.reasoner.explain(&MatchOutcome {
            filename: &file_match.file.filename,
            file_score: file_match.score,
            pair_score: pair.score,
            threshold: self.threshold,
            accepted,
        });

        match pair.entry {
            Some(entry) if accepted => AnswerResult {
                status: AnswerStatus::Success,
                answer: Some(entry.answer.clone()),
                source_file: Some(file_match.file.filename.clone()),
                score: pair.score,
                reasoning,
                processing_time_ms: elapsed_ms(started),
            },
            _ => AnswerResult {
                status: AnswerStatus::NoAnswer,
                answer: None,
                source_file: None,
                score: pair.score,
                reasoning,
                processing_time_ms: elapsed_ms(started),
            },
        }
    }
}

impl std::fmt::Debug for AnswerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerEngine")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
