use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;

use crate::{
    engine::{AnswerStatus, InteractionRecord},
    error::Result,
};

const INTERACTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("interactions");
// filename -> (total queries, successful queries)
const FILE_STATS: TableDefinition<&str, (u64, u64)> = TableDefinition::new("file_stats");

/// Per-file answer statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub filename: String,
    pub total_queries: u64,
    pub successful_queries: u64,
}

/// Aggregate view over all logged interactions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_interactions: u64,
    pub successful: u64,
    pub no_answer: u64,
    pub errors: u64,
    /// Percentage of interactions that produced an answer.
    pub success_rate: f64,
}

/// Append-only interaction log backed by redb.
///
/// Records are stored as JSON payloads keyed by a monotonically increasing
/// sequence number; per-file hit counters are kept in a separate table and
/// updated in the same transaction as the record itself.
pub struct AnalyticsDb {
    db: Database,
}

impl AnalyticsDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(INTERACTIONS)?;
        txn.open_table(FILE_STATS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Append one interaction and bump the source file's counters.
    /// Returns the record's sequence number.
    pub fn log_interaction(&self, record: &InteractionRecord) -> Result<u64> {
        let payload = serde_json::to_vec(record)?;

        let txn = self.db.begin_write()?;
        let id = {
            let mut table = txn.open_table(INTERACTIONS)?;
            let id = table.last()?.map(|(k, _)| k.value() + 1).unwrap_or(0);
            table.insert(id, payload.as_slice())?;

            if let Some(file) = record.source_file.as_deref() {
                let mut stats = txn.open_table(FILE_STATS)?;
                let (total, success) = stats.get(file)?.map(|v| v.value()).unwrap_or((0, 0));
                let success = if record.status == AnswerStatus::Success {
                    success + 1
                } else {
                    success
                };
                stats.insert(file, (total + 1, success))?;
            }

            id
        };
        txn.commit()?;

        Ok(id)
    }

    pub fn record_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INTERACTIONS)?;
        Ok(table.len()?)
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INTERACTIONS)?;

        let mut records = Vec::new();
        for entry in table.iter()?.rev().take(limit) {
            let (_, payload) = entry?;
            records.push(serde_json::from_slice(payload.value())?);
        }
        Ok(records)
    }

    pub fn file_stats(&self) -> Result<Vec<FileStat>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(FILE_STATS)?;

        let mut stats = Vec::new();
        for entry in table.iter()? {
            let (filename, counters) = entry?;
            let (total_queries, successful_queries) = counters.value();
            stats.push(FileStat {
                filename: filename.value().to_string(),
                total_queries,
                successful_queries,
            });
        }
        Ok(stats)
    }

    pub fn summary(&self) -> Result<AnalyticsSummary> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INTERACTIONS)?;

        let mut summary = AnalyticsSummary {
            total_interactions: 0,
            successful: 0,
            no_answer: 0,
            errors: 0,
            success_rate: 0.0,
        };

        for entry in table.iter()? {
            let (_, payload) = entry?;
            let record: InteractionRecord = serde_json::from_slice(payload.value())?;
            summary.total_interactions += 1;
            match record.status {
                AnswerStatus::Success => summary.successful += 1,
                AnswerStatus::NoAnswer => summary.no_answer += 1,
                AnswerStatus::Error => summary.errors += 1,
            }
        }

        if summary.total_interactions > 0 {
            summary.success_rate =
                summary.successful as f64 / summary.total_interactions as f64 * 100.0;
        }
        Ok(summary)
    }
}

impl std::fmt::Debug for AnalyticsDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsDb").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, AnalyticsDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = AnalyticsDb::open(&tmp.path().join("analytics.redb")).unwrap();
        (tmp, db)
    }

    fn record(status: AnswerStatus, source_file: Option<&str>) -> InteractionRecord {
        InteractionRecord {
            query_text: "what payment methods?".to_string(),
            status,
            source_file: source_file.map(str::to_string),
            reasoning: "trace".to_string(),
            processing_time_ms: 0.42,
        }
    }

    #[test]
    fn log_assigns_sequential_ids() {
        let (_tmp, db) = test_db();

        let a = db
            .log_interaction(&record(AnswerStatus::Success, Some("billing.txt")))
            .unwrap();
        let b = db
            .log_interaction(&record(AnswerStatus::NoAnswer, None))
            .unwrap();

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(db.record_count().unwrap(), 2);
    }

    #[test]
    fn recent_returns_newest_first() {
        let (_tmp, db) = test_db();

        for i in 0..5 {
            let mut r = record(AnswerStatus::Success, Some("billing.txt"));
            r.query_text = format!("query {i}");
            db.log_interaction(&r).unwrap();
        }

        let recent = db.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query_text, "query 4");
        assert_eq!(recent[1].query_text, "query 3");
    }

    #[test]
    fn file_stats_track_totals_and_successes() {
        let (_tmp, db) = test_db();

        db.log_interaction(&record(AnswerStatus::Success, Some("billing.txt")))
            .unwrap();
        db.log_interaction(&record(AnswerStatus::Success, Some("billing.txt")))
            .unwrap();
        // no_answer has no source file and must not touch the stats table
        db.log_interaction(&record(AnswerStatus::NoAnswer, None))
            .unwrap();

        let stats = db.file_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].filename, "billing.txt");
        assert_eq!(stats[0].total_queries, 2);
        assert_eq!(stats[0].successful_queries, 2);
    }

    #[test]
    fn summary_counts_statuses() {
        let (_tmp, db) = test_db();

        db.log_interaction(&record(AnswerStatus::Success, Some("billing.txt")))
            .unwrap();
        db.log_interaction(&record(AnswerStatus::NoAnswer, None))
            .unwrap();
        db.log_interaction(&record(AnswerStatus::NoAnswer, None))
            .unwrap();
        db.log_interaction(&record(AnswerStatus::Error, None))
            .unwrap();

        let summary = db.summary().unwrap();
        assert_eq!(summary.total_interactions, 4);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.no_answer, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.success_rate, 25.0);
    }

    #[test]
    fn empty_db_summary_is_zeroed() {
        let (_tmp, db) = test_db();
        let summary = db.summary().unwrap();
        assert_eq!(summary.total_interactions, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn reopen_preserves_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("analytics.redb");

        {
            let db = AnalyticsDb::open(&path).unwrap();
            db.log_interaction(&record(AnswerStatus::Success, Some("billing.txt")))
                .unwrap();
        }

        {
            let db = AnalyticsDb::open(&path).unwrap();
            assert_eq!(db.record_count().unwrap(), 1);
            let recent = db.recent(10).unwrap();
            assert_eq!(recent[0].source_file.as_deref(), Some("billing.txt"));
        }
    }
}
