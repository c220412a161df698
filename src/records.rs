// 🗄️ Dataset Records - CSV record source and verdict sink
//
// Dataset exports arrive as one CSV row per example with the raw
// inputs/outputs JSON embedded as strings. A row that fails to evaluate
// still produces a verdict row (score 0) so one bad record never aborts
// the batch.

use crate::scoring::{EvaluationReport, TruthfulnessEngine, Verdict};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

// ============================================================================
// DATASET RECORD
// ============================================================================

/// One exported dataset row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,

    #[serde(default)]
    pub created_at: String,

    pub inputs_json: String,
    pub outputs_json: String,
}

impl DatasetRecord {
    pub fn inputs(&self) -> Result<Value> {
        serde_json::from_str(&self.inputs_json)
            .with_context(|| format!("record {}: malformed inputs_json", self.id))
    }

    pub fn outputs(&self) -> Result<Value> {
        serde_json::from_str(&self.outputs_json)
            .with_context(|| format!("record {}: malformed outputs_json", self.id))
    }
}

/// Load a dataset CSV into memory.
pub fn load_dataset_csv(csv_path: &Path) -> Result<Vec<DatasetRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open dataset CSV")?;

    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let record: DatasetRecord = result.context("Failed to deserialize dataset record")?;
        records.push(record);
    }

    debug!(count = records.len(), "dataset loaded");
    Ok(records)
}

// ============================================================================
// VERDICT ROWS
// ============================================================================

/// Simple per-record score row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    pub id: String,
    pub truthfulness: Verdict,
}

/// Detailed per-record verdict row, flattened for CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRow {
    pub id: String,
    pub truthfulness: Verdict,
    pub format_detected: String,
    pub has_delimiters: bool,
    pub ground_truth_count: usize,
    pub output_reference_count: usize,
    pub valid_reference_count: usize,
    pub invalid_reference_count: usize,
    pub unreferenced_ticket_count: usize,
    pub accuracy_rate: f64,

    /// Semicolon-joined, capped like the report itself.
    pub invalid_references: String,

    /// Empty when the record evaluated cleanly.
    pub error: String,
}

impl VerdictRow {
    pub fn from_report(id: &str, report: &EvaluationReport) -> Self {
        VerdictRow {
            id: id.to_string(),
            truthfulness: report.truthfulness,
            format_detected: report.format_detected.as_str().to_string(),
            has_delimiters: report.has_delimiters,
            ground_truth_count: report.ground_truth_count,
            output_reference_count: report.output_reference_count,
            valid_reference_count: report.valid_reference_count,
            invalid_reference_count: report.invalid_reference_count,
            unreferenced_ticket_count: report.unreferenced_ticket_count,
            accuracy_rate: report.accuracy_rate,
            invalid_references: report
                .invalid_references
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            error: report.error.clone().unwrap_or_default(),
        }
    }
}

// ============================================================================
// BATCH REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub record_count: usize,
    pub truthful_count: usize,
    pub untruthful_count: usize,
    pub error_count: usize,
    pub scored_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        format!(
            "Scored {} records: {} truthful, {} untruthful ({} failed to evaluate)",
            self.record_count, self.truthful_count, self.untruthful_count, self.error_count
        )
    }
}

// ============================================================================
// BATCH SCORING
// ============================================================================

/// Score every record with the simple (binary) evaluator.
pub fn score_dataset_simple(
    engine: &TruthfulnessEngine,
    records: &[DatasetRecord],
) -> (Vec<ScoreRow>, BatchReport) {
    let mut rows = Vec::with_capacity(records.len());
    let mut error_count = 0;

    for record in records {
        let truthfulness = match (record.inputs(), record.outputs()) {
            (Ok(inputs), Ok(outputs)) => engine.evaluate(&inputs, &outputs),
            (Err(_), _) | (_, Err(_)) => {
                error_count += 1;
                Verdict::Untruthful
            }
        };

        rows.push(ScoreRow {
            id: record.id.clone(),
            truthfulness,
        });
    }

    let report = batch_report(
        rows.iter().map(|r| r.truthfulness),
        records.len(),
        error_count,
    );
    (rows, report)
}

/// Score every record with the detailed evaluator.
pub fn score_dataset(
    engine: &TruthfulnessEngine,
    records: &[DatasetRecord],
) -> (Vec<VerdictRow>, BatchReport) {
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let report = match (record.inputs(), record.outputs()) {
            (Ok(inputs), Ok(outputs)) => engine.evaluate_detailed(&inputs, &outputs),
            (Err(err), _) | (_, Err(err)) => EvaluationReport::from_error(err.to_string()),
        };

        rows.push(VerdictRow::from_report(&record.id, &report));
    }

    let error_count = rows.iter().filter(|r| !r.error.is_empty()).count();
    let report = batch_report(
        rows.iter().map(|r| r.truthfulness),
        records.len(),
        error_count,
    );
    (rows, report)
}

fn batch_report(
    verdicts: impl Iterator<Item = Verdict>,
    record_count: usize,
    error_count: usize,
) -> BatchReport {
    let truthful_count = verdicts.filter(Verdict::is_truthful).count();

    BatchReport {
        record_count,
        truthful_count,
        untruthful_count: record_count - truthful_count,
        error_count,
        scored_at: Utc::now(),
    }
}

// ============================================================================
// EXPORT
// ============================================================================

pub fn export_scores_csv(csv_path: &Path, rows: &[ScoreRow]) -> Result<()> {
    write_csv(csv_path, rows)
}

pub fn export_verdicts_csv(csv_path: &Path, rows: &[VerdictRow]) -> Result<()> {
    write_csv(csv_path, rows)
}

fn write_csv<T: Serialize>(csv_path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(csv_path).context("Failed to create verdict CSV")?;

    for row in rows {
        wtr.serialize(row).context("Failed to serialize verdict row")?;
    }

    wtr.flush().context("Failed to flush verdict CSV")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
