// ⚖️ Truthfulness Engine - Reconcile output references against ground truth
//
// Scoring is deliberately asymmetric: referencing a ticket that does not
// exist fails the record, while never mentioning a real ticket does not.
// Historical calibration depends on this exact policy.

use crate::envelope::{extract_output_references, select_input_text, select_output_text};
use crate::feed::extract_ground_truth_tickets;
use crate::matcher::{TicketId, TicketMatcher};
use crate::section::extract_ticket_section;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

// ============================================================================
// VERDICT
// ============================================================================

/// Binary outcome of an evaluation. Serializes as 1 (truthful) or 0
/// (untruthful), the shape the downstream scoring pipeline expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Truthful,
    Untruthful,
}

impl Verdict {
    pub fn is_truthful(&self) -> bool {
        matches!(self, Verdict::Truthful)
    }

    pub fn score(&self) -> u8 {
        match self {
            Verdict::Truthful => 1,
            Verdict::Untruthful => 0,
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.score())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(Verdict::Truthful),
            0 => Ok(Verdict::Untruthful),
            other => Err(serde::de::Error::custom(format!(
                "verdict must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

/// Which extraction path produced the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedFormat {
    /// Sentinel markers were present; the structured path was attempted.
    Structured,
    /// No markers; plain matching over the whole input.
    Freeform,
    /// The pipeline failed before a format could be determined.
    Error,
}

impl DetectedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedFormat::Structured => "structured",
            DetectedFormat::Freeform => "freeform",
            DetectedFormat::Error => "error",
        }
    }
}

// ============================================================================
// EVALUATION REPORT
// ============================================================================

/// How many references to list per bucket in a report.
const REPORTED_REFERENCE_LIMIT: usize = 5;

/// Detailed verdict with reconciliation diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub truthfulness: Verdict,
    pub ground_truth_count: usize,
    pub output_reference_count: usize,
    pub valid_reference_count: usize,
    pub invalid_reference_count: usize,
    pub unreferenced_ticket_count: usize,
    pub accuracy_rate: f64,
    pub has_delimiters: bool,
    pub format_detected: DetectedFormat,

    /// First few references per bucket, in first-mention order.
    pub valid_references: Vec<TicketId>,
    pub invalid_references: Vec<TicketId>,

    /// Error description when the pipeline failed. Observability only,
    /// never control flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationReport {
    /// Zeroed report for a record the pipeline could not evaluate.
    pub fn from_error(error: impl Into<String>) -> Self {
        EvaluationReport {
            truthfulness: Verdict::Untruthful,
            ground_truth_count: 0,
            output_reference_count: 0,
            valid_reference_count: 0,
            invalid_reference_count: 0,
            unreferenced_ticket_count: 0,
            accuracy_rate: 0.0,
            has_delimiters: false,
            format_detected: DetectedFormat::Error,
            valid_references: Vec::new(),
            invalid_references: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_truthful(&self) -> bool {
        self.truthfulness.is_truthful()
    }

    pub fn summary(&self) -> String {
        format!(
            "Truthfulness: {}, references: {} ({} valid, {} invalid), ground truth: {}, accuracy: {:.1}%",
            self.truthfulness.score(),
            self.output_reference_count,
            self.valid_reference_count,
            self.invalid_reference_count,
            self.ground_truth_count,
            self.accuracy_rate * 100.0
        )
    }
}

// ============================================================================
// SET RECONCILIATION
// ============================================================================

/// Elements of `a` not present in `b`, in `a`'s order.
fn difference(a: &[TicketId], b: &[TicketId]) -> Vec<TicketId> {
    let exclude: HashSet<&TicketId> = b.iter().collect();
    a.iter().filter(|t| !exclude.contains(t)).cloned().collect()
}

/// Elements of `a` also present in `b`, in `a`'s order.
fn intersection(a: &[TicketId], b: &[TicketId]) -> Vec<TicketId> {
    let keep: HashSet<&TicketId> = b.iter().collect();
    a.iter().filter(|t| keep.contains(t)).cloned().collect()
}

/// Score output references against the ground-truth ticket set.
///
/// - No references at all: truthful. Making no claims cannot be a false
///   claim.
/// - References but no ground truth to check them against: untruthful.
///   Unverifiable claims are conservatively treated as false.
/// - Otherwise: truthful iff every reference exists in the ground truth.
pub fn score_truthfulness(ground_truth: &[TicketId], output_references: &[TicketId]) -> Verdict {
    if output_references.is_empty() {
        return Verdict::Truthful;
    }

    if ground_truth.is_empty() {
        return Verdict::Untruthful;
    }

    let invalid = difference(output_references, ground_truth);
    if invalid.is_empty() {
        Verdict::Truthful
    } else {
        debug!(invalid_count = invalid.len(), "invalid references found");
        Verdict::Untruthful
    }
}

/// Detailed variant of [`score_truthfulness`] with full reconciliation
/// metrics. `has_delimiters` and `format_detected` are pipeline context
/// passed through for observability.
pub fn score_truthfulness_detailed(
    ground_truth: &[TicketId],
    output_references: &[TicketId],
    has_delimiters: bool,
    format_detected: DetectedFormat,
) -> EvaluationReport {
    let valid = intersection(output_references, ground_truth);
    let invalid = difference(output_references, ground_truth);
    let unreferenced = difference(ground_truth, output_references);

    let accuracy_rate = if output_references.is_empty() {
        0.0
    } else {
        valid.len() as f64 / output_references.len() as f64
    };

    EvaluationReport {
        truthfulness: score_truthfulness(ground_truth, output_references),
        ground_truth_count: ground_truth.len(),
        output_reference_count: output_references.len(),
        valid_reference_count: valid.len(),
        invalid_reference_count: invalid.len(),
        unreferenced_ticket_count: unreferenced.len(),
        accuracy_rate,
        has_delimiters,
        format_detected,
        valid_references: truncated(valid),
        invalid_references: truncated(invalid),
        error: None,
    }
}

fn truncated(mut tickets: Vec<TicketId>) -> Vec<TicketId> {
    tickets.truncate(REPORTED_REFERENCE_LIMIT);
    tickets
}

// ============================================================================
// TRUTHFULNESS ENGINE
// ============================================================================

/// TruthfulnessEngine - Full extraction and scoring pipeline
///
/// Holds the compiled ticket grammar; everything else is computed per
/// call. Safe to share across threads and calls.
pub struct TruthfulnessEngine {
    matcher: TicketMatcher,
}

impl Default for TruthfulnessEngine {
    fn default() -> Self {
        TruthfulnessEngine {
            matcher: TicketMatcher::new(),
        }
    }
}

impl TruthfulnessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a raw (input text, output text) pair.
    pub fn score_text(&self, input_text: &str, output_text: &str) -> Verdict {
        let (ground_truth, _) = self.ground_truth_from(input_text);
        let references = extract_output_references(output_text, &self.matcher);
        let verdict = score_truthfulness(&ground_truth, &references);

        debug!(score = verdict.score(), "verdict reached");
        verdict
    }

    /// Detailed variant of [`score_text`](Self::score_text).
    pub fn score_text_detailed(&self, input_text: &str, output_text: &str) -> EvaluationReport {
        let (ground_truth, bounded) = self.ground_truth_from(input_text);
        let references = extract_output_references(output_text, &self.matcher);

        let format = if bounded {
            DetectedFormat::Structured
        } else {
            DetectedFormat::Freeform
        };

        score_truthfulness_detailed(&ground_truth, &references, bounded, format)
    }

    /// Evaluate a dataset record: the example's `inputs` value and the
    /// run's `outputs` value, as produced upstream.
    ///
    /// Never panics and never returns an error; a record the pipeline
    /// cannot evaluate scores 0. This entry point runs inside automated
    /// batch jobs where an escaped failure would abort the whole batch.
    pub fn evaluate(&self, inputs: &Value, outputs: &Value) -> Verdict {
        match self.try_evaluate(inputs, outputs) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(%err, "evaluation failed, scoring untruthful");
                Verdict::Untruthful
            }
        }
    }

    /// Detailed variant of [`evaluate`](Self::evaluate). Failures come
    /// back as a zeroed report carrying the error description.
    pub fn evaluate_detailed(&self, inputs: &Value, outputs: &Value) -> EvaluationReport {
        match self.try_evaluate_detailed(inputs, outputs) {
            Ok(report) => report,
            Err(err) => {
                warn!(%err, "evaluation failed, scoring untruthful");
                EvaluationReport::from_error(err.to_string())
            }
        }
    }

    fn try_evaluate(&self, inputs: &Value, outputs: &Value) -> Result<Verdict> {
        let input_text = select_input_text(inputs)?;
        let output_text = select_output_text(outputs).unwrap_or_default();
        Ok(self.score_text(&input_text, &output_text))
    }

    fn try_evaluate_detailed(&self, inputs: &Value, outputs: &Value) -> Result<EvaluationReport> {
        let input_text = select_input_text(inputs)?;
        let output_text = select_output_text(outputs).unwrap_or_default();
        Ok(self.score_text_detailed(&input_text, &output_text))
    }

    fn ground_truth_from(&self, input_text: &str) -> (Vec<TicketId>, bool) {
        let section = extract_ticket_section(input_text);
        let ground_truth = match &section.region {
            Some(region) => extract_ground_truth_tickets(region, section.bounded, &self.matcher),
            None => Vec::new(),
        };
        (ground_truth, section.bounded)
    }
}

// ============================================================================
// TESTS
// ============================================================================
