use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One entry of the benchmark input file: a model answer paired with the
/// question and reference answer it should be graded against.
///
/// `id` and the text fields are kept as raw JSON values because input files
/// mix string and integer ids, and answers are occasionally nested JSON
/// rather than plain strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationItem {
    #[serde(default)]
    pub id: Value,
    pub task_type: String,
    #[serde(default)]
    pub question: Value,
    #[serde(default)]
    pub reference_answer: Value,
    #[serde(default)]
    pub model_answer: Value,
}

/// Terminal state of a single item. Every item ends in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Success,
    Error,
    Skipped,
}

/// The judge's outcome for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub id: Value,
    pub task_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Value>,
    pub status: VerdictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JudgeVerdict {
    pub fn success(
        item: &EvaluationItem,
        score: Option<Value>,
        reasoning: Option<Value>,
    ) -> Self {
        Self {
            id: item.id.clone(),
            task_type: item.task_type.clone(),
            score,
            reasoning,
            status: VerdictStatus::Success,
            error: None,
        }
    }

    /// A failed judge call. The stored score is 0, but error verdicts are
    /// excluded from the average either way.
    pub fn error(item: &EvaluationItem, reason: String) -> Self {
        Self {
            id: item.id.clone(),
            task_type: item.task_type.clone(),
            score: Some(Value::from(0)),
            reasoning: Some(Value::String(format!("Evaluation Error: {}", reason))),
            status: VerdictStatus::Error,
            error: None,
        }
    }

    /// An item whose task type has no template; the judge is never called.
    pub fn skipped(item: &EvaluationItem) -> Self {
        Self {
            id: item.id.clone(),
            task_type: item.task_type.clone(),
            score: None,
            reasoning: None,
            status: VerdictStatus::Skipped,
            error: Some("Task type not found in prompt file".to_string()),
        }
    }

    /// The score as a float, only for verdicts that count towards the
    /// average: successful ones with a numeric score.
    pub fn countable_score(&self) -> Option<f64> {
        if self.status != VerdictStatus::Success {
            return None;
        }
        self.score.as_ref().and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub judge_model: String,
    pub total_items: usize,
    pub evaluated_items: usize,
    pub average_score: f64,
}

/// The persisted output: aggregate statistics plus one verdict per input
/// item, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub meta: ReportMeta,
    pub details: Vec<JudgeVerdict>,
}

impl EvaluationReport {
    pub fn new(judge_model: &str, details: Vec<JudgeVerdict>) -> Self {
        let scores: Vec<f64> =
            details.iter().filter_map(JudgeVerdict::countable_score).collect();
        let average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            meta: ReportMeta {
                judge_model: judge_model.to_string(),
                total_items: details.len(),
                evaluated_items: scores.len(),
                average_score: round4(average),
            },
            details,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            anyhow::anyhow!("Failed to serialize evaluation report: {}", e)
        })?;
        std::fs::write(path, json).map_err(|e| {
            anyhow::anyhow!(
                "Failed to write report to {}: {}",
                path.display(),
                e
            )
        })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read report from {}: {}",
                path.display(),
                e
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Load the input item array. Anything beyond the known fields is ignored;
/// a missing `task_type` is the one shape error that aborts the run.
pub fn load_items(path: &Path) -> Result<Vec<EvaluationItem>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read input file {}: {}",
            path.display(),
            e
        )
    })?;
    let items: Vec<EvaluationItem> =
        serde_json::from_str(&json).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse input file {}: {}",
                path.display(),
                e
            )
        })?;
    Ok(items)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
