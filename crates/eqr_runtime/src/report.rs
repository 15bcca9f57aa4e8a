use eqr_codec::Tag;
use eqr_vm::Evaluation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One generated attempt at an exercise. Superseded, never mutated, by the
/// next generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInstance {
    /// 1-based position within the generated batch.
    pub id: usize,
    pub original_expression: String,
    /// Template after label and variable substitution.
    pub processed_expression: String,
    pub question_text: Option<String>,
    /// What the learner has to compute.
    pub math_expression: String,
    pub tags: Vec<Tag>,
    /// Variable values the instance was generated with.
    pub variables: IndexMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub is_correct: bool,
    /// NaN when the expression could not be evaluated.
    pub correct_answer: f64,
    pub user_answer: f64,
    pub steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of running one expression through compile + execute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseReport {
    /// 1-based exercise index, 0 for ad-hoc expressions.
    pub id: usize,
    pub original_expression: String,
    pub substituted_expression: String,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disassembly: Option<String>,
    pub final_stack: Vec<f64>,
}

impl ExerciseReport {
    /// Report for an expression that did not compile.
    pub(crate) fn rejected(id: usize, original: &str, error: String) -> Self {
        Self {
            id,
            original_expression: original.to_string(),
            substituted_expression: original.to_string(),
            is_valid: false,
            evaluation: None,
            error: Some(error),
            steps: 0,
            disassembly: None,
            final_stack: Vec::new(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self.evaluation {
            Some(Evaluation::Expression { value }) => Some(value),
            _ => None,
        }
    }
}
