//! Exercise session over one decoded payload.
//!
//! A session owns the IR, the current random variable values and one VM.
//! Every compile/execute goes through that VM, so a session must not be
//! shared across threads without external serialization.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::report::{ExerciseInstance, ExerciseReport, VerificationResult};
use crate::tags::{matches_any, matches_selection};
use crate::template::{split_question, substitute_labels, substitute_variables};
use eqr_codec::{Decoder, Exercise, IntermediateRepresentation, Solution, Tag};
use eqr_vm::{Bindings, Compiler, Evaluation, Program, Vm};
use indexmap::IndexMap;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub struct Session {
    ir: IntermediateRepresentation,
    cfg: SessionConfig,
    compiler: Compiler,
    vm: Vm,
    variables: IndexMap<String, i64>,
}

impl Session {
    /// Variables start empty; call `initialize_variables` before generating.
    pub fn new(ir: IntermediateRepresentation, cfg: SessionConfig) -> Self {
        Self {
            ir,
            vm: Vm::new(cfg.vm),
            cfg,
            compiler: Compiler::new(),
            variables: IndexMap::new(),
        }
    }

    pub fn from_payload(bytes: &[u8], cfg: SessionConfig) -> Result<Self> {
        let ir = Decoder::new(bytes, cfg.decoder).decode()?;
        Ok(Self::new(ir, cfg))
    }

    pub fn ir(&self) -> &IntermediateRepresentation {
        &self.ir
    }

    pub fn labels(&self) -> &IndexMap<Tag, String> {
        &self.ir.labels
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.ir.solutions
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn variables(&self) -> &IndexMap<String, i64> {
        &self.variables
    }

    /// Draws a fresh value for every generator, uniformly over `[min, max]`.
    pub fn initialize_variables<R: Rng>(&mut self, rng: &mut R) -> &IndexMap<String, i64> {
        self.variables.clear();
        for (name, range) in &self.ir.rand_generators {
            let (lo, hi) = if range.min <= range.max {
                (range.min, range.max)
            } else {
                warn!(%name, min = range.min, max = range.max, "inverted generator range");
                (range.max, range.min)
            };
            self.variables.insert(name.clone(), rng.gen_range(lo..=hi));
        }
        debug!(variables = ?self.variables, "variables initialized");
        &self.variables
    }

    fn bindings(&self) -> Bindings {
        self.variables
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64))
            .collect()
    }

    /// Compiles `expression` as given, without substitution.
    pub fn compile(&self, expression: &str) -> Result<Program> {
        Ok(self.compiler.compile(expression)?)
    }

    /// Runs every exercise of the payload with the current variables.
    pub fn execute_exercises(&mut self) -> Vec<ExerciseReport> {
        let templates: Vec<String> = self
            .ir
            .exercises
            .iter()
            .map(|e| e.expression.clone())
            .collect();
        templates
            .iter()
            .enumerate()
            .map(|(i, expr)| self.run_expression(i + 1, expr))
            .collect()
    }

    /// Runs an ad-hoc expression with the current variables.
    pub fn test_expression(&mut self, expression: &str) -> ExerciseReport {
        self.run_expression(0, expression)
    }

    fn run_expression(&mut self, id: usize, original: &str) -> ExerciseReport {
        let substituted = substitute_variables(original, &self.variables);
        let program = match self.compile(&substituted) {
            Ok(p) => p,
            Err(e) => {
                debug!(id, error = %e, "expression rejected");
                return ExerciseReport::rejected(id, original, e.to_string());
            }
        };
        let bindings = self.bindings();
        let run = self.vm.execute(&program, &bindings);
        ExerciseReport {
            id,
            original_expression: original.to_string(),
            substituted_expression: substituted,
            is_valid: run.is_success(),
            evaluation: run.result.as_ref().ok().copied(),
            error: run.error().map(ToString::to_string),
            steps: run.steps,
            disassembly: Some(program.disassemble()),
            final_stack: run.final_stack,
        }
    }

    /// Rerolls variables and instantiates the exercises matching `selected`.
    /// A selection of exactly `{PLUS}` matches exactly; anything else overlaps.
    pub fn exercises_by_tag<R: Rng>(
        &mut self,
        selected: &BTreeSet<Tag>,
        rng: &mut R,
    ) -> Vec<ExerciseInstance> {
        self.initialize_variables(rng);
        self.instantiate(|e| matches_selection(e, selected))
    }

    /// Like `exercises_by_tag`, but always with the any-overlap filter.
    pub fn generate_new_exercises<R: Rng>(
        &mut self,
        selected: &BTreeSet<Tag>,
        rng: &mut R,
    ) -> Vec<ExerciseInstance> {
        self.initialize_variables(rng);
        self.instantiate(|e| matches_any(e, selected))
    }

    /// One random exercise for a single tag, or `None` if nothing matches.
    pub fn generate_exercise<R: Rng>(
        &mut self,
        tag: Tag,
        rng: &mut R,
    ) -> Option<ExerciseInstance> {
        let mut found = self.exercises_by_tag(&BTreeSet::from([tag]), rng);
        if found.is_empty() {
            debug!(%tag, "no exercise for tag");
            return None;
        }
        let pick = rng.gen_range(0..found.len());
        Some(found.swap_remove(pick))
    }

    fn instantiate(&self, keep: impl Fn(&Exercise) -> bool) -> Vec<ExerciseInstance> {
        self.ir
            .exercises
            .iter()
            .filter(|e| keep(*e))
            .enumerate()
            .map(|(i, e)| self.instance(i + 1, e))
            .collect()
    }

    fn instance(&self, id: usize, exercise: &Exercise) -> ExerciseInstance {
        let labelled = substitute_labels(&exercise.expression, &self.ir.labels);
        let processed = substitute_variables(&labelled, &self.variables);
        let (question_text, math_expression) = split_question(&processed);
        ExerciseInstance {
            id,
            original_expression: exercise.expression.clone(),
            processed_expression: processed,
            question_text,
            math_expression,
            tags: exercise.tags.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Re-evaluates the instance's expression and compares within tolerance.
    /// Failures come back as an incorrect result carrying the reason.
    pub fn verify_answer(&mut self, user_answer: f64, instance: &ExerciseInstance) -> VerificationResult {
        let report = self.test_expression(&instance.math_expression);
        match report.evaluation {
            Some(Evaluation::Expression { value }) if report.is_valid => VerificationResult {
                is_correct: (user_answer - value).abs() < self.cfg.vm.tolerance,
                correct_answer: value,
                user_answer,
                steps: report.steps,
                debug_info: Some(format!("VM: {} = {}", instance.math_expression, value)),
                error: None,
            },
            _ => VerificationResult {
                is_correct: false,
                correct_answer: f64::NAN,
                user_answer,
                steps: report.steps,
                debug_info: None,
                error: Some(format!(
                    "VM calculation failed: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                )),
            },
        }
    }
}
