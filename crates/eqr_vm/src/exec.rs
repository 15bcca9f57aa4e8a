use crate::instruction::Instruction;
use crate::program::Program;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Variable values seeded into the VM at the start of a run.
pub type Bindings = IndexMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("stack underflow on {0}")]
    StackUnderflow(&'static str),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("execution steps exceeded limit of {0}")]
    RunawayExecution(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// A run fails once it has executed more than this many instructions.
    pub step_limit: u64,
    /// Absolute difference under which EQ treats two values as equal.
    pub tolerance: f64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            step_limit: 10_000,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    Equation { is_equal: bool },
    Expression { value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub result: Result<Evaluation, ExecError>,
    /// Instructions completed before halting or failing.
    pub steps: u64,
    pub final_stack: Vec<f64>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Numeric value of a plain-expression run.
    pub fn value(&self) -> Option<f64> {
        match self.result {
            Ok(Evaluation::Expression { value }) => Some(value),
            _ => None,
        }
    }

    /// Outcome of an equation run.
    pub fn is_equal(&self) -> Option<bool> {
        match self.result {
            Ok(Evaluation::Equation { is_equal }) => Some(is_equal),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ExecError> {
        self.result.as_ref().err()
    }
}

enum Flow {
    Next,
    Goto(usize),
    Halt,
}

/// Reusable stack machine. All state is reset by `execute`.
#[derive(Debug, Default)]
pub struct Vm {
    cfg: VmConfig,
    stack: Vec<f64>,
    variables: Bindings,
    pc: usize,
    steps: u64,
}

impl Vm {
    pub fn new(cfg: VmConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.cfg
    }

    pub fn execute(&mut self, program: &Program, bindings: &Bindings) -> ExecutionResult {
        self.stack.clear();
        self.variables.clone_from(bindings);
        self.pc = 0;
        self.steps = 0;

        let outcome = self.run(&program.instructions);
        let result = outcome.map(|()| {
            if program.meta.is_equation {
                Evaluation::Equation {
                    is_equal: self.stack.last().copied() == Some(1.0),
                }
            } else {
                Evaluation::Expression {
                    value: self.stack.last().copied().unwrap_or(0.0),
                }
            }
        });

        match &result {
            Ok(eval) => debug!(steps = self.steps, ?eval, "program finished"),
            Err(e) => debug!(steps = self.steps, error = %e, "program failed"),
        }
        ExecutionResult {
            result,
            steps: self.steps,
            final_stack: self.stack.clone(),
        }
    }

    fn run(&mut self, code: &[Instruction]) -> Result<(), ExecError> {
        while let Some(ins) = code.get(self.pc) {
            trace!(pc = self.pc, %ins, stack = ?self.stack, "step");
            let flow = self.step(ins)?;
            self.steps += 1;
            if self.steps > self.cfg.step_limit {
                return Err(ExecError::RunawayExecution(self.cfg.step_limit));
            }
            match flow {
                Flow::Next => self.pc += 1,
                Flow::Goto(target) => self.pc = target,
                Flow::Halt => break,
            }
        }
        Ok(())
    }

    fn pop(&mut self, ins: &Instruction) -> Result<f64, ExecError> {
        self.stack
            .pop()
            .ok_or(ExecError::StackUnderflow(ins.mnemonic()))
    }

    /// Pops `(a, b)` where `b` was on top.
    fn pop2(&mut self, ins: &Instruction) -> Result<(f64, f64), ExecError> {
        let b = self.pop(ins)?;
        let a = self.pop(ins)?;
        Ok((a, b))
    }

    fn truth(v: bool) -> f64 {
        if v {
            1.0
        } else {
            0.0
        }
    }

    fn step(&mut self, ins: &Instruction) -> Result<Flow, ExecError> {
        if self.stack.len() < ins.min_stack() {
            return Err(ExecError::StackUnderflow(ins.mnemonic()));
        }
        let tol = self.cfg.tolerance;
        match ins {
            Instruction::Push(v) => self.stack.push(*v),
            Instruction::Pop => {
                self.pop(ins)?;
            }
            Instruction::Dup => {
                let top = *self
                    .stack
                    .last()
                    .ok_or(ExecError::StackUnderflow(ins.mnemonic()))?;
                self.stack.push(top);
            }
            Instruction::Swap => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(b);
                self.stack.push(a);
            }

            Instruction::Add => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(a + b);
            }
            Instruction::Sub => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(a - b);
            }
            Instruction::Mul => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(a * b);
            }
            Instruction::Div => {
                let (a, b) = self.pop2(ins)?;
                if b == 0.0 {
                    return Err(ExecError::DivisionByZero);
                }
                self.stack.push(a / b);
            }
            Instruction::Pow => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(a.powf(b));
            }
            Instruction::Neg => {
                let a = self.pop(ins)?;
                self.stack.push(-a);
            }

            Instruction::Equal => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(Self::truth((a - b).abs() < tol));
            }
            Instruction::NotEqual => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(Self::truth((a - b).abs() >= tol));
            }
            Instruction::Greater => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(Self::truth(a > b));
            }
            Instruction::Less => {
                let (a, b) = self.pop2(ins)?;
                self.stack.push(Self::truth(a < b));
            }

            Instruction::LoadVar(name) => {
                let v = *self
                    .variables
                    .get(name)
                    .ok_or_else(|| ExecError::UndefinedVariable(name.clone()))?;
                self.stack.push(v);
            }
            Instruction::StoreVar(name) => {
                let v = self.pop(ins)?;
                self.variables.insert(name.clone(), v);
            }

            Instruction::Jump(target) => return Ok(Flow::Goto(*target)),
            Instruction::JumpIfFalse(target) => {
                if self.pop(ins)? == 0.0 {
                    return Ok(Flow::Goto(*target));
                }
            }
            Instruction::JumpIfTrue(target) => {
                if self.pop(ins)? != 0.0 {
                    return Ok(Flow::Goto(*target));
                }
            }

            Instruction::Halt => return Ok(Flow::Halt),
            Instruction::Nop => {}
        }
        Ok(Flow::Next)
    }
}
